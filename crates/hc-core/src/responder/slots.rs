//! Appointment time-slot generation
//!
//! Slots are a pure function of the supplied clock: four slots drawn from
//! the next three calendar days at fixed times. Nothing is persisted or
//! locked, so two senders picking the same slot number at different real
//! times may be offered different slots.

use chrono::{DateTime, Duration, NaiveDate, Utc};

/// Fixed times offered each day
const SLOT_TIMES: [&str; 4] = ["9:00 AM", "11:00 AM", "2:00 PM", "4:00 PM"];

/// Number of slots offered per booking
pub const SLOT_COUNT: usize = 4;

/// One offered appointment slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlot {
    pub date: NaiveDate,
    pub time_label: &'static str,
}

impl TimeSlot {
    /// Label shown to the user, e.g. `Monday (2025-03-03) - 9:00 AM`
    pub fn label(&self) -> String {
        format!(
            "{} ({}) - {}",
            self.date.format("%A"),
            self.date.format("%Y-%m-%d"),
            self.time_label
        )
    }
}

/// Generate the offered slots for a booking started at `now`.
///
/// Candidate slots cover the next three days (today excluded) at the
/// fixed times; only the first four are ever offered, weekends included.
pub fn generate_time_slots(now: DateTime<Utc>) -> Vec<TimeSlot> {
    let mut slots = Vec::new();

    for day in 1..=3 {
        let date = (now + Duration::days(day)).date_naive();
        for time_label in SLOT_TIMES {
            slots.push(TimeSlot { date, time_label });
        }
    }

    slots.truncate(SLOT_COUNT);
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        // A Saturday, so the first offered day is a Sunday
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_exactly_four_slots() {
        assert_eq!(generate_time_slots(fixed_now()).len(), SLOT_COUNT);
    }

    #[test]
    fn test_all_slots_fall_on_the_next_day() {
        let slots = generate_time_slots(fixed_now());
        let tomorrow = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        for slot in &slots {
            assert_eq!(slot.date, tomorrow);
        }
        assert_eq!(
            slots.iter().map(|s| s.time_label).collect::<Vec<_>>(),
            ["9:00 AM", "11:00 AM", "2:00 PM", "4:00 PM"]
        );
    }

    #[test]
    fn test_weekends_are_not_excluded() {
        let slots = generate_time_slots(fixed_now());
        // 2025-03-02 is a Sunday and is still offered
        assert!(slots[0].label().starts_with("Sunday (2025-03-02)"));
    }

    #[test]
    fn test_label_format() {
        let slot = TimeSlot {
            date: NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            time_label: "9:00 AM",
        };
        assert_eq!(slot.label(), "Monday (2025-03-03) - 9:00 AM");
    }

    #[test]
    fn test_deterministic_for_a_given_now() {
        assert_eq!(generate_time_slots(fixed_now()), generate_time_slots(fixed_now()));
    }
}
