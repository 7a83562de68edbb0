//! Conversation responder
//!
//! A per-sender state machine over free-text messages: greeting, catalog
//! search, package selection and time-slot booking. Session state lives in
//! a synchronized in-memory map keyed by sender id.

mod slots;
mod state;

pub use slots::{SLOT_COUNT, TimeSlot, generate_time_slots};
pub use state::{ConversationState, Phase};

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::catalog::{DEFAULT_SEARCH_THRESHOLD, SearchResults, ServiceCatalog, ServiceRecord};
use crate::store::{AppointmentJournal, AppointmentStatus, JournalEntry, RecordStore};
use crate::Result;

/// Greeting keywords that reset the conversation to the menu
const GREETING_KEYWORDS: [&str; 5] = ["hello", "hi", "hey", "start", "مرحبا"];

/// Keywords that start the booking flow
const BOOKING_KEYWORDS: [&str; 4] = ["book", "appointment", "schedule", "حجز"];

/// Packages offered in the booking menu
const BOOKING_MENU_LIMIT: usize = 8;

/// Packages shown in the full listing
const LISTING_LIMIT: usize = 10;

/// Hits shown per category in search results
const SEARCH_RESULT_LIMIT: usize = 3;

/// What kind of reply the responder produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Welcome,
    BookingMenu,
    PackageSelected,
    BookingConfirmed,
    PackageNotFound,
    InvalidSlot,
    SearchResults,
    /// The catalog-listing fallback: nothing matched the message
    Listing,
}

/// A reply plus its classification
#[derive(Debug, Clone)]
pub struct BotReply {
    pub text: String,
    pub kind: ReplyKind,
}

/// Per-sender scripted dialogue engine
pub struct Responder {
    catalog: Arc<ServiceCatalog>,
    store: Arc<RecordStore>,
    journal: Option<AppointmentJournal>,
    sessions: RwLock<HashMap<String, ConversationState>>,
}

impl Responder {
    pub fn new(
        catalog: Arc<ServiceCatalog>,
        store: Arc<RecordStore>,
        journal: Option<AppointmentJournal>,
    ) -> Self {
        Self {
            catalog,
            store,
            journal,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Process one message from `sender` and return the reply
    pub async fn respond(&self, sender: &str, text: &str) -> Result<BotReply> {
        self.respond_at(sender, text, Utc::now()).await
    }

    /// Like [`respond`](Self::respond) with an explicit clock, so slot
    /// generation is deterministic under test.
    pub async fn respond_at(
        &self,
        sender: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<BotReply> {
        let message = text.trim().to_lowercase();
        let current = self.snapshot(sender).await;

        let (reply, phase, selected) = self.transition(sender, &message, &current, now)?;

        let mut sessions = self.sessions.write().await;
        let state = sessions.entry(sender.to_string()).or_default();
        state.phase = phase;
        state.selected_package = selected;
        state.history.push((text.to_string(), reply.text.clone()));

        Ok(reply)
    }

    /// Current conversation state for a sender (defaults for new senders)
    pub async fn snapshot(&self, sender: &str) -> ConversationState {
        let sessions = self.sessions.read().await;
        sessions.get(sender).cloned().unwrap_or_default()
    }

    /// Number of active conversations
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Apply the transition table to one message.
    ///
    /// Returns the reply, the next phase and the carried package.
    fn transition(
        &self,
        sender: &str,
        message: &str,
        current: &ConversationState,
        now: DateTime<Utc>,
    ) -> Result<(BotReply, Phase, Option<String>)> {
        // 1. Greetings always restart the conversation
        if GREETING_KEYWORDS.iter().any(|kw| message.contains(kw)) {
            return Ok((
                BotReply {
                    text: welcome_message(),
                    kind: ReplyKind::Welcome,
                },
                Phase::Menu,
                None,
            ));
        }

        // 2. Booking keywords open the package menu
        if BOOKING_KEYWORDS.iter().any(|kw| message.contains(kw)) {
            return Ok((
                BotReply {
                    text: self.booking_menu(),
                    kind: ReplyKind::BookingMenu,
                },
                Phase::SelectingPackage,
                None,
            ));
        }

        // "menu" resets to the full listing from any phase
        if message.contains("menu") {
            return Ok((
                BotReply {
                    text: self.package_listing(),
                    kind: ReplyKind::Listing,
                },
                Phase::Menu,
                None,
            ));
        }

        match current.phase {
            Phase::SelectingPackage => Ok(self.handle_package_selection(message, now)),
            Phase::SelectingTime => {
                self.handle_time_selection(sender, message, current, now)
            }
            _ => Ok(self.handle_free_text(message)),
        }
    }

    /// A message while a package menu is open: a number in range or a
    /// fuzzy package-name match advances to slot selection.
    fn handle_package_selection(
        &self,
        message: &str,
        now: DateTime<Utc>,
    ) -> (BotReply, Phase, Option<String>) {
        let menu = self.menu_packages();

        if let Ok(n) = message.parse::<usize>() {
            if n >= 1 && n <= menu.len() {
                return self.select_package(menu[n - 1], now);
            }
        }

        let results = self
            .catalog
            .search(message, DEFAULT_SEARCH_THRESHOLD);
        if let Some(hit) = results.packages.first() {
            // Clone out of the hit so the borrow on the catalog ends here
            let record = hit.record.clone();
            return self.select_package(&record, now);
        }

        (
            BotReply {
                text: "Sorry, I couldn't find that package. Please try again or type 'menu' \
                       to see all options."
                    .to_string(),
                kind: ReplyKind::PackageNotFound,
            },
            Phase::SelectingPackage,
            None,
        )
    }

    fn select_package(
        &self,
        record: &ServiceRecord,
        now: DateTime<Utc>,
    ) -> (BotReply, Phase, Option<String>) {
        let slots = generate_time_slots(now);

        let mut text = format!(
            "**Package Selected:** {}\n**Price:** AED {}\n\n**Available Time Slots:**\n\n",
            record.name, record.price
        );
        for (i, slot) in slots.iter().enumerate() {
            text.push_str(&format!("{}. {}\n", i + 1, slot.label()));
        }
        text.push_str("\n*Reply with the time slot number to confirm your appointment.*");

        (
            BotReply {
                text,
                kind: ReplyKind::PackageSelected,
            },
            Phase::SelectingTime,
            Some(record.name.clone()),
        )
    }

    /// A message while slots are on offer: a number in range books the
    /// appointment, anything else re-prompts.
    fn handle_time_selection(
        &self,
        sender: &str,
        message: &str,
        current: &ConversationState,
        now: DateTime<Utc>,
    ) -> Result<(BotReply, Phase, Option<String>)> {
        let Some(package) = current.selected_package.as_deref() else {
            // No carried package; reopen the menu
            return Ok((
                BotReply {
                    text: self.booking_menu(),
                    kind: ReplyKind::BookingMenu,
                },
                Phase::SelectingPackage,
                None,
            ));
        };

        let slots = generate_time_slots(now);

        if let Ok(n) = message.parse::<usize>() {
            if n >= 1 && n <= slots.len() {
                let slot = &slots[n - 1];
                let id = self.store.save_appointment(
                    sender,
                    package,
                    &slot.date.to_string(),
                    slot.time_label,
                    AppointmentStatus::Confirmed,
                )?;

                if let Some(journal) = &self.journal {
                    let entry = JournalEntry {
                        phone_number: sender.to_string(),
                        package_name: package.to_string(),
                        time_slot: slot.label(),
                        booking_time: now.to_rfc3339(),
                        status: "confirmed".to_string(),
                    };
                    if let Err(e) = journal.append(entry) {
                        warn!("Failed to append appointment journal: {}", e);
                    }
                }

                info!("Appointment {} booked for {}", id, sender);

                let text = format!(
                    "**Appointment Confirmed!**\n\n\
                     **Phone:** {}\n\
                     **Package:** {}\n\
                     **Time:** {}\n\
                     **Booking ID:** {}\n\n\
                     Your appointment has been successfully booked!\n\
                     We'll contact you shortly to confirm the details.\n\n\
                     *Type 'menu' for more options or 'book' for another appointment.*",
                    sender,
                    package,
                    slot.label(),
                    id
                );

                return Ok((
                    BotReply {
                        text,
                        kind: ReplyKind::BookingConfirmed,
                    },
                    Phase::Menu,
                    None,
                ));
            }
        }

        Ok((
            BotReply {
                text: "Invalid time slot. Please select a number from the available options."
                    .to_string(),
                kind: ReplyKind::InvalidSlot,
            },
            Phase::SelectingTime,
            current.selected_package.clone(),
        ))
    }

    /// Anything else: search the catalog, fall back to the full listing
    fn handle_free_text(&self, message: &str) -> (BotReply, Phase, Option<String>) {
        let results = self.catalog.search(message, DEFAULT_SEARCH_THRESHOLD);

        if !results.is_empty() {
            return (
                BotReply {
                    text: format_search_results(message, &results),
                    kind: ReplyKind::SearchResults,
                },
                Phase::SearchResults,
                None,
            );
        }

        (
            BotReply {
                text: self.package_listing(),
                kind: ReplyKind::Listing,
            },
            Phase::Menu,
            None,
        )
    }

    fn menu_packages(&self) -> Vec<&ServiceRecord> {
        self.catalog
            .packages()
            .iter()
            .take(BOOKING_MENU_LIMIT)
            .collect()
    }

    fn booking_menu(&self) -> String {
        let mut text = String::from(
            "**Book Your Appointment**\n\nPlease select a package from our available options:\n\n",
        );

        for (i, package) in self.menu_packages().iter().enumerate() {
            text.push_str(&format!(
                "{}. **{}** - AED {}\n",
                i + 1,
                package.name,
                package.price
            ));
        }

        text.push_str("\n*Reply with the package number or name you want to book.*");
        text
    }

    fn package_listing(&self) -> String {
        let packages = self.catalog.packages();
        if packages.is_empty() {
            return "No packages available at the moment.".to_string();
        }

        let mut text = String::from("**Available Health Packages:**\n\n");
        for package in packages.iter().take(LISTING_LIMIT) {
            text.push_str(&format!("**{}**\n", package.name));
            text.push_str(&format!("Price: AED {}\n", package.price));
            if let Some(turnaround) = &package.turnaround {
                text.push_str(&format!("Duration: {}\n", turnaround));
            }
            text.push('\n');
        }

        text.push_str(
            "\n💬 *Send me a specific test name or package you're interested in for more \
             details!*",
        );
        text
    }
}

fn welcome_message() -> String {
    "**Welcome to Our Healthcare Center!**\n\
     I'm here to help you with:\n\
     • Medical tests and health packages\n\
     • Appointment booking\n\
     • Pricing information\n\n\
     You can:\n\
     1. Ask about specific tests (e.g., \"blood test\", \"vitamin D\")\n\
     2. Request health packages\n\
     3. Book an appointment\n\
     4. Get pricing information\n\n\
     How can I assist you today?"
        .to_string()
}

fn format_search_results(query: &str, results: &SearchResults) -> String {
    let mut text = format!("🔍 **Search Results for '{}':**\n\n", query);

    if !results.packages.is_empty() {
        text.push_str("**Health Packages:**\n");
        for hit in results.packages.iter().take(SEARCH_RESULT_LIMIT) {
            text.push_str(&format!("• **{}** - AED {}\n", hit.record.name, hit.record.price));
            if let Some(turnaround) = &hit.record.turnaround {
                text.push_str(&format!("Duration: {}\n", turnaround));
            }
        }
        text.push('\n');
    }

    if !results.tests.is_empty() {
        text.push_str("**Individual Tests:**\n");
        for hit in results.tests.iter().take(SEARCH_RESULT_LIMIT) {
            text.push_str(&format!("• **{}** - AED {}\n", hit.record.name, hit.record.price));
        }
        text.push('\n');
    }

    if !results.iv_therapies.is_empty() {
        text.push_str("**IV Therapy:**\n");
        for hit in results.iv_therapies.iter().take(SEARCH_RESULT_LIMIT) {
            text.push_str(&format!("• **{}** - AED {}\n", hit.record.name, hit.record.price));
        }
        text.push('\n');
    }

    text.push_str("*Type 'book' to schedule an appointment or ask for more specific information!*");
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn test_catalog() -> Arc<ServiceCatalog> {
        Arc::new(
            ServiceCatalog::from_json(
                r#"{
                    "individual_tests": [
                        {"name": "Complete Blood Count", "price": 120.0},
                        {"name": "Vitamin D Test", "price": 250.0}
                    ],
                    "wellness_packages": [
                        {"name": "Basic Health Check Up", "price": 399.0, "turnaround": "24 hours"},
                        {"name": "Executive Wellness Package", "price": 1500.0},
                        {"name": "Women's Health Package", "price": 899.0}
                    ],
                    "iv_therapies": [
                        {"name": "Vitamin C Drip", "price": 650.0}
                    ]
                }"#,
            )
            .unwrap(),
        )
    }

    fn test_responder() -> (tempfile::TempDir, Responder) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(RecordStore::new(dir.path().join("test.db")).unwrap());
        let journal = AppointmentJournal::new(dir.path().join("appointments.json"));
        let responder = Responder::new(test_catalog(), store, Some(journal));
        (dir, responder)
    }

    #[tokio::test]
    async fn test_greeting_resets_to_menu() {
        let (_dir, responder) = test_responder();

        let reply = responder.respond("+971501234567", "hello").await.unwrap();
        assert_eq!(reply.kind, ReplyKind::Welcome);
        assert!(reply.text.contains("Welcome to Our Healthcare Center!"));
        assert_eq!(responder.snapshot("+971501234567").await.phase, Phase::Menu);
    }

    #[tokio::test]
    async fn test_booking_keyword_opens_package_menu() {
        let (_dir, responder) = test_responder();

        let reply = responder.respond("+971501234567", "book").await.unwrap();
        assert_eq!(reply.kind, ReplyKind::BookingMenu);
        assert!(reply.text.contains("1. **Basic Health Check Up** - AED 399"));
        assert!(reply.text.contains("3. **Women's Health Package**"));
        assert_eq!(
            responder.snapshot("+971501234567").await.phase,
            Phase::SelectingPackage
        );
    }

    #[tokio::test]
    async fn test_numeric_package_selection_offers_slots() {
        let (_dir, responder) = test_responder();
        let sender = "+971501234567";

        responder.respond_at(sender, "book", fixed_now()).await.unwrap();
        let reply = responder.respond_at(sender, "1", fixed_now()).await.unwrap();

        assert_eq!(reply.kind, ReplyKind::PackageSelected);
        assert!(reply.text.contains("**Package Selected:** Basic Health Check Up"));
        assert!(reply.text.contains("1. Sunday (2025-03-02) - 9:00 AM"));

        let state = responder.snapshot(sender).await;
        assert_eq!(state.phase, Phase::SelectingTime);
        assert_eq!(state.selected_package.as_deref(), Some("Basic Health Check Up"));
    }

    #[tokio::test]
    async fn test_package_selection_by_fuzzy_name() {
        let (_dir, responder) = test_responder();
        let sender = "+971501234567";

        responder.respond_at(sender, "book", fixed_now()).await.unwrap();
        let reply = responder
            .respond_at(sender, "executive wellness", fixed_now())
            .await
            .unwrap();

        assert_eq!(reply.kind, ReplyKind::PackageSelected);
        let state = responder.snapshot(sender).await;
        assert_eq!(
            state.selected_package.as_deref(),
            Some("Executive Wellness Package")
        );
    }

    #[tokio::test]
    async fn test_unknown_package_keeps_selecting() {
        let (_dir, responder) = test_responder();
        let sender = "+971501234567";

        responder.respond_at(sender, "book", fixed_now()).await.unwrap();
        let reply = responder
            .respond_at(sender, "qqqqzzzz", fixed_now())
            .await
            .unwrap();

        assert_eq!(reply.kind, ReplyKind::PackageNotFound);
        assert_eq!(
            responder.snapshot(sender).await.phase,
            Phase::SelectingPackage
        );
    }

    #[tokio::test]
    async fn test_slot_selection_books_confirmed_appointment() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(RecordStore::new(dir.path().join("test.db")).unwrap());
        let journal = AppointmentJournal::new(dir.path().join("appointments.json"));
        let responder =
            Responder::new(test_catalog(), Arc::clone(&store), Some(journal.clone()));
        let sender = "+971501234567";

        responder.respond_at(sender, "book", fixed_now()).await.unwrap();
        responder.respond_at(sender, "1", fixed_now()).await.unwrap();
        let reply = responder.respond_at(sender, "2", fixed_now()).await.unwrap();

        assert_eq!(reply.kind, ReplyKind::BookingConfirmed);
        assert!(reply.text.contains("**Appointment Confirmed!**"));
        assert_eq!(responder.snapshot(sender).await.phase, Phase::Menu);

        // The second generated slot was stored, already confirmed
        let booked = store
            .appointments(Some(sender), Some(AppointmentStatus::Confirmed))
            .unwrap();
        assert_eq!(booked.len(), 1);
        assert_eq!(booked[0].service, "Basic Health Check Up");
        assert_eq!(booked[0].date, "2025-03-02");
        assert_eq!(booked[0].time, "11:00 AM");

        // And the journal picked it up too
        let entries = journal.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].time_slot, "Sunday (2025-03-02) - 11:00 AM");
    }

    #[tokio::test]
    async fn test_invalid_slot_keeps_selecting_time() {
        let (_dir, responder) = test_responder();
        let sender = "+971501234567";

        responder.respond_at(sender, "book", fixed_now()).await.unwrap();
        responder.respond_at(sender, "1", fixed_now()).await.unwrap();
        let reply = responder.respond_at(sender, "9", fixed_now()).await.unwrap();

        assert_eq!(reply.kind, ReplyKind::InvalidSlot);
        let state = responder.snapshot(sender).await;
        assert_eq!(state.phase, Phase::SelectingTime);
        assert_eq!(state.selected_package.as_deref(), Some("Basic Health Check Up"));
    }

    #[tokio::test]
    async fn test_menu_resets_from_any_phase() {
        let (_dir, responder) = test_responder();
        let sender = "+971501234567";

        for setup in [vec!["book"], vec!["book", "1"], vec!["vitamin"]] {
            for msg in setup {
                responder.respond_at(sender, msg, fixed_now()).await.unwrap();
            }
            responder.respond_at(sender, "menu", fixed_now()).await.unwrap();
            assert_eq!(responder.snapshot(sender).await.phase, Phase::Menu);
        }
    }

    #[tokio::test]
    async fn test_free_text_search_hits() {
        let (_dir, responder) = test_responder();

        let reply = responder.respond("+971501234567", "vitamin").await.unwrap();
        assert_eq!(reply.kind, ReplyKind::SearchResults);
        assert!(reply.text.contains("Vitamin D Test"));
        assert!(reply.text.contains("Vitamin C Drip"));
        assert_eq!(
            responder.snapshot("+971501234567").await.phase,
            Phase::SearchResults
        );
    }

    #[tokio::test]
    async fn test_free_text_without_hits_lists_packages() {
        let (_dir, responder) = test_responder();

        let reply = responder.respond("+971501234567", "qqqqzzzz").await.unwrap();
        assert_eq!(reply.kind, ReplyKind::Listing);
        assert!(reply.text.contains("Available Health Packages"));
        assert_eq!(responder.snapshot("+971501234567").await.phase, Phase::Menu);
    }

    #[tokio::test]
    async fn test_history_accumulates() {
        let (_dir, responder) = test_responder();
        let sender = "+971501234567";

        responder.respond(sender, "hello").await.unwrap();
        responder.respond(sender, "book").await.unwrap();

        let state = responder.snapshot(sender).await;
        assert_eq!(state.history.len(), 2);
        assert_eq!(state.history[0].0, "hello");
        assert!(state.history[1].1.contains("Book Your Appointment"));
    }

    #[tokio::test]
    async fn test_senders_are_independent() {
        let (_dir, responder) = test_responder();

        responder.respond("+971501111111", "book").await.unwrap();
        responder.respond("+971502222222", "hello").await.unwrap();

        assert_eq!(
            responder.snapshot("+971501111111").await.phase,
            Phase::SelectingPackage
        );
        assert_eq!(responder.snapshot("+971502222222").await.phase, Phase::Menu);
        assert_eq!(responder.session_count().await, 2);
    }
}
