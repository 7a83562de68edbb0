//! Record storage backed by SQLite
//!
//! Appointments, payment attempts and the chat audit trail. Every
//! operation opens its own connection and is a single independent
//! statement; there is no pooling and no cross-statement transaction.

mod journal;
mod types;

pub use journal::{AppointmentJournal, JournalEntry};
pub use types::{AppointmentRecord, AppointmentStatus, ChatLogEntry, Direction, PaymentRecord};

use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::Result;

/// SQLite-backed store for appointments, payments and chat logs
#[derive(Debug, Clone)]
pub struct RecordStore {
    db_path: PathBuf,
}

impl RecordStore {
    /// Open (creating if necessary) the database at `db_path` and make
    /// sure all tables exist.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = Self { db_path };
        store.init_tables()?;
        info!("Record store initialized at {:?}", store.db_path);
        Ok(store)
    }

    fn open(&self) -> Result<Connection> {
        Ok(Connection::open(&self.db_path)?)
    }

    fn init_tables(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS appointments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                phone_number TEXT,
                service TEXT,
                date TEXT,
                time TEXT,
                status TEXT DEFAULT 'Pending',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS payments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                phone_number TEXT,
                service TEXT,
                amount REAL,
                status TEXT DEFAULT 'Pending',
                session_id TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS chat_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                phone_number TEXT,
                message TEXT,
                response TEXT,
                direction TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        Ok(())
    }

    /// Insert an appointment and return its row id
    pub fn save_appointment(
        &self,
        phone_number: &str,
        service: &str,
        date: &str,
        time: &str,
        status: AppointmentStatus,
    ) -> Result<i64> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO appointments (phone_number, service, date, time, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![phone_number, service, date, time, status.as_str()],
        )?;
        let id = conn.last_insert_rowid();
        debug!("Saved appointment {} for {}", id, phone_number);
        Ok(id)
    }

    /// List appointments, optionally filtered by phone number and status
    pub fn appointments(
        &self,
        phone_number: Option<&str>,
        status: Option<AppointmentStatus>,
    ) -> Result<Vec<AppointmentRecord>> {
        let conn = self.open()?;

        let mut query = String::from(
            "SELECT id, phone_number, service, date, time, status, created_at
             FROM appointments WHERE 1=1",
        );
        let mut args: Vec<String> = Vec::new();

        if let Some(phone) = phone_number {
            query.push_str(&format!(" AND phone_number = ?{}", args.len() + 1));
            args.push(phone.to_string());
        }
        if let Some(status) = status {
            query.push_str(&format!(" AND status = ?{}", args.len() + 1));
            args.push(status.as_str().to_string());
        }

        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), |row| {
            let status: String = row.get(5)?;
            Ok(AppointmentRecord {
                id: row.get(0)?,
                phone_number: row.get(1)?,
                service: row.get(2)?,
                date: row.get(3)?,
                time: row.get(4)?,
                status: AppointmentStatus::parse(&status)
                    .unwrap_or(AppointmentStatus::Pending),
                created_at: row.get(6)?,
            })
        })?;

        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Move an appointment out of `Pending`.
    ///
    /// The update is guarded so that rows already Confirmed or Cancelled
    /// stay put; returns whether a row changed.
    pub fn update_status(&self, id: i64, status: AppointmentStatus) -> Result<bool> {
        let conn = self.open()?;
        let changed = conn.execute(
            "UPDATE appointments SET status = ?1 WHERE id = ?2 AND status = 'Pending'",
            params![status.as_str(), id],
        )?;
        Ok(changed > 0)
    }

    /// Insert a payment attempt and return its row id
    pub fn save_payment(
        &self,
        phone_number: &str,
        service: &str,
        amount: f64,
        session_id: &str,
    ) -> Result<i64> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO payments (phone_number, service, amount, session_id)
             VALUES (?1, ?2, ?3, ?4)",
            params![phone_number, service, amount, session_id],
        )?;
        let id = conn.last_insert_rowid();
        debug!("Saved payment {} for {}", id, phone_number);
        Ok(id)
    }

    /// List payment attempts, optionally filtered by phone number
    pub fn payments(&self, phone_number: Option<&str>) -> Result<Vec<PaymentRecord>> {
        let conn = self.open()?;

        let mut query = String::from(
            "SELECT id, phone_number, service, amount, status, session_id, created_at
             FROM payments WHERE 1=1",
        );
        let mut args: Vec<String> = Vec::new();

        if let Some(phone) = phone_number {
            query.push_str(" AND phone_number = ?1");
            args.push(phone.to_string());
        }

        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), |row| {
            Ok(PaymentRecord {
                id: row.get(0)?,
                phone_number: row.get(1)?,
                service: row.get(2)?,
                amount: row.get(3)?,
                status: row.get(4)?,
                session_id: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?;

        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Append a chat interaction to the audit trail
    pub fn log_chat(
        &self,
        phone_number: &str,
        message: &str,
        response: &str,
        direction: Direction,
    ) -> Result<i64> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO chat_logs (phone_number, message, response, direction)
             VALUES (?1, ?2, ?3, ?4)",
            params![phone_number, message, response, direction.as_str()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent chat-log rows, newest first
    pub fn recent_chat_logs(&self, limit: usize) -> Result<Vec<ChatLogEntry>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT id, phone_number, message, response, direction, created_at
             FROM chat_logs ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(ChatLogEntry {
                id: row.get(0)?,
                phone_number: row.get(1)?,
                message: row.get(2)?,
                response: row.get(3)?,
                direction: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;

        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}
