//! hc-core: Healthcare Gateway Core Library
//!
//! Service catalog, conversation responder, record store and the
//! LLM client shared by every channel adapter.

pub mod catalog;
pub mod config;
pub mod error;
pub mod handler;
pub mod llm;
pub mod phone;
pub mod responder;
pub mod store;

pub use catalog::{SearchHit, ServiceCatalog, ServiceCategory, ServiceRecord};
pub use config::Config;
pub use error::{Error, Result};
pub use handler::{MessageHandler, Origin};
pub use llm::{ChatClient, SmartReply};
pub use responder::{BotReply, Phase, ReplyKind, Responder};
pub use store::{
    AppointmentJournal, AppointmentRecord, AppointmentStatus, ChatLogEntry, Direction,
    PaymentRecord, RecordStore,
};
