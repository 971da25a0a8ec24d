//! Boundaries to external collaborators
//!
//! Persistence and the chat platform are consumed through async traits so the
//! lifecycle manager can be driven by real clients, in-memory stand-ins or mocks.

pub mod chat;
pub mod persistence;

pub use chat::{ChatGateway, LoggingChatGateway};
pub use persistence::{InMemoryPersistence, PersistenceGateway};
