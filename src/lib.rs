//! chat-scraper - accessibility-tree conversation reconstruction
//!
//! This crate rebuilds structured conversations (contact name, ordered
//! messages, direction) from live accessibility-tree snapshots of five chat
//! apps, each with its own heuristic parser profile, and maintains a
//! bounded, persisted cache of the latest conversation per contact.
//!
//! # Architecture
//!
//! The dispatcher filters and debounces platform UI-change events, routes
//! each one to the parser registered for the source app, and feeds
//! successful extractions into the `ConversationStore`. Consumers read the
//! store; nothing in the pipeline blocks on anything but local disk.

pub mod config;
pub mod dispatcher;
pub mod node;
pub mod parsers;
pub mod store;
pub mod tree;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use dispatcher::{DispatchOutcome, EventDispatcher, UiEvent, DEFAULT_DEBOUNCE};
pub use node::{NodeBounds, NodeError, UiNode};
pub use parsers::{AppParser, AppProfile, DirectionStrategy, ParseError, ParserRegistry};
pub use store::{
    ConversationStore, JsonFileBackend, ListenerId, SqliteBackend, StoreBackend, StoreError,
    StoreLimits, MAX_CONVERSATIONS,
};
pub use types::{
    conversation_key, ParsedConversation, ParsedMessage, Platform, UiEventType,
};
