//! Shared foundation for the Hearth services.
//!
//! This crate holds the configuration loader and the wire-level types
//! exchanged between the chat service, the tools service, and their
//! clients. It deliberately contains no I/O.

pub mod config;
pub mod protocol;

pub use config::{Config, EngineConfig, HubConfig, NetConfig, StorageConfig, SunConfig};
pub use protocol::{
    ChatRequest, ChatResponse, Feedback, FeedbackRequest, FeedbackResponse, Interaction,
    RoutingKind, ToolCallRequest, ToolCallResponse, ToolStatus, interaction_fingerprint,
};
