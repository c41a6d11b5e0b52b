//! HTTP surfaces for Hearth.
//!
//! Two axum services share this crate: the tools service (catalog plus
//! execution) and the chat service (routing, feedback, interaction
//! listing). The CLI mounts them separately or merged behind one port.

pub mod handlers;
pub mod server;
pub mod state;

pub use server::{chat_router, combined_router, run, tools_router};
pub use state::{ChatState, ToolsState};
