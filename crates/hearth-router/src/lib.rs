//! Message routing for Hearth.
//!
//! [`RequestRouter`] decides how each chat message is answered: keyword
//! shortcuts call tools directly, otherwise the text engine is consulted
//! and any `USE_TOOL` directive it emits is executed and synthesized into
//! a final answer. Tool calls go through the [`ToolInvoker`] seam so the
//! same router runs against an in-process registry or a remote tools
//! service.

pub mod directive;
pub mod invoker;
pub mod prompts;
pub mod router;
pub mod shortcuts;
pub mod synthesis;

pub use directive::{DIRECTIVE_MARKER, ToolDirective, parse_directive};
pub use invoker::{HttpInvoker, InProcessInvoker, ToolInvoker};
pub use router::{RequestRouter, TIMEOUT_RESPONSE};
pub use shortcuts::ShortcutPlan;
