//! The fixed tool catalog and its executor.
//!
//! Six tools cover time lookup, reachability probing, smart-home state
//! queries, light and switch control, and sun times. Arguments are typed
//! and validated before any tool body runs; every execution path funnels
//! into the shared success/error envelope.

pub mod args;
pub mod context;
pub mod definition;
pub mod device;
pub mod error;
pub mod ping;
pub mod registry;
pub mod resolver;
pub mod sun;
pub mod time;

pub use args::{
    ControlAction, ControlLightArgs, ControlSwitchArgs, DeviceStateArgs, NetworkTimeArgs,
    PingArgs, SunTimesArgs, ToolArgs,
};
pub use context::ToolContext;
pub use definition::{ToolDefinition, catalog, names};
pub use error::{Result, ToolError};
pub use registry::ToolRegistry;
pub use resolver::normalize_text;
