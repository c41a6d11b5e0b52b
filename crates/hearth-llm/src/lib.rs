//! Text-generation backends.
//!
//! One trait, [`TextEngine`], and the Ollama implementation of it. The
//! router decides when generation is needed; this crate only knows how to
//! ask a model for text.

pub mod engine;
pub mod error;
pub mod ollama;

pub use engine::TextEngine;
pub use error::{EngineError, EngineResult};
pub use ollama::{OllamaConfig, OllamaEngine};
