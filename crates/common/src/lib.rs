//! `cutline-common` — Shared types, time math, configuration, and errors
//! for the Cutline timeline engine.
//!
//! This crate is the foundation that all other engine crates depend on.
//! It defines the core abstractions:
//!
//! - **Types**: `Rational`, `ItemKind`, `TransactionId` (newtypes for safety)
//! - **Time math**: pixel↔time conversion, FPS-grid quantisation, ruler
//!   formatting, the canvas clamp (`time` module)
//! - **Config**: `EngineConfig` (every tunable in one struct)
//! - **Errors**: `TimelineError` (thiserror-based)

pub mod config;
pub mod error;
pub mod time;
pub mod types;

// Re-export commonly used items at crate root
pub use config::EngineConfig;
pub use error::{TimelineError, TimelineResult};
pub use types::{ItemKind, Rational, TransactionId};
