//! API Module
//!
//! Entry points for whatever sits in front of the pipeline (HTTP handlers,
//! the CLI). `commands` converts pipeline results into the wire contracts.

pub mod commands;

pub use commands::*;
