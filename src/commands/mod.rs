//! Command-line command handlers.
//!
//! This module contains implementations for the one-shot CLI commands that
//! talk to (or inspect the state of) a running daemon. Each command lives in
//! its own submodule to keep the code organized and maintainable.

pub mod help;
pub mod reload;
pub mod simulate;
pub mod slot;
pub mod status;
