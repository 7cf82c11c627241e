//! # Timeslot Library
//!
//! Internal library for the timeslot binary application
//!
//! This library exists to enable testing of complex internals and provide clean separation
//! between CLI dispatch (main.rs) and daemon logic.
//!
//! ## Architecture
//!
//! The library is organized into several layers:
//!
//! - **Entry Point**: `Daemon` struct provides the main application API with resource management
//! - **Core Logic**: Internal `Core` module contains the main loop and tick handling
//! - **Slots**: `slot` module with the `Timeslot` entity and the `Registry` that owns them
//! - **Configuration**: `config` module for TOML-based settings with hot-reload
//! - **State Management**: `state` module for the published snapshot file and restore merge
//! - **Commands**: `commands` module for CLI subcommands (status, reload, on/off/toggle, set)
//! - **Infrastructure**: Signal handling, lock file management, logging, and simulated time

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

// Public API modules
pub mod args;
pub mod commands;
pub mod config;
pub mod constants;
pub mod io;
pub mod slot;
pub mod state;
pub mod time;

// Internal modules
mod core;
mod daemon;

// Re-export for binary
pub use daemon::Daemon;
