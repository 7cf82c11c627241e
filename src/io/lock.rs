//! Lock file management for single-instance enforcement.
//!
//! Only one daemon may run per runtime directory. The lock file records the
//! holder's PID plus its config directory so the CLI commands can find the
//! daemon to signal, and so stale locks from crashed processes get cleaned up.

use std::fs::File;
use std::io::{Seek, SeekFrom, Write};

use anyhow::{Context, Result};
use fs2::FileExt;

use crate::config;
use crate::constants::EXIT_FAILURE;

/// Path of the lock file in the runtime directory.
pub fn lock_file_path() -> String {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    format!("{runtime_dir}/timeslot.lock")
}

/// Check if a process with the given PID is currently running.
pub fn is_process_running(pid: u32) -> bool {
    std::path::Path::new(&format!("/proc/{pid}")).exists()
}

/// Acquire an exclusive lock on the lock file.
///
/// The lock file contains:
/// - Process ID (PID)
/// - Config directory (empty line if using the default)
///
/// # Returns
/// - `Ok((lock_file, lock_path))` if the lock was successfully acquired
/// - Never returns if another instance is running (calls std::process::exit)
pub fn acquire_lock() -> Result<(File, String)> {
    let lock_path = lock_file_path();

    // Open lock file without truncating to preserve existing content
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)?;

    match lock_file.try_lock_exclusive() {
        Ok(()) => {
            write_lock_info(&lock_file)?;
            Ok((lock_file, lock_path))
        }
        Err(_) => {
            // Lock file exists and is locked. Check if it's a stale holder;
            // handle_lock_conflict either returns Ok(()) or exits the process.
            handle_lock_conflict(&lock_path)?;

            // Conflict was resolved (stale lock), retry
            let retry_lock_file = std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(false)
                .open(&lock_path)?;

            match retry_lock_file.try_lock_exclusive() {
                Ok(()) => {
                    write_lock_info(&retry_lock_file)?;
                    Ok((retry_lock_file, lock_path))
                }
                Err(e) => {
                    log_error_exit!("Failed to acquire lock after cleanup attempt: {}", e);
                    std::process::exit(EXIT_FAILURE);
                }
            }
        }
    }
}

fn write_lock_info(mut lock_file: &File) -> Result<()> {
    lock_file.set_len(0)?;
    lock_file.seek(SeekFrom::Start(0))?;

    writeln!(lock_file, "{}", std::process::id())?;
    // Config directory (empty line if using default)
    if let Some(ref dir) = config::get_custom_config_dir() {
        writeln!(lock_file, "{}", dir.display())?;
    } else {
        writeln!(lock_file)?;
    }
    lock_file.flush()?;
    Ok(())
}

/// Handle lock file conflicts.
///
/// Stale lock files (holder no longer running, or unparseable content) are
/// removed. A live holder means another instance is really running; that case
/// prints guidance and exits.
fn handle_lock_conflict(lock_path: &str) -> Result<()> {
    let lock_content = match std::fs::read_to_string(lock_path) {
        Ok(content) => content,
        Err(_) => {
            // Lock file doesn't exist or can't be read, assume it was cleaned up
            return Ok(());
        }
    };

    let pid = match lock_content.lines().next().and_then(|l| l.trim().parse::<u32>().ok()) {
        Some(pid) => pid,
        None => {
            log_warning!("Lock file contains invalid PID, removing stale lock");
            let _ = std::fs::remove_file(lock_path);
            return Ok(());
        }
    };

    if !is_process_running(pid) {
        log_warning!("Removing stale lock file (process {pid} no longer running)");
        let _ = std::fs::remove_file(lock_path);
        return Ok(());
    }

    log_pipe!();
    log_error!("timeslot is already running (PID: {pid})");
    log_block_start!("Did you mean to:");
    log_indented!("• Reload configuration: timeslot reload");
    log_indented!("• Inspect published state: timeslot status");
    log_indented!("• Switch a slot: timeslot toggle <id>");
    log_block_start!("Cannot start - another timeslot instance is running");
    log_end!();
    std::process::exit(EXIT_FAILURE)
}

/// PID of the running daemon, read from the lock file.
///
/// Used by the CLI commands that need a daemon to signal.
pub fn get_running_pid() -> Result<u32> {
    let lock_path = lock_file_path();
    let content = std::fs::read_to_string(&lock_path)
        .context("No running timeslot instance found (no lock file)")?;

    let pid: u32 = content
        .lines()
        .next()
        .and_then(|l| l.trim().parse().ok())
        .context("Lock file exists but contains no valid PID")?;

    if !is_process_running(pid) {
        anyhow::bail!("Lock file found but process {} is not running", pid);
    }

    Ok(pid)
}
