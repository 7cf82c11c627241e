// External I/O operations module
pub mod lock; // Low-level lock file operations
pub mod signals; // Unix signal handling
