// Library root — exposes internal modules for integration tests in `tests/`.
// Production entry point remains `src/main.rs`.

pub mod config;
pub mod error;
pub mod format;
pub mod notify;
pub mod runner;
pub mod scheduler;
pub mod services;
pub mod watermark;

// These modules are only needed by the binary.
pub mod cli;
pub mod logging;
