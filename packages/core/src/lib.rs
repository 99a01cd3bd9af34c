// Library root: exposes internal modules for integration tests in `tests/`.
// Production entry point remains `src/main.rs`.

pub mod api;
pub mod db;
pub mod error;
pub mod forecast;
pub mod metrics;
pub mod repository;

// These modules are only needed by the binary.
pub mod cli;
pub mod config;
pub mod logging;
