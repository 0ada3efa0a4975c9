//! exportmeter-store — storage backend integrations.
//!
//! Implements the `QuestionSource` and `ScoreStore` traits for a
//! Supabase-style REST backend, a local file-backed store, and an in-memory
//! test double.

pub mod config;
pub mod local;
pub mod memory;
pub mod rest;

pub use config::{create_backend, load_config, BackendConfig, ExportmeterConfig};
pub use local::LocalStore;
pub use memory::MemoryStore;
pub use rest::RestStore;
