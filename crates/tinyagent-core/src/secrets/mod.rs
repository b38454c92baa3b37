//! Secret storage for model API keys
//!
//! - `SecretStore` trait for lookups by provider name or variable name
//! - `EnvSecretStore`: read-only, environment variables
//! - `MemorySecretStore`: read-write, in-process (tests, `--api-key`)

mod traits;
mod env_store;
mod memory_store;

pub use traits::{SecretStore, SecretStoreError, SecretStoreResult};
pub use env_store::EnvSecretStore;
pub use memory_store::MemorySecretStore;
