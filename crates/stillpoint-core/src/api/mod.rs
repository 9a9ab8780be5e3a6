mod client;
mod sync;
mod token;
pub mod types;

pub use client::{endpoints, ApiClient};
pub use sync::{OfflineSync, PracticeSync};
pub use token::{KeyringTokenStore, MemoryTokenStore, TokenStore};
