//! Account, receipt and block persistence for the sequencer.
//!
//! All state lives in in-memory maps and is written through to an opaque
//! ordered byte-KV engine; reads consult the maps first and fall back to the
//! engine. A fresh [`Store`] rehydrates its maps from the engine on startup.

mod engine;
mod error;
mod keys;
mod store;

pub use engine::{InMemoryEngine, KvEngine};
pub use error::StoreError;
pub use store::Store;
