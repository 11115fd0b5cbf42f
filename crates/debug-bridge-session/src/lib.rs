//! Session bookkeeping and storage for debugger events.
//!
//! Provides:
//! - `StoreState` - Session lifecycle state machine and read projections
//! - Storage implementations (memory)

pub mod state;
pub mod storage;

pub use state::{StoreState, Transition};

#[cfg(feature = "memory")]
pub use storage::MemoryStore;
