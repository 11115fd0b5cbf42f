//! Core abstractions for debugger event ingestion.
//!
//! This crate provides the fundamental building blocks:
//! - `Event` - Classified debugger record
//! - `Session` - One debugging run and its event log
//! - `DebugStore` - Trait implemented by store backends

pub mod event;
pub mod session;
pub mod traits;

pub use event::{Event, EventKind};
pub use session::{Session, SessionEvent};
pub use traits::{Ack, DebugStore, Health, LatestView, SessionList, StoreError};
