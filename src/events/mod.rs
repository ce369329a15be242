//! Change notification for graph mutations
//!
//! This module provides:
//! - `GraphEvent` — typed events emitted after every node/edge mutation
//! - `EventEmitter` — the sink trait injected into `GraphStore`
//! - `EventBus` — broadcast channel implementation of the sink

mod bus;
mod types;

pub use bus::EventBus;
pub use types::{ChangeAction, EventEmitter, GraphEntity, GraphEvent};
