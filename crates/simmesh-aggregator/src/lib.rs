//! Aggregator: a background poller that drains telemetry and result
//! queues, maintains bounded rolling history, computes running
//! descriptive statistics, convergence traces and normality tests, and
//! exposes all of it for export and over HTTP.
//!
//! The aggregator core (this crate's [`state`], [`stats`], [`ring`] and
//! [`export`] modules) has no knowledge of HTTP or the broker wire
//! format beyond the message types it deserializes — [`poller`] and
//! [`http`] are the ambient wiring around it.

#![deny(missing_docs)]

mod config;
mod error;
pub mod export;
pub mod http;
pub mod poller;
mod ring;
pub mod state;
pub mod stats;

pub use config::AggregatorArgs;
pub use error::{AggregatorError, Result};
pub use ring::RingBuffer;
pub use state::{AggregatorState, Capacities, ModelSnapshot, Snapshot};
