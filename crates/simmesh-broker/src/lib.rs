//! AMQP broker access for the simulation fabric: a single-session client,
//! the fixed queue topology, a bounded connection pool, and a
//! fixed-delay reconnection helper.

#![deny(missing_docs)]

mod client;
mod config;
mod error;
mod pool;
mod reconnect;
pub mod topology;

pub use client::{BrokerClient, Delivery, DeliveryMode};
pub use config::BrokerConfig;
pub use error::{BrokerError, Result};
pub use pool::{BrokerPool, PooledClient, PoolStats};
pub use reconnect::connect_with_retry;
