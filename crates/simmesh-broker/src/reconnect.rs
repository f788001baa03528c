//! Bounded-attempt, fixed-delay reconnection, built on top of the shared
//! retry executor rather than a bespoke loop.
//!
//! The shared executor's default is exponential backoff with jitter; here
//! it is configured with `multiplier = 1.0` and `randomization_factor =
//! 0.0` so every retry waits the same fixed interval, matching the
//! collaborator's own reconnection semantics rather than the backoff this
//! primitive is usually reused for elsewhere in the fabric.

use std::time::Duration;

use simmesh_core::resilience::{RetryConfig, RetryExecutor};

use crate::client::BrokerClient;
use crate::config::BrokerConfig;
use crate::error::{BrokerError, Result};

/// Connects to the broker with a bounded number of attempts and a fixed
/// delay between them.
pub async fn connect_with_retry(config: &BrokerConfig, max_attempts: u32, delay: Duration) -> Result<BrokerClient> {
    let retry_config = RetryConfig::new(max_attempts.saturating_sub(1))
        .with_initial_interval(delay)
        .with_max_interval(delay)
        .with_multiplier(1.0)
        .with_randomization_factor(0.0)
        .with_max_elapsed_time(None);

    let executor = RetryExecutor::new(retry_config);
    executor
        .execute("broker_connect", || BrokerClient::connect(config))
        .await
        .map_err(|retry_err| BrokerError::ConnectionFailed { attempts: retry_err.attempts })
}
