//! Resilience patterns for building fault-tolerant applications.
//!
//! - **Retry**: exponential backoff with jitter, retry budgets, adaptive retry
//! - **Circuit breaker**: fail-fast pattern with configurable thresholds
//!
//! # Example
//!
//! ```rust,ignore
//! use simmesh_core::resilience::{RetryExecutor, RetryConfig};
//!
//! let retry = RetryExecutor::new(RetryConfig::default());
//! let result = retry.execute("connect_broker", || async {
//!     Ok::<_, std::io::Error>("connected")
//! }).await;
//! ```

mod circuit_breaker;
mod retry;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerManager, CircuitBreakerStats,
    CircuitOpenError, CircuitState,
};
pub use retry::{AdaptiveRetry, RetryBudget, RetryConfig, RetryError, RetryExecutor, RetryPolicy};
