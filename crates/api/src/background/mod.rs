//! Long-running tasks spawned at startup. Each takes a
//! [`CancellationToken`](tokio_util::sync::CancellationToken) and returns
//! once it is cancelled.

pub mod exchange_rates;
pub mod session_cleanup;
