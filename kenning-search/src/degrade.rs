//! Soft-fail combinator shared by every pipeline sub-step.
//!
//! Provider calls, personal-corpus scans and profile analysis all follow
//! the same rule: a failure is logged and replaced by an empty/default
//! value so the surrounding request keeps going. [`OrDegrade`] is that
//! rule in one place.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Convert a fallible outcome into its default value, logging the failure.
pub trait OrDegrade<T> {
    /// Return the success value, or `T::default()` after a `warn!` naming `step`.
    fn or_degrade(self, step: &str) -> T;
}

impl<T, E> OrDegrade<T> for Result<T, E>
where
    T: Default,
    E: Display,
{
    fn or_degrade(self, step: &str) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(step, error = %err, "degrading to default");
                T::default()
            }
        }
    }
}

impl<T: Default> OrDegrade<T> for Option<T> {
    fn or_degrade(self, step: &str) -> T {
        match self {
            Some(value) => value,
            None => {
                tracing::debug!(step, "no value, using default");
                T::default()
            }
        }
    }
}

/// Await `fut` for at most `limit`, degrading to the default on timeout.
pub async fn within<T, F>(limit: Duration, step: &str, fut: F) -> T
where
    T: Default,
    F: Future<Output = T>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(step, timeout_ms = limit.as_millis() as u64, "timed out, degrading to default");
            T::default()
        }
    }
}
