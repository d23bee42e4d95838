//! Visual transition bracket
//!
//! Appliers wrap every mutation in `begin`/`complete` so a UI can animate the
//! reorder as one step. The bracket is always closed, also when the mutation
//! fails.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

/// Opaque begin/complete bracket around a mutation
#[async_trait]
pub trait ViewTransition: Send + Sync {
    /// Called before the mutation starts
    async fn begin(&self);

    /// Called after the mutation finished, successfully or not
    async fn complete(&self);
}

/// Transition that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTransition;

#[async_trait]
impl ViewTransition for NoTransition {
    async fn begin(&self) {}

    async fn complete(&self) {}
}

/// Transition that counts how often it was entered and left
#[derive(Debug, Default)]
pub struct CountingTransition {
    begins: AtomicUsize,
    completes: AtomicUsize,
}

impl CountingTransition {
    /// Creates a counter at zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `begin` calls
    #[must_use]
    pub fn begins(&self) -> usize {
        self.begins.load(Ordering::SeqCst)
    }

    /// Number of `complete` calls
    #[must_use]
    pub fn completes(&self) -> usize {
        self.completes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ViewTransition for CountingTransition {
    async fn begin(&self) {
        self.begins.fetch_add(1, Ordering::SeqCst);
    }

    async fn complete(&self) {
        self.completes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Runs `mutation` inside the bracket
pub(crate) async fn run_in_transition<F, T>(transition: &dyn ViewTransition, mutation: F) -> T
where
    F: Future<Output = T> + Send,
{
    transition.begin().await;
    let result = mutation.await;
    transition.complete().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bracket_is_paired_on_error() {
        let transition = CountingTransition::new();
        let result: Result<(), &str> = run_in_transition(&transition, async { Err("boom") }).await;
        assert!(result.is_err());
        assert_eq!(transition.begins(), 1);
        assert_eq!(transition.completes(), 1);
    }
}
