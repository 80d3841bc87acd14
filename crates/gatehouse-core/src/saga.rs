//! Compensation tracking for multi-step workflows.
//!
//! Workflows that touch several fallible systems (profile row,
//! directory entry, user row) register a compensating action after
//! each completed step. On a later failure the saga unwinds,
//! executing compensations in reverse order; on success it is
//! committed and the compensations are dropped.

use std::future::Future;
use std::pin::Pin;

use tracing::{debug, warn};

type Compensation = Pin<Box<dyn Future<Output = Result<(), crate::error::GateError>> + Send>>;

#[derive(Default)]
pub struct Saga {
    compensations: Vec<(&'static str, Compensation)>,
}

impl Saga {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the compensation for a step that just completed.
    /// Compensation futures must own everything they need; they run
    /// only if a later step fails.
    pub fn on_failure<F>(&mut self, step: &'static str, compensation: F)
    where
        F: Future<Output = Result<(), crate::error::GateError>> + Send + 'static,
    {
        self.compensations.push((step, Box::pin(compensation)));
    }

    pub fn len(&self) -> usize {
        self.compensations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compensations.is_empty()
    }

    /// Run all registered compensations in reverse registration
    /// order. Compensation failures are logged and do not stop the
    /// remaining compensations.
    pub async fn unwind(mut self) {
        while let Some((step, compensation)) = self.compensations.pop() {
            debug!(step, "running compensation");
            if let Err(err) = compensation.await {
                warn!(step, error = %err, "compensation failed");
            }
        }
    }

    /// Drop all compensations without running them.
    pub fn commit(mut self) {
        self.compensations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;

    #[tokio::test]
    async fn unwind_runs_compensations_in_reverse_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut saga = Saga::new();

        for step in ["first", "second", "third"] {
            let order = order.clone();
            saga.on_failure(step, async move {
                order.lock().unwrap().push(step);
                Ok(())
            });
        }

        saga.unwind().await;
        assert_eq!(*order.lock().unwrap(), vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn commit_drops_compensations() {
        let ran = Arc::new(Mutex::new(false));
        let mut saga = Saga::new();
        {
            let ran = ran.clone();
            saga.on_failure("only", async move {
                *ran.lock().unwrap() = true;
                Ok(())
            });
        }
        saga.commit();
        assert!(!*ran.lock().unwrap());
    }

    #[tokio::test]
    async fn failed_compensation_does_not_stop_the_rest() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut saga = Saga::new();

        {
            let order = order.clone();
            saga.on_failure("first", async move {
                order.lock().unwrap().push("first");
                Ok(())
            });
        }
        saga.on_failure("second", async {
            Err(crate::error::GateError::Internal("boom".into()))
        });

        saga.unwind().await;
        assert_eq!(*order.lock().unwrap(), vec!["first"]);
    }
}
