/// FIFO of deferred operations against a target.
///
/// Each operation is stamped with the time it was queued and runs later,
/// from `process`. An operation returns `Ok(true)` when done, `Ok(false)` to
/// stay at the front of the queue and be retried on the next `process`.

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;
use crate::error::Result;
use crate::engine_trace;

/// Deferred operation body: target and the time it was queued at
pub type Operation<T> = Box<dyn FnMut(&mut T, Duration) -> Result<bool> + Send>;

struct QueuedOperation<T> {
    name: String,
    queued_at: Duration,
    run: Operation<T>,
}

pub struct OperationQueue<T> {
    pending: VecDeque<QueuedOperation<T>>,
}

impl<T> OperationQueue<T> {
    pub fn new() -> Self {
        Self { pending: VecDeque::new() }
    }

    /// Append an operation stamped with `queued_at`
    pub fn push<F>(&mut self, name: impl Into<String>, queued_at: Duration, run: F)
    where
        F: FnMut(&mut T, Duration) -> Result<bool> + Send + 'static,
    {
        self.pending.push_back(QueuedOperation {
            name: name.into(),
            queued_at,
            run: Box::new(run),
        });
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Names of the pending operations, oldest first
    pub fn names(&self) -> Vec<&str> {
        self.pending.iter().map(|op| op.name.as_str()).collect()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Run pending operations in submission order.
    ///
    /// Stops after `budget` completed operations, at the first operation
    /// asking to be retried, or at the first error. A failed operation is
    /// dropped; the ones behind it stay queued. Returns the number of
    /// operations completed.
    pub fn process(&mut self, target: &mut T, budget: Option<usize>) -> Result<usize> {
        let mut completed = 0;
        while budget.map_or(true, |max| completed < max) {
            let Some(mut op) = self.pending.pop_front() else { break };
            match (op.run)(target, op.queued_at) {
                Ok(true) => {
                    engine_trace!("carbon::OperationQueue", "Completed '{}'", op.name);
                    completed += 1;
                }
                Ok(false) => {
                    engine_trace!("carbon::OperationQueue", "'{}' asked to retry", op.name);
                    self.pending.push_front(op);
                    break;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(completed)
    }
}

impl<T> Default for OperationQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for OperationQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationQueue")
            .field("pending", &self.names())
            .finish()
    }
}

#[cfg(test)]
#[path = "operation_queue_tests.rs"]
mod tests;
