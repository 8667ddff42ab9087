//! Compensation saga for side effects the store's transaction boundary
//! does not cover.
//!
//! Each step that leaves a durable trace before the operation is known to
//! succeed registers a compensating action. On failure the stack unwinds
//! in reverse order; `commit()` disarms it. Compensations are created
//! lazily (async blocks) and only run if the saga unwinds.

use std::future::Future;
use std::pin::Pin;

type Compensation<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

pub(crate) struct Saga<'a> {
    compensations: Vec<Compensation<'a>>,
}

impl<'a> Saga<'a> {
    pub fn new() -> Self {
        Self {
            compensations: Vec::new(),
        }
    }

    /// Register a compensating action for the most recent side effect.
    pub fn push(&mut self, compensation: impl Future<Output = ()> + Send + 'a) {
        self.compensations.push(Box::pin(compensation));
    }

    /// The operation succeeded; drop all compensations unexecuted.
    pub fn commit(mut self) {
        self.compensations.clear();
    }

    /// The operation failed; run compensations newest-first.
    pub async fn unwind(mut self) {
        while let Some(compensation) = self.compensations.pop() {
            compensation.await;
        }
    }
}
