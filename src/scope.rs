// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Lifetime of a screen, handed to everything that works on its behalf
///
/// Cloning a scope shares it. Once [`Scope::cancel`] is called, pending
/// lookups give up and tasks spawned through [`Scope::spawn`] are stopped at
/// their next await point.
#[derive(Clone, Debug)]
pub struct Scope {
    cancelled: Arc<watch::Sender<bool>>,
}

impl Scope {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            cancelled: Arc::new(tx),
        }
    }

    /// Tear the scope down. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Resolves once the scope has been cancelled
    pub async fn cancelled(&self) {
        let mut rx = self.cancelled.subscribe();
        // The sender lives in `self`, so this only errors if it is dropped mid-wait
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Run `future` to completion unless the scope is cancelled first
    pub async fn run<F: Future>(&self, future: F) -> Option<F::Output> {
        if self.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            output = future => Some(output),
        }
    }

    /// Spawn a task that is dropped when the scope is cancelled
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime, like `tokio::spawn`.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<Option<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let scope = self.clone();
        tokio::spawn(async move { scope.run(future).await })
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}
