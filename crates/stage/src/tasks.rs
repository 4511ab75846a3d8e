use std::future::Future;
use std::task::{Context, Poll};

use futures::future::{AbortHandle, Abortable, Aborted, LocalBoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use futures::task::noop_waker_ref;
use futures::FutureExt;

/// A set of in-flight single-threaded futures owned by one component.
///
/// Outcomes are collected by polling between frames; nothing here blocks.
/// Every future is wrapped in [`Abortable`] so the whole set can be
/// cancelled in bulk.
pub struct TaskSet<T> {
    running: FuturesUnordered<Abortable<LocalBoxFuture<'static, T>>>,
    handles: Vec<AbortHandle>,
}

impl<T> Default for TaskSet<T> {
    fn default() -> Self {
        Self {
            running: FuturesUnordered::new(),
            handles: Vec::new(),
        }
    }
}

impl<T: 'static> TaskSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, future: impl Future<Output = T> + 'static) {
        let (handle, registration) = AbortHandle::new_pair();
        self.handles.push(handle);
        self.running
            .push(Abortable::new(future.boxed_local(), registration));
    }

    /// Outcomes of every future that finished since the last call, in completion order.
    pub fn poll_ready(&mut self) -> Vec<T> {
        let mut cx = Context::from_waker(noop_waker_ref());
        let mut done = Vec::new();
        while let Poll::Ready(Some(outcome)) = self.running.poll_next_unpin(&mut cx) {
            match outcome {
                Ok(value) => done.push(value),
                Err(Aborted) => {}
            }
        }
        if self.running.is_empty() {
            self.handles.clear();
        }
        done
    }

    /// Abort everything in flight. Aborted futures never yield an outcome.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.running.len();
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        self.running = FuturesUnordered::new();
        cancelled
    }

    pub fn len(&self) -> usize {
        self.running.len()
    }

    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }
}
