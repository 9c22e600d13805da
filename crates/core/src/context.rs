//! Application context for async continuations feeding the update queue.
//!
//! `spec.md` §9 models timers, intervals, and other asynchronous
//! continuations as tasks that "deliver completion into the scheduler as
//! work items; no task mutates core state directly." `AppContext` is the
//! concrete handle for that: cloning it and moving it into a spawned task
//! is the only sanctioned way application code reaches back into the
//! runtime, and it can only ever enqueue an [`Updater`](crate::update_queue::Updater)
//! — never touch the committed tree, layout, or router state directly.
//!
//! This is the teacher's `context.rs` (`AppContext::post`/`set_timer`/
//! `set_interval`) retargeted from a message-bubbling channel to the
//! `UpdateQueue` this crate's commit model actually uses.

use std::time::Duration;

use tokio::sync::mpsc;

use crate::update_queue::Updater;

/// Handle for posting state updates and scheduling timers/intervals from
/// outside a turn (e.g. from a spawned task). Clone freely; the underlying
/// channel is shared.
#[derive(Clone)]
pub struct AppContext<S> {
    sender: mpsc::UnboundedSender<Updater<S>>,
}

impl<S> AppContext<S> {
    pub fn new(sender: mpsc::UnboundedSender<Updater<S>>) -> Self {
        Self { sender }
    }

    /// Gives a clone of the raw sender for manual use (e.g. wiring into a
    /// user-authored async task that produces its own [`Updater`]s).
    pub fn sender(&self) -> mpsc::UnboundedSender<Updater<S>> {
        self.sender.clone()
    }
}

impl<S: Send + 'static> AppContext<S> {
    /// Replaces the state with `value` on the next drain.
    pub fn post(&self, value: S) {
        let _ = self.sender.send(Updater::value(value));
    }

    /// Enqueues a function over the current state, applied on the next
    /// drain in enqueue order alongside any other pending updaters.
    pub fn update(&self, f: impl FnOnce(&S) -> S + Send + 'static) {
        let _ = self.sender.send(Updater::from_fn(f));
    }

    /// Schedules a one-shot state transform to run after `delay`.
    pub fn set_timer(&self, delay: Duration, f: impl FnOnce(&S) -> S + Send + 'static) {
        let sender = self.sender.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = sender.send(Updater::from_fn(f));
        });
    }

    /// Schedules a repeating state transform. Returns a handle that cancels
    /// the interval when dropped or when [`IntervalHandle::cancel`] is
    /// called.
    pub fn set_interval<F>(&self, interval: Duration, f: F) -> IntervalHandle
    where
        F: Fn(&S) -> S + Send + 'static,
    {
        let sender = self.sender.clone();
        let (cancel_tx, mut cancel_rx) = tokio::sync::oneshot::channel();

        tokio::spawn(async move {
            // Delayed first tick so cancellation raced against spawn always
            // wins rather than racing the first immediate tick.
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let f = &f;
                        if sender.send(Updater::from_fn(move |s| f(s))).is_err() {
                            break;
                        }
                    }
                    _ = &mut cancel_rx => break,
                }
            }
        });

        IntervalHandle { cancel_tx: Some(cancel_tx) }
    }
}

/// Cancels a running interval on drop or explicit [`cancel`](Self::cancel).
pub struct IntervalHandle {
    cancel_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl IntervalHandle {
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for IntervalHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::update_queue::UpdateQueue;

    #[tokio::test]
    async fn post_enqueues_a_value_updater() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ctx: AppContext<i32> = AppContext::new(tx);
        ctx.post(42);
        let updater = rx.recv().await.unwrap();
        let mut queue: UpdateQueue<i32> = UpdateQueue::new();
        queue.enqueue(updater);
        assert_eq!(queue.drain_and_apply(0), 42);
    }

    #[tokio::test]
    async fn timer_fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ctx: AppContext<i32> = AppContext::new(tx);
        ctx.set_timer(Duration::from_millis(5), |s| s + 1);
        let updater = rx.recv().await.unwrap();
        let mut queue: UpdateQueue<i32> = UpdateQueue::new();
        queue.enqueue(updater);
        assert_eq!(queue.drain_and_apply(10), 11);
    }

    #[tokio::test]
    async fn interval_fires_multiple_times_until_cancelled() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ctx: AppContext<i32> = AppContext::new(tx);
        let mut handle = ctx.set_interval(Duration::from_millis(5), |s| s + 1);

        let _ = rx.recv().await.unwrap();
        let _ = rx.recv().await.unwrap();

        handle.cancel();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let remaining: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert!(remaining.len() <= 1, "interval kept firing after cancel");
    }
}
