//! Update queue (`spec.md` §4.3): a FIFO of state updaters drained during
//! the commit phase of a turn.

/// An updater is either a replacement value or a function over the current
/// value.
pub enum Updater<S> {
    Value(S),
    Fn(Box<dyn FnOnce(&S) -> S + Send>),
}

impl<S> Updater<S> {
    pub fn value(value: S) -> Self {
        Updater::Value(value)
    }

    pub fn from_fn(f: impl FnOnce(&S) -> S + Send + 'static) -> Self {
        Updater::Fn(Box::new(f))
    }

    fn apply(self, current: &S) -> S {
        match self {
            Updater::Value(v) => v,
            Updater::Fn(f) => f(current),
        }
    }
}

pub struct UpdateQueue<S> {
    items: Vec<Updater<S>>,
    in_commit: bool,
    /// Set once per turn when a non-handler callsite enqueues while the
    /// queue is not already scheduled to drain on a `userCommit` work item.
    user_commit_pending: bool,
}

impl<S> Default for UpdateQueue<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> UpdateQueue<S> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            in_commit: false,
            user_commit_pending: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Appends an updater. Returns `true` if a `userCommit` work item should
    /// be scheduled as a result (no commit currently in flight and none
    /// already pending).
    pub fn enqueue(&mut self, updater: Updater<S>) -> bool {
        self.items.push(updater);
        if !self.in_commit && !self.user_commit_pending {
            self.user_commit_pending = true;
            true
        } else {
            false
        }
    }

    pub fn note_user_commit_scheduled(&mut self) {
        self.user_commit_pending = true;
    }

    /// Drains the current contents, folding them left over `current`, and
    /// empties the queue atomically with respect to the single executor.
    /// Marks `in_commit` for the duration so nested `enqueue` calls from
    /// within an updater are deferred to the next turn rather than observed
    /// by this fold, per `spec.md` §4.3.
    pub fn drain_and_apply(&mut self, current: S) -> S {
        self.in_commit = true;
        self.user_commit_pending = false;
        let drained: Vec<_> = self.items.drain(..).collect();
        let mut acc = current;
        for updater in drained {
            acc = updater.apply(&acc);
        }
        self.in_commit = false;
        acc
    }

    pub fn is_draining(&self) -> bool {
        self.in_commit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enqueue_schedules_user_commit_once() {
        let mut q: UpdateQueue<i32> = UpdateQueue::new();
        assert!(q.enqueue(Updater::value(1)));
        assert!(!q.enqueue(Updater::value(2)));
    }

    #[test]
    fn drain_folds_updaters_left_to_right() {
        let mut q: UpdateQueue<i32> = UpdateQueue::new();
        q.enqueue(Updater::value(1));
        q.enqueue(Updater::from_fn(|s| s + 10));
        q.enqueue(Updater::from_fn(|s| s * 2));
        let result = q.drain_and_apply(0);
        assert_eq!(result, 22);
        assert!(q.is_empty());
    }

    #[test]
    fn drain_empties_queue_and_rearms_scheduling() {
        let mut q: UpdateQueue<i32> = UpdateQueue::new();
        q.enqueue(Updater::value(5));
        q.drain_and_apply(0);
        assert!(q.is_empty());
        assert!(q.enqueue(Updater::value(6)));
    }
}
