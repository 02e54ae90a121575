use crate::PurgeItem;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Point-in-time view of a run, taken under the queue lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunState {
    pub items_remaining: usize,
    pub in_flight: usize,
    pub taken: usize,
    pub failed: bool,
}

#[derive(Debug)]
struct Inner {
    items: Vec<PurgeItem>,
    in_flight: usize,
    taken: usize,
    failed: bool,
}

/// The pending paths of one run, shared by all workers.
///
/// Removing an item, counting it as in flight and checking the failure latch
/// happen in one critical section. An item is handed out at most once, and
/// never after [`WorkQueue::latch_failure`].
#[derive(Debug)]
pub struct WorkQueue {
    inner: Mutex<Inner>,
}

/// Outcome of [`WorkQueue::take_one`].
#[derive(Debug)]
pub enum Take<'a> {
    Item(Claim<'a>),
    Empty,
    Failed,
}

/// An item owned by one worker. Counts as in flight until dropped.
#[derive(Debug)]
pub struct Claim<'a> {
    queue: &'a WorkQueue,
    item: PurgeItem,
}

impl WorkQueue {
    pub fn new<I>(items: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<PurgeItem>,
    {
        Self {
            inner: Mutex::new(Inner {
                items: items.into_iter().map(Into::into).collect(),
                in_flight: 0,
                taken: 0,
                failed: false,
            }),
        }
    }

    // nothing in the critical sections can panic, so a poisoned lock still
    // holds consistent counts.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn take_one(&self) -> Take<'_> {
        let mut inner = self.lock();
        if inner.failed {
            return Take::Failed;
        }

        match inner.items.pop() {
            Some(item) => {
                inner.in_flight += 1;
                inner.taken += 1;
                Take::Item(Claim { queue: self, item })
            }
            None => Take::Empty,
        }
    }

    /// Stop handing out items. Returns `false` if the queue was already latched.
    pub fn latch_failure(&self) -> bool {
        let mut inner = self.lock();
        !std::mem::replace(&mut inner.failed, true)
    }

    pub fn state(&self) -> RunState {
        let inner = self.lock();
        RunState {
            items_remaining: inner.items.len(),
            in_flight: inner.in_flight,
            taken: inner.taken,
            failed: inner.failed,
        }
    }

    pub fn remaining(&self) -> usize {
        self.lock().items.len()
    }
}

impl Claim<'_> {
    pub fn item(&self) -> &PurgeItem {
        &self.item
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.queue.lock().in_flight -= 1;
    }
}
