use std::collections::VecDeque;
use std::iter::FromIterator;
use std::sync::{Mutex, MutexGuard};

/**
 * FIFO of pending jobs shared by the workers of a single render. The lock is held
 * only while a job is pushed or popped; all real work happens outside of it.
 */
#[derive(Debug, Default)]
pub struct WorkQueue<J> {
    jobs: Mutex<VecDeque<J>>,
}

impl<J> WorkQueue<J> {
    pub fn new() -> WorkQueue<J> {
        WorkQueue {
            jobs: Mutex::new(VecDeque::new()),
        }
    }

    // Popping cannot leave the deque half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, VecDeque<J>> {
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, job: J) {
        self.lock().push_back(job);
    }

    /// Removes the oldest job, or returns `None` once the queue has been drained.
    pub fn try_pop(&self) -> Option<J> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<J> FromIterator<J> for WorkQueue<J> {
    fn from_iter<I: IntoIterator<Item = J>>(iter: I) -> Self {
        WorkQueue {
            jobs: Mutex::new(iter.into_iter().collect()),
        }
    }
}

/// One unit of render work: compute and color the pixel at `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PixelJob {
    pub x: u32,
    pub y: u32,
}
