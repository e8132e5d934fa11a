use log::debug;

use super::work_queue::WorkQueue;

/**
 * Fixed-size set of OS threads scoped to a single drain of a `WorkQueue`. Threads are
 * spawned per call and joined before the call returns, so nothing outlives the render
 * that created it.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    worker_count: usize,
}

impl WorkerPool {
    pub fn new(worker_count: usize) -> WorkerPool {
        WorkerPool {
            worker_count: worker_count.max(1),
        }
    }

    pub fn with_available_parallelism() -> WorkerPool {
        WorkerPool::new(num_cpus::get())
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /**
     * Run `process` on every job in the queue. Each worker pops until the queue is empty,
     * then terminates; this call blocks until all workers have been joined. A panic in
     * any worker is re-raised here after the others finish.
     *
     * @return: number of jobs completed by each worker.
     */
    pub fn drain<J, F>(&self, queue: &WorkQueue<J>, process: F) -> Vec<usize>
    where
        J: Send,
        F: Fn(J) + Sync,
    {
        let process = &process;
        let outcome = crossbeam::scope(|scope| {
            let handles: Vec<_> = (0..self.worker_count)
                .map(|_| {
                    scope.spawn(move |_| {
                        let mut completed = 0;
                        while let Some(job) = queue.try_pop() {
                            process(job);
                            completed += 1;
                        }
                        completed
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join())
                .collect::<Vec<_>>()
        });

        let joined = match outcome {
            Ok(joined) => joined,
            Err(panic) => std::panic::resume_unwind(panic),
        };
        let mut jobs_per_worker = Vec::with_capacity(joined.len());
        for result in joined {
            match result {
                Ok(completed) => jobs_per_worker.push(completed),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        debug!("Worker pool finished; jobs per worker: {:?}", jobs_per_worker);
        jobs_per_worker
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        WorkerPool::with_available_parallelism()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_worker_count_is_at_least_one() {
        assert_eq!(WorkerPool::new(0).worker_count(), 1);
        assert_eq!(WorkerPool::new(6).worker_count(), 6);
        assert!(WorkerPool::with_available_parallelism().worker_count() >= 1);
    }

    #[test]
    fn test_drain_processes_every_job_exactly_once() {
        for worker_count in [1, 2, 8].iter() {
            let hits: Vec<AtomicUsize> = (0..1000).map(|_| AtomicUsize::new(0)).collect();
            let queue: WorkQueue<usize> = (0..1000).collect();
            let jobs_per_worker = WorkerPool::new(*worker_count).drain(&queue, |job| {
                hits[job].fetch_add(1, Ordering::SeqCst);
            });
            assert_eq!(jobs_per_worker.len(), *worker_count);
            assert_eq!(jobs_per_worker.iter().sum::<usize>(), 1000);
            assert!(hits.iter().all(|count| count.load(Ordering::SeqCst) == 1));
            assert!(queue.is_empty());
        }
    }

    #[test]
    fn test_drain_empty_queue() {
        let queue: WorkQueue<u8> = WorkQueue::new();
        let jobs_per_worker = WorkerPool::new(4).drain(&queue, |_| panic!("no jobs expected"));
        assert_eq!(jobs_per_worker, vec![0, 0, 0, 0]);
    }

    #[test]
    #[should_panic(expected = "bad job")]
    fn test_worker_panic_propagates() {
        let queue: WorkQueue<u32> = (0..16).collect();
        WorkerPool::new(2).drain(&queue, |job| {
            if job == 7 {
                panic!("bad job");
            }
        });
    }
}
