//! Fixed-size worker pool running build closures off the frame thread.
//!
//! Jobs are self-contained: every input they touch is an immutable copy, and
//! their only output is whatever they send on their own result channel, so
//! no locks are held inside worker code.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::error;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Pool size for the current machine: hardware threads minus one for the
/// frame thread, never less than one worker.
pub fn default_worker_count() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

/// A pool of build workers consuming boxed closures.
pub struct BuildPipeline {
    /// Job sender; dropped on shutdown to let workers drain and exit.
    job_sender: Option<Sender<Job>>,
    /// Worker thread handles, joined on shutdown.
    worker_handles: Vec<JoinHandle<()>>,
    /// Jobs submitted but not yet finished.
    in_flight: Arc<AtomicUsize>,
}

impl BuildPipeline {
    /// Spawn a pool with `worker_count` threads.
    pub fn new(worker_count: usize) -> Self {
        let (job_sender, job_receiver) = unbounded::<Job>();
        let in_flight = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::with_capacity(worker_count);
        for _ in 0..worker_count {
            let receiver: Receiver<Job> = job_receiver.clone();
            let flight = Arc::clone(&in_flight);

            let handle = std::thread::Builder::new()
                .name("veldt-build".into())
                .spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        // A panicking build must not take the worker down;
                        // the job's result is simply never sent and its
                        // coordinate stays pending.
                        if std::panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                            error!("build job panicked; result dropped");
                        }
                        flight.fetch_sub(1, Ordering::Relaxed);
                    }
                })
                .expect("failed to spawn build worker thread");
            handles.push(handle);
        }

        Self {
            job_sender: Some(job_sender),
            worker_handles: handles,
            in_flight,
        }
    }

    /// Spawn a pool sized for the current machine.
    pub fn with_default_workers() -> Self {
        Self::new(default_worker_count())
    }

    /// Queue a build closure. Returns `false` once the pipeline has been
    /// shut down.
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) -> bool {
        let Some(sender) = &self.job_sender else {
            return false;
        };
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        if sender.send(Box::new(job)).is_err() {
            self.in_flight.fetch_sub(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    /// Jobs queued or currently executing.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Stop accepting jobs and join every worker.
    ///
    /// Queued jobs still run to completion before the workers exit; their
    /// results are the caller's to discard.
    pub fn shutdown(&mut self) {
        self.job_sender.take();
        for handle in self.worker_handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for BuildPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_until(deadline: Duration, mut done: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < deadline {
            if done() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        done()
    }

    #[test]
    fn test_submitted_jobs_all_run() {
        let pipeline = BuildPipeline::new(4);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..64 {
            let counter = Arc::clone(&counter);
            assert!(pipeline.submit(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            }));
        }

        assert!(
            wait_until(Duration::from_secs(10), || counter
                .load(Ordering::Relaxed)
                == 64),
            "expected all 64 jobs to run, got {}",
            counter.load(Ordering::Relaxed)
        );
    }

    #[test]
    fn test_panicking_job_does_not_poison_the_pool() {
        let pipeline = BuildPipeline::new(1);
        let counter = Arc::new(AtomicUsize::new(0));

        assert!(pipeline.submit(|| panic!("intentional test panic")));
        let after = Arc::clone(&counter);
        assert!(pipeline.submit(move || {
            after.fetch_add(1, Ordering::Relaxed);
        }));

        assert!(
            wait_until(Duration::from_secs(10), || counter
                .load(Ordering::Relaxed)
                == 1),
            "job after the panicking one should still run"
        );
    }

    #[test]
    fn test_in_flight_drains_to_zero() {
        let pipeline = BuildPipeline::new(2);
        for _ in 0..16 {
            pipeline.submit(|| std::thread::sleep(Duration::from_millis(2)));
        }
        assert!(
            wait_until(Duration::from_secs(10), || pipeline.in_flight() == 0),
            "in-flight count should drain, still {}",
            pipeline.in_flight()
        );
    }

    #[test]
    fn test_submit_after_shutdown_is_rejected() {
        let mut pipeline = BuildPipeline::new(2);
        pipeline.shutdown();
        assert!(!pipeline.submit(|| {}));
        // Idempotent.
        pipeline.shutdown();
    }

    #[test]
    fn test_default_worker_count_is_positive() {
        assert!(default_worker_count() >= 1);
    }
}
