//! Background execution context for asynchronous publishing.
//!
//! The reactor owns at most one worker thread. The first `perform` call
//! starts it and waits only for the worker to report that it is ready, not
//! for the task to finish. A worker found dead is reaped and replaced.

use crate::error::{Result, SyncError};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

type Task = Box<dyn FnOnce() -> Result<()> + Send + 'static>;

enum Job {
    Run(Task),
    Stop,
}

/// Lifecycle of the background context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReactorState {
    Stopped,
    Starting,
    Running,
}

struct Worker {
    jobs: Sender<Job>,
    handle: JoinHandle<()>,
    alive: Arc<AtomicBool>,
}

impl Worker {
    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire) && !self.handle.is_finished()
    }
}

struct Inner {
    state: ReactorState,
    worker: Option<Worker>,
}

struct Shared {
    inner: Mutex<Inner>,
    ready: Condvar,
}

/// Single shared worker that asynchronous publishes are scheduled onto.
pub struct Reactor {
    name: String,
    shared: Arc<Shared>,
    starts: AtomicUsize,
}

impl Reactor {
    pub fn new() -> Self {
        Self::named("render-sync-reactor")
    }

    /// Reactor whose worker thread carries `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: ReactorState::Stopped,
                    worker: None,
                }),
                ready: Condvar::new(),
            }),
            starts: AtomicUsize::new(0),
        }
    }

    /// Schedule `task` on the worker, starting the worker first if needed.
    ///
    /// Returns once the task is queued. A failing task is logged, never
    /// returned.
    pub fn perform<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let mut inner = self.shared.inner.lock();
        loop {
            match inner.state {
                ReactorState::Running => {
                    let alive = inner.worker.as_ref().map(Worker::is_alive).unwrap_or(false);
                    if alive {
                        break;
                    }
                    warn!(reactor = %self.name, "reactor worker died, restarting");
                    inner.worker = None;
                    inner.state = ReactorState::Stopped;
                }
                ReactorState::Starting => self.shared.ready.wait(&mut inner),
                ReactorState::Stopped => {
                    self.start(&mut inner)?;
                    while inner.state == ReactorState::Starting {
                        self.shared.ready.wait(&mut inner);
                    }
                }
            }
        }

        let worker = inner.worker.as_ref().ok_or(SyncError::ReactorStopped)?;
        worker
            .jobs
            .send(Job::Run(Box::new(task)))
            .map_err(|_| SyncError::ReactorStopped)
    }

    fn start(&self, inner: &mut Inner) -> Result<()> {
        inner.state = ReactorState::Starting;

        let (jobs, queue) = unbounded();
        let alive = Arc::new(AtomicBool::new(true));
        let shared = Arc::clone(&self.shared);
        let worker_alive = Arc::clone(&alive);
        let spawned = thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || worker_loop(shared, queue, worker_alive));

        match spawned {
            Ok(handle) => {
                let starts = self.starts.fetch_add(1, Ordering::SeqCst) + 1;
                info!(reactor = %self.name, starts, "starting reactor");
                inner.worker = Some(Worker {
                    jobs,
                    handle,
                    alive,
                });
                Ok(())
            }
            Err(e) => {
                inner.state = ReactorState::Stopped;
                self.shared.ready.notify_all();
                Err(e.into())
            }
        }
    }

    /// Halt the worker after it drains queued tasks. No-op when stopped.
    pub fn stop(&self) {
        let worker = {
            let mut inner = self.shared.inner.lock();
            while inner.state == ReactorState::Starting {
                self.shared.ready.wait(&mut inner);
            }
            inner.state = ReactorState::Stopped;
            inner.worker.take()
        };

        let Some(worker) = worker else {
            return;
        };
        let _ = worker.jobs.send(Job::Stop);
        if worker.handle.thread().id() != thread::current().id() {
            let _ = worker.handle.join();
        }
        info!(reactor = %self.name, "stopped reactor");
    }

    pub fn state(&self) -> ReactorState {
        self.shared.inner.lock().state
    }

    /// Whether a live worker is accepting tasks.
    pub fn is_running(&self) -> bool {
        let inner = self.shared.inner.lock();
        inner.state == ReactorState::Running
            && inner.worker.as_ref().map(Worker::is_alive).unwrap_or(false)
    }

    /// Number of worker threads started so far.
    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

impl Default for Reactor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Reactor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Clears the liveness flag however the worker exits.
struct AliveGuard(Arc<AtomicBool>);

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn worker_loop(shared: Arc<Shared>, queue: Receiver<Job>, alive: Arc<AtomicBool>) {
    let _guard = AliveGuard(alive);

    {
        let mut inner = shared.inner.lock();
        if inner.state == ReactorState::Starting {
            inner.state = ReactorState::Running;
        }
    }
    shared.ready.notify_all();
    debug!("reactor ready");

    for job in queue.iter() {
        match job {
            Job::Run(task) => match panic::catch_unwind(AssertUnwindSafe(task)) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "asynchronous task failed"),
                Err(_) => error!("asynchronous task panicked"),
            },
            Job::Stop => break,
        }
    }
}
