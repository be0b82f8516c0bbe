//! Background thread that runs layout requests off the caller's thread.
//!
//! Requests are queued on a channel and processed one at a time; each reply
//! travels back on its own channel. Nothing is shared between requests.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::config::LayoutConfig;
use crate::error::{LayoutError, Result};
use crate::layout::compute_layout;
use crate::model::{LayoutRequest, LayoutResult};

struct Job {
    request: LayoutRequest,
    reply: Sender<Result<LayoutResult>>,
}

pub struct LayoutWorker {
    jobs: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl LayoutWorker {
    pub fn spawn(config: LayoutConfig) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel::<Job>();
        let handle = thread::Builder::new()
            .name("layout-worker".to_string())
            .spawn(move || {
                for job in rx {
                    let result = compute_layout(&job.request, &config);
                    if job.reply.send(result).is_err() {
                        debug!("layout result dropped, ticket went away");
                    }
                }
            })?;
        Ok(Self {
            jobs: Some(tx),
            handle: Some(handle),
        })
    }

    pub fn submit(&self, request: LayoutRequest) -> LayoutTicket {
        let (reply, rx) = mpsc::channel();
        if let Some(jobs) = &self.jobs {
            // A failed send drops `reply`, which the ticket reports as closed.
            let _ = jobs.send(Job { request, reply });
        }
        LayoutTicket { rx }
    }
}

impl Drop for LayoutWorker {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Pending result of one submitted request.
pub struct LayoutTicket {
    rx: Receiver<Result<LayoutResult>>,
}

impl LayoutTicket {
    /// Block until the worker has finished this request.
    pub fn wait(self) -> Result<LayoutResult> {
        self.rx.recv().map_err(|_| LayoutError::WorkerClosed)?
    }

    /// `None` while the request is still running.
    pub fn try_result(&self) -> Option<Result<LayoutResult>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(LayoutError::WorkerClosed)),
        }
    }
}
