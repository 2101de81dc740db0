//! Asynchronous screenshot persistence, off the decision loop's critical path.

use crate::device::ScreenImage;
use rand_chacha::ChaCha8Rng;
use std::fs;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use tracing::{debug, warn};

struct CaptureJob {
    image: ScreenImage,
    destination: PathBuf,
}

struct CaptureWorker {
    sender: mpsc::Sender<CaptureJob>,
    handle: thread::JoinHandle<()>,
}

/// Fixed pool of independent writer threads, each with its own unbounded
/// queue. Write failures are logged and the artifact dropped; the decision
/// loop never observes them.
pub struct CaptureService {
    workers: Vec<CaptureWorker>,
}

impl CaptureService {
    #[must_use]
    pub fn new(worker_count: usize) -> Self {
        let workers = (0..worker_count.max(1))
            .map(|index| {
                let (sender, receiver) = mpsc::channel::<CaptureJob>();
                let handle = thread::spawn(move || {
                    while let Ok(job) = receiver.recv() {
                        if let Err(err) = fs::write(&job.destination, &job.image.data) {
                            warn!(
                                destination = %job.destination.display(),
                                %err,
                                "dropping screenshot artifact"
                            );
                        }
                    }
                    debug!(worker = index, "capture worker drained");
                });
                CaptureWorker { sender, handle }
            })
            .collect();
        Self { workers }
    }

    /// Hand an image to a randomly chosen worker.
    pub fn submit(&self, image: ScreenImage, destination: PathBuf, rng: &mut ChaCha8Rng) {
        let Some(worker) = crate::rng::pick(rng, &self.workers) else {
            return;
        };
        if worker
            .sender
            .send(CaptureJob { image, destination })
            .is_err()
        {
            warn!("capture worker unavailable, dropping screenshot");
        }
    }

    /// Flush all pending writes and stop the workers.
    pub fn teardown(self) {
        for worker in self.workers {
            drop(worker.sender);
            if worker.handle.join().is_err() {
                warn!("capture worker exited abnormally");
            }
        }
    }
}
