//! Bounded worker pool for batch header updates.
//!
//! Workers analyze files independently; every registry mutation funnels
//! through the registry's internal mutex, so the only coordination here is
//! the work queue itself. One file failing never aborts the others.

use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use crate::pipeline::{BatchReport, UpdatePipeline};

pub struct UpdatePool {
    workers: usize,
}

impl UpdatePool {
    pub fn new(workers: usize) -> Self {
        UpdatePool {
            workers: workers.max(1),
        }
    }

    /// Pool sized to the machine, at least 2 workers.
    pub fn with_default_size() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get().max(2))
            .unwrap_or(2);
        UpdatePool::new(workers)
    }

    /// Update the header of every file in the batch, in parallel.
    pub fn run(&self, pipeline: Arc<UpdatePipeline>, files: Vec<PathBuf>) -> BatchReport {
        let total = files.len();
        if total == 0 {
            return BatchReport::default();
        }

        let (work_tx, work_rx) = mpsc::channel::<PathBuf>();
        let work_rx = Arc::new(Mutex::new(work_rx));
        let (done_tx, done_rx) = mpsc::channel::<bool>();

        for path in files {
            // The receiver outlives every send.
            let _ = work_tx.send(path);
        }
        drop(work_tx);

        std::thread::scope(|scope| {
            for worker_id in 0..self.workers.min(total) {
                let work_rx = Arc::clone(&work_rx);
                let done_tx = done_tx.clone();
                let pipeline = Arc::clone(&pipeline);
                scope.spawn(move || {
                    tracing::debug!("Update worker {} started", worker_id);
                    loop {
                        let path = {
                            let guard = work_rx.lock().unwrap_or_else(|e| e.into_inner());
                            guard.recv()
                        };
                        let Ok(path) = path else {
                            break;
                        };
                        let ok = match pipeline.update_file(&path) {
                            Ok(_) => true,
                            Err(e) => {
                                tracing::error!("Failed to update {}: {e:#}", path.display());
                                false
                            }
                        };
                        if done_tx.send(ok).is_err() {
                            break;
                        }
                    }
                    tracing::debug!("Update worker {} finished", worker_id);
                });
            }
            drop(done_tx);

            let mut report = BatchReport {
                total,
                ..BatchReport::default()
            };
            for ok in done_rx {
                if ok {
                    report.updated += 1;
                } else {
                    report.failed += 1;
                }
            }
            report
        })
    }
}
