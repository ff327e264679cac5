// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background extraction worker.
//!
//! The chat loop hands extraction jobs to a bounded queue and moves on.
//! A single task drains the queue through the manager and reports every
//! job's outcome to an [`ExtractionSink`].

use std::sync::Arc;

use async_trait::async_trait;
use mnemo_config::model::MemoryConfig;
use mnemo_core::{MnemoError, Scope, Turn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::manager::{ExtractionReport, MemoryManager};

/// One unit of background extraction work.
#[derive(Debug, Clone)]
pub struct ExtractionJob {
    pub scope: Scope,
    pub turns: Vec<Turn>,
    pub character_label: String,
}

/// Receives the outcome of every job the worker runs.
#[async_trait]
pub trait ExtractionSink: Send + Sync {
    async fn on_complete(&self, job: &ExtractionJob, outcome: &Result<ExtractionReport, MnemoError>);
}

/// Sink that writes outcomes to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl ExtractionSink for LogSink {
    async fn on_complete(&self, job: &ExtractionJob, outcome: &Result<ExtractionReport, MnemoError>) {
        match outcome {
            Ok(report) => info!(
                scope = %job.scope,
                saved = report.saved,
                duplicates = report.duplicates,
                failed = report.failed,
                discarded = report.discarded,
                "background extraction finished"
            ),
            Err(e) => warn!(scope = %job.scope, error = %e, "background extraction failed"),
        }
    }
}

/// Submission side of a running extraction worker.
pub struct ExtractionHandle {
    tx: mpsc::Sender<ExtractionJob>,
    task: JoinHandle<()>,
}

impl ExtractionHandle {
    /// Enqueue a job without waiting for it to run.
    ///
    /// Fails when the queue is full or the worker has stopped; the job is
    /// dropped in both cases.
    pub fn submit(&self, job: ExtractionJob) -> Result<(), MnemoError> {
        self.tx.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(job) => {
                MnemoError::Internal(format!("extraction queue full, dropping job for {}", job.scope))
            }
            mpsc::error::TrySendError::Closed(_) => {
                MnemoError::Internal("extraction worker has stopped".to_string())
            }
        })
    }

    /// Close the queue, let queued jobs drain, and wait for the worker to exit.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.task.await {
            warn!(error = %e, "extraction worker panicked");
        }
    }
}

/// Spawn the worker on the current Tokio runtime.
///
/// The worker stops once every handle is dropped and the queue is drained,
/// or once `cancel` fires. On cancellation the in-flight job ends with
/// `MnemoError::Cancelled`, and so does every job still queued.
pub fn spawn_extraction_worker(
    manager: Arc<MemoryManager>,
    capacity: usize,
    cancel: CancellationToken,
    sink: Arc<dyn ExtractionSink>,
) -> ExtractionHandle {
    let (tx, mut rx) = mpsc::channel::<ExtractionJob>(capacity.max(1));

    let task = tokio::spawn(async move {
        loop {
            let job = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                job = rx.recv() => match job {
                    Some(job) => job,
                    None => break,
                },
            };

            let outcome = manager
                .extract_and_store(&job.scope, &job.turns, &job.character_label, &cancel)
                .await;
            sink.on_complete(&job, &outcome).await;
        }

        if cancel.is_cancelled() {
            rx.close();
            let mut abandoned = 0usize;
            let cancelled = Err(MnemoError::Cancelled);
            while let Some(job) = rx.recv().await {
                sink.on_complete(&job, &cancelled).await;
                abandoned += 1;
            }
            if abandoned > 0 {
                warn!(abandoned, "extraction worker cancelled with jobs queued");
            }
        }
        debug!("extraction worker stopped");
    });

    ExtractionHandle { tx, task }
}

/// [`spawn_extraction_worker`] sized by `memory.worker_queue_capacity`.
pub fn spawn_extraction_worker_from_config(
    manager: Arc<MemoryManager>,
    config: &MemoryConfig,
    cancel: CancellationToken,
    sink: Arc<dyn ExtractionSink>,
) -> ExtractionHandle {
    spawn_extraction_worker(manager, config.worker_queue_capacity, cancel, sink)
}
