//! Background thread for slow work: the simulated analysis run and report export.
//!
//! All communication is via channels: `WorkerRequest` in over crossbeam,
//! `AppEvent` out over the tokio event bus. Dropping the [`Worker`] closes the
//! request channel, which cancels any stage timer still pending; no stage or
//! completion event is sent after that.

use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use conform_core::export::{self, ExportFormat};
use conform_core::processing::{self, PROCESSING_STAGES, SETTLE_DELAY, STAGE_DELAY};
use conform_core::types::ConformanceResult;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::event::AppEvent;

#[derive(Debug)]
pub enum WorkerRequest {
    /// Walk the processing stages for `run_id`.
    Simulate { run_id: String },
    /// Write a report of `results` into `dir`.
    Export {
        format: ExportFormat,
        run_id: String,
        results: Vec<ConformanceResult>,
        dir: PathBuf,
    },
}

/// Handle to the worker thread. Dropping it cancels pending work and joins.
pub struct Worker {
    tx: Option<Sender<WorkerRequest>>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn spawn(event_tx: UnboundedSender<AppEvent>) -> std::io::Result<Self> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let handle = std::thread::Builder::new()
            .name("conform-worker".into())
            .spawn(move || worker_loop(rx, event_tx))?;
        Ok(Self { tx: Some(tx), handle: Some(handle) })
    }

    pub fn send(&self, request: WorkerRequest) {
        if let Some(tx) = &self.tx {
            if tx.send(request).is_err() {
                warn!("worker thread is gone; request dropped");
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Loops over incoming requests until the channel is closed.
///
/// Requests that arrive while a simulation is waiting between stages are
/// queued and served afterwards, in order.
pub fn worker_loop(rx: Receiver<WorkerRequest>, event_tx: UnboundedSender<AppEvent>) {
    let mut backlog = VecDeque::new();
    loop {
        let request = match backlog.pop_front() {
            Some(request) => request,
            None => match rx.recv() {
                Ok(request) => request,
                Err(_) => break,
            },
        };
        match request {
            WorkerRequest::Simulate { run_id } => {
                if simulate(&run_id, &rx, &event_tx, &mut backlog).is_break() {
                    info!(run_id, "processing cancelled");
                    break;
                }
            }
            WorkerRequest::Export { format, run_id, results, dir } => {
                let result = export_report(format, &run_id, &results, dir);
                let _ = event_tx.send(AppEvent::ExportDone { format, result });
            }
        }
    }
    debug!("worker loop exited");
}

fn export_report(
    format: ExportFormat,
    run_id: &str,
    results: &[ConformanceResult],
    dir: PathBuf,
) -> Result<PathBuf, String> {
    std::fs::create_dir_all(&dir).map_err(|e| e.to_string())?;
    export::write_report(format, run_id, results, &dir).map_err(|e| e.to_string())
}

fn simulate(
    run_id: &str,
    rx: &Receiver<WorkerRequest>,
    event_tx: &UnboundedSender<AppEvent>,
    backlog: &mut VecDeque<WorkerRequest>,
) -> ControlFlow<()> {
    info!(run_id, expected = ?processing::total_duration(), "processing started");
    for stage in PROCESSING_STAGES {
        wait(STAGE_DELAY, rx, backlog)?;
        debug!(progress = stage.progress, status = stage.status, "processing stage");
        let _ = event_tx.send(AppEvent::Processing(stage));
    }
    wait(SETTLE_DELAY, rx, backlog)?;
    let _ = event_tx.send(AppEvent::ProcessingDone);
    ControlFlow::Continue(())
}

/// Sleeps for `delay` while still watching the request channel.
///
/// Breaks as soon as the channel disconnects.
fn wait(
    delay: Duration,
    rx: &Receiver<WorkerRequest>,
    backlog: &mut VecDeque<WorkerRequest>,
) -> ControlFlow<()> {
    let deadline = Instant::now() + delay;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return ControlFlow::Continue(());
        }
        match rx.recv_timeout(remaining) {
            Ok(request) => backlog.push_back(request),
            Err(RecvTimeoutError::Timeout) => return ControlFlow::Continue(()),
            Err(RecvTimeoutError::Disconnected) => return ControlFlow::Break(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conform_core::seed;
    use tokio::sync::mpsc;

    #[test]
    fn export_reports_back_on_the_bus() {
        let dir = tempfile::TempDir::new().unwrap();
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let worker = Worker::spawn(event_tx).unwrap();
        worker.send(WorkerRequest::Export {
            format: ExportFormat::Csv,
            run_id: "run-1".into(),
            results: seed::demo_results(),
            dir: dir.path().join("exports"),
        });
        worker.send(WorkerRequest::Export {
            format: ExportFormat::Pdf,
            run_id: "run-1".into(),
            results: seed::demo_results(),
            dir: dir.path().join("exports"),
        });
        drop(worker);

        match event_rx.try_recv() {
            Ok(AppEvent::ExportDone { format: ExportFormat::Csv, result: Ok(path) }) => {
                assert!(path.exists());
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(matches!(
            event_rx.try_recv(),
            Ok(AppEvent::ExportDone { format: ExportFormat::Pdf, result: Err(_) })
        ));
    }

    #[test]
    fn dropping_the_worker_cancels_processing() {
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let worker = Worker::spawn(event_tx).unwrap();
        worker.send(WorkerRequest::Simulate { run_id: "run-2".into() });
        let started = Instant::now();
        drop(worker);

        assert!(started.elapsed() < STAGE_DELAY);
        assert!(event_rx.try_recv().is_err(), "no stage may fire after teardown");
    }
}
