//! Periodic folder scans.
//!
//! One background thread owns a current-thread runtime and runs scans one
//! after another. A manual trigger cancels the scan in flight; the loop
//! then picks the trigger up and starts over.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::config::SharedConfig;
use crate::scanner::folder_scanner::{CancelFlag, FolderScanner, ScanProgress};

pub struct ScanScheduler {
    scanner: FolderScanner,
    config: SharedConfig,
    progress: Arc<dyn ScanProgress>,
    interval: Option<Duration>,
    shutdown: Arc<AtomicBool>,
    started: AtomicBool,
    current: Arc<Mutex<CancelFlag>>,
    trigger_tx: broadcast::Sender<()>,
}

impl ScanScheduler {
    pub fn new(scanner: FolderScanner, config: SharedConfig, progress: Arc<dyn ScanProgress>) -> Self {
        let (trigger_tx, _) = broadcast::channel(16);
        Self {
            scanner,
            config,
            progress,
            interval: None,
            shutdown: Arc::new(AtomicBool::new(false)),
            started: AtomicBool::new(false),
            current: Arc::new(Mutex::new(CancelFlag::new())),
            trigger_tx,
        }
    }

    /// Fixed interval instead of `scanIntervalMinutes`.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Starts the scan loop in a background thread. Only one loop runs per
    /// scheduler; a second call fails with `AlreadyExists`.
    pub fn start(&self) -> std::io::Result<JoinHandle<()>> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "Scan scheduler already started",
            ));
        }

        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                self.started.store(false, Ordering::Release);
                return Err(e);
            }
        };

        let scanner = self.scanner.clone();
        let config = self.config.clone();
        let progress = Arc::clone(&self.progress);
        let fixed_interval = self.interval;
        let shutdown = Arc::clone(&self.shutdown);
        let current = Arc::clone(&self.current);
        let mut trigger_rx = self.trigger_tx.subscribe();

        Ok(std::thread::spawn(move || {
            rt.block_on(async {
                loop {
                    if shutdown.load(Ordering::Acquire) {
                        break;
                    }

                    let wait = fixed_interval.unwrap_or_else(|| {
                        Duration::from_secs(config.snapshot().scan_interval_minutes * 60)
                    });
                    tokio::select! {
                        _ = tokio::time::sleep(wait) => {},
                        Ok(()) = trigger_rx.recv() => {
                            log::info!("Manual folder scan triggered");
                        },
                    }

                    if shutdown.load(Ordering::Acquire) {
                        break;
                    }

                    let cancel = CancelFlag::new();
                    *current.lock().unwrap_or_else(|p| p.into_inner()) = cancel.clone();

                    let snapshot = config.snapshot();
                    let summary = scanner.run(&snapshot, progress.as_ref(), &cancel).await;
                    if summary.cancelled {
                        log::info!("Folder scan cancelled after {} files", summary.processed);
                    }
                }
            });
        }))
    }

    /// Cancels the running scan, if any, and queues a new one.
    pub fn trigger(&self) {
        self.cancel_current();
        let _ = self.trigger_tx.send(());
    }

    /// Signals the scheduler to stop. The running scan is cancelled.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.cancel_current();
        // Wake the loop so it sees the shutdown
        let _ = self.trigger_tx.send(());
    }

    fn cancel_current(&self) {
        self.current
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .cancel();
    }
}
