//! Concurrent brute-force key search.
//!
//! A coordinator thread hands out disjoint counter ranges to worker threads;
//! workers test one candidate per counter against a 16-byte probe block cut
//! from an encrypted manifest body and report back per batch. All
//! communication is message passing; workers share no mutable state.
//!
//! Lifecycle: `Idle → Running → {Found, Stopped}`. A stopped search can be
//! resumed: workers restart at fresh offsets derived from the total tried so
//! far, which does not guarantee gap-free or duplicate-free coverage across
//! runs — a known limitation, accepted because an exhaustive sweep of 62^32
//! keys is unreachable anyway.

use crate::cipher::Cfb8;
use crate::error::{PacklockError, Result};
use crate::key::KEY_LENGTH;
use crate::manifest::HEADER_SIZE;
use crate::search::keyspace::KeyOdometer;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// First cipher block of the manifest body, offset [256, 272).
pub const PROBE_SIZE: usize = 16;

/// Plaintext bytes expected at the start of a decrypted manifest body:
/// `{"co` of `{"content":[...]}`.
pub const DEFAULT_SIGNATURE: [u8; SIGNATURE_SIZE] = *b"{\"co";

pub const SIGNATURE_SIZE: usize = 4;

pub const DEFAULT_BATCH_SIZE: u64 = 1000;

/// Worker count from the platform concurrency hint, falling back to 8.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(8)
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub workers: usize,
    /// Keys per worker assignment.
    pub batch_size: u64,
    /// Expected plaintext prefix of the probe block. Configurable so the
    /// check can be verified against the real manifest format instead of
    /// trusted blindly.
    pub signature: [u8; SIGNATURE_SIZE],
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            workers: default_worker_count(),
            batch_size: DEFAULT_BATCH_SIZE,
            signature: DEFAULT_SIGNATURE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStatus {
    Idle,
    Running,
    /// Terminal for this search; carries the recovered key.
    Found(String),
    Stopped,
}

/// Events surfaced to the embedding UI.
#[derive(Debug, Clone)]
pub enum SearchEvent {
    Progress { tried: u64, last_key: String },
    Found { key: String },
}

enum WorkerReport {
    Batch {
        worker: usize,
        tried: u64,
        last_key: String,
    },
    Found {
        key: String,
    },
}

struct Assignment {
    start: BigUint,
    len: u64,
}

/// Cut the probe block out of raw manifest file bytes.
pub fn probe_block(manifest_bytes: &[u8]) -> Result<[u8; PROBE_SIZE]> {
    if manifest_bytes.len() < HEADER_SIZE + PROBE_SIZE {
        return Err(PacklockError::InvalidFormat(format!(
            "manifest is {} bytes, need at least {} for a probe block",
            manifest_bytes.len(),
            HEADER_SIZE + PROBE_SIZE
        )));
    }
    let mut probe = [0u8; PROBE_SIZE];
    probe.copy_from_slice(&manifest_bytes[HEADER_SIZE..HEADER_SIZE + PROBE_SIZE]);
    Ok(probe)
}

/// Does this candidate key decrypt the probe prefix to the signature?
///
/// Nothing here can fail per-key; a candidate that decrypts to garbage is
/// simply a non-match.
pub fn probe_matches(
    key: &[u8; KEY_LENGTH],
    probe: &[u8; PROBE_SIZE],
    signature: &[u8; SIGNATURE_SIZE],
) -> bool {
    let mut stream = Cfb8::from_raw_key(key);
    signature
        .iter()
        .zip(probe.iter())
        .all(|(&want, &c)| stream.decrypt_byte(c) == want)
}

struct RunHandle {
    events: Receiver<SearchEvent>,
    stop: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
}

/// Coordinator-owned search state. The embedding layer holds one of these
/// and polls it; it never touches worker state directly.
pub struct KeySearch {
    probe: [u8; PROBE_SIZE],
    config: SearchConfig,
    status: SearchStatus,
    total_tried: BigUint,
    last_key: String,
    display: DisplayCounter,
    run: Option<RunHandle>,
}

impl KeySearch {
    pub fn new(probe: [u8; PROBE_SIZE], config: SearchConfig) -> Self {
        Self {
            probe,
            config,
            status: SearchStatus::Idle,
            total_tried: BigUint::zero(),
            last_key: String::new(),
            display: DisplayCounter::new(),
            run: None,
        }
    }

    pub fn status(&self) -> &SearchStatus {
        &self.status
    }

    pub fn total_tried(&self) -> &BigUint {
        &self.total_tried
    }

    pub fn last_key(&self) -> &str {
        &self.last_key
    }

    pub fn found_key(&self) -> Option<&str> {
        match &self.status {
            SearchStatus::Found(key) => Some(key),
            _ => None,
        }
    }

    /// Smoothed tried-count for display. Converges toward the true total a
    /// step per call; cosmetic only.
    pub fn displayed_tried(&mut self) -> f64 {
        self.display.tick(&self.total_tried)
    }

    /// Launch (or resume) the search. A resumed run starts workers at
    /// offsets derived from the running total. No-op while already running
    /// or after the key has been found.
    pub fn start(&mut self) {
        match self.status {
            SearchStatus::Running | SearchStatus::Found(_) => return,
            SearchStatus::Idle | SearchStatus::Stopped => {}
        }

        let workers = self.config.workers.max(1);
        let batch = self.config.batch_size.max(1);
        let stop = Arc::new(AtomicBool::new(false));
        let (report_tx, report_rx) = unbounded::<WorkerReport>();
        let (event_tx, event_rx) = unbounded::<SearchEvent>();

        let mut next_offset = self.total_tried.clone();
        let mut threads = Vec::with_capacity(workers + 1);
        let mut assigners = Vec::with_capacity(workers);

        for worker in 0..workers {
            let (assign_tx, assign_rx) = unbounded::<Assignment>();
            // seed the first batch so the worker has something to chew on
            let _ = assign_tx.send(Assignment {
                start: next_offset.clone(),
                len: batch,
            });
            next_offset += batch;
            assigners.push(assign_tx);

            let probe = self.probe;
            let signature = self.config.signature;
            let reports = report_tx.clone();
            let stop = Arc::clone(&stop);
            threads.push(std::thread::spawn(move || {
                worker_loop(worker, probe, signature, assign_rx, reports, stop);
            }));
        }
        drop(report_tx);

        {
            let stop = Arc::clone(&stop);
            threads.push(std::thread::spawn(move || {
                coordinator_loop(report_rx, assigners, event_tx, stop, next_offset, batch);
            }));
        }

        self.run = Some(RunHandle {
            events: event_rx,
            stop,
            threads,
        });
        self.status = SearchStatus::Running;
    }

    /// Drain pending events into the aggregate state. A found key takes
    /// priority over any progress still in flight and terminates the run.
    pub fn poll(&mut self) {
        let Some(run) = &self.run else { return };

        let mut found: Option<String> = None;
        for event in run.events.try_iter() {
            match event {
                SearchEvent::Progress { tried, last_key } => {
                    self.total_tried += tried;
                    self.last_key = last_key;
                }
                SearchEvent::Found { key } => {
                    found = Some(key);
                    break;
                }
            }
        }

        if let Some(key) = found {
            self.shutdown();
            self.status = SearchStatus::Found(key);
        }
    }

    /// Abrupt stop: signal every worker, discard in-flight batches, join.
    pub fn stop(&mut self) {
        if self.run.is_none() {
            return;
        }
        self.poll();
        if let SearchStatus::Found(_) = self.status {
            return;
        }
        self.shutdown();
        self.status = SearchStatus::Stopped;
    }

    fn shutdown(&mut self) {
        let Some(run) = self.run.take() else { return };
        run.stop.store(true, Ordering::Relaxed);
        for thread in run.threads {
            let _ = thread.join();
        }
        // account for batches completed between the last poll and shutdown
        for event in run.events.try_iter() {
            if let SearchEvent::Progress { tried, last_key } = event {
                self.total_tried += tried;
                self.last_key = last_key;
            }
        }
    }
}

impl Drop for KeySearch {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(
    worker: usize,
    probe: [u8; PROBE_SIZE],
    signature: [u8; SIGNATURE_SIZE],
    assignments: Receiver<Assignment>,
    reports: Sender<WorkerReport>,
    stop: Arc<AtomicBool>,
) {
    // Blocks between assignments; exits when the coordinator drops the
    // assignment channel or raises the stop flag mid-batch.
    for assignment in assignments.iter() {
        let Some(mut odometer) = KeyOdometer::new(&assignment.start) else {
            // keyspace exhausted
            return;
        };
        let mut tried = 0u64;
        let mut in_range = true;
        while in_range && tried < assignment.len {
            if stop.load(Ordering::Relaxed) {
                return;
            }
            if probe_matches(odometer.key_bytes(), &probe, &signature) {
                let _ = reports.send(WorkerReport::Found {
                    key: odometer.key(),
                });
                return;
            }
            tried += 1;
            in_range = odometer.advance();
        }
        let report = WorkerReport::Batch {
            worker,
            tried,
            last_key: odometer.key(),
        };
        if reports.send(report).is_err() {
            return;
        }
    }
}

fn coordinator_loop(
    reports: Receiver<WorkerReport>,
    assigners: Vec<Sender<Assignment>>,
    events: Sender<SearchEvent>,
    stop: Arc<AtomicBool>,
    mut next_offset: BigUint,
    batch: u64,
) {
    loop {
        match reports.recv_timeout(Duration::from_millis(100)) {
            Ok(WorkerReport::Found { key }) => {
                stop.store(true, Ordering::Relaxed);
                let _ = events.send(SearchEvent::Found { key });
                // dropping `assigners` disconnects every idle worker
                return;
            }
            Ok(WorkerReport::Batch {
                worker,
                tried,
                last_key,
            }) => {
                let _ = events.send(SearchEvent::Progress { tried, last_key });
                if let Some(tx) = assigners.get(worker) {
                    let assignment = Assignment {
                        start: next_offset.clone(),
                        len: batch,
                    };
                    if tx.send(assignment).is_ok() {
                        next_offset += batch;
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if stop.load(Ordering::Relaxed) {
                    return;
                }
            }
            Err(RecvTimeoutError::Disconnected) => return,
        }
    }
}

/// Cosmetic throughput display: drifts toward the true total instead of
/// jumping, so a UI counter animates smoothly. Never read back into search
/// logic.
pub struct DisplayCounter {
    shown: f64,
}

impl DisplayCounter {
    pub fn new() -> Self {
        Self { shown: 0.0 }
    }

    pub fn tick(&mut self, target: &BigUint) -> f64 {
        let target = target.to_f64().unwrap_or(f64::MAX);
        self.shown += (target - self.shown) * 0.2;
        self.shown
    }
}

impl Default for DisplayCounter {
    fn default() -> Self {
        Self::new()
    }
}
