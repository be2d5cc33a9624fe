use crate::archive::read_archive;
use crate::error::{PacklockError, Result};
use crate::manifest::{header_is_valid, MANIFEST_NAME};
use crate::search::{probe_block, KeySearch, SearchConfig};
use num_bigint::BigUint;
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct RecoverOptions {
    /// Worker threads; platform concurrency hint when absent.
    pub threads: Option<usize>,
    pub batch_size: u64,
    /// Stop after roughly this many keys (useful for bounded runs); the
    /// engine otherwise runs until found or interrupted.
    pub limit: Option<u64>,
}

impl Default for RecoverOptions {
    fn default() -> Self {
        Self {
            threads: None,
            batch_size: crate::search::DEFAULT_BATCH_SIZE,
            limit: None,
        }
    }
}

/// Brute-force a pack's master key from its encrypted manifest.
///
/// `input` is either a pack zip (the shallowest `contents.json` is used) or
/// a raw manifest file. Prints a status line while running. Returns the
/// recovered key, or `None` if a `limit` was set and exhausted first.
pub fn recover_key(input: &Path, options: &RecoverOptions) -> Result<Option<String>> {
    let manifest_bytes = load_manifest_bytes(input)?;
    if !header_is_valid(&manifest_bytes) {
        return Err(PacklockError::InvalidFormat(
            "input does not look like an encrypted contents.json (magic mismatch)".into(),
        ));
    }

    let probe = probe_block(&manifest_bytes)?;
    let config = SearchConfig {
        workers: options
            .threads
            .unwrap_or_else(crate::search::default_worker_count),
        batch_size: options.batch_size,
        ..Default::default()
    };
    let workers = config.workers;
    let mut search = KeySearch::new(probe, config);

    println!("Keyspace: 62^32 | Workers: {}", workers);
    search.start();

    let started = Instant::now();
    let limit = options.limit.map(BigUint::from);
    loop {
        std::thread::sleep(Duration::from_millis(200));
        search.poll();

        if let Some(key) = search.found_key() {
            let key = key.to_string();
            println!("\nKey found: {}", key);
            return Ok(Some(key));
        }

        if let Some(limit) = &limit {
            if search.total_tried() >= limit {
                search.stop();
                println!("\nStopped after {} keys; no match.", search.total_tried());
                return Ok(None);
            }
        }

        let shown = search.displayed_tried();
        let elapsed = started.elapsed().as_secs_f64();
        let speed = if elapsed > 0.0 { shown / elapsed } else { 0.0 };
        print!(
            "\rTried: ~{:.0} | Speed: {:.0}/s | Last: {}    ",
            shown,
            speed,
            search.last_key()
        );
        let _ = std::io::stdout().flush();
    }
}

fn load_manifest_bytes(input: &Path) -> Result<Vec<u8>> {
    let bytes = std::fs::read(input)?;
    match read_archive(&bytes) {
        Ok(entries) => {
            let mut manifests: Vec<_> = entries
                .into_iter()
                .filter(|e| e.path.ends_with(MANIFEST_NAME))
                .collect();
            manifests.sort_by_key(|e| (e.path.matches('/').count(), e.path.len()));
            manifests
                .into_iter()
                .next()
                .map(|e| e.bytes)
                .ok_or(PacklockError::ManifestNotFound)
        }
        // not a zip: treat as a raw contents.json
        Err(_) => Ok(bytes),
    }
}
