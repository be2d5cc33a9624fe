//! Brute-force master-key recovery.

pub mod engine;
pub mod keyspace;

pub use engine::{
    default_worker_count, probe_block, probe_matches, DisplayCounter, KeySearch, SearchConfig,
    SearchEvent, SearchStatus, DEFAULT_BATCH_SIZE, DEFAULT_SIGNATURE, PROBE_SIZE,
};
pub use keyspace::{
    counter_to_key, counter_to_key_bytes, key_to_counter, keyspace_size, KeyOdometer,
    SEARCH_ALPHABET,
};
