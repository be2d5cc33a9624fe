//! Whole-archive transform pipelines.
//!
//! Both directions run as a single pass over an in-memory entry list and
//! report coarse progress through a caller-supplied callback, so a host UI
//! can stay responsive without the pipeline knowing about event loops.

pub mod decrypt;
pub mod encrypt;

pub use decrypt::decrypt_archive;
pub use encrypt::{encrypt_archive, EncryptOptions, EncryptOutcome};
