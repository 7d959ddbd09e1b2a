//! Ephemeral upload storage
//!
//! Uploaded PDFs are kept under one upload directory and tracked by an
//! in-memory registry that survives restarts through a JSON snapshot.
//! Entries are short-lived: callers delete them when done, a background
//! reaper evicts them by age, and lookups evict entries whose backing
//! file has disappeared.

pub mod admission;
pub mod index;
pub mod registry;
pub mod types;

pub use admission::AdmissionGate;
pub use registry::FileRegistry;
pub use types::*;
