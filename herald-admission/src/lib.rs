//! Idempotent admission for outbound messages
//!
//! A message is admitted at most once per time window. The window is held as
//! a claim in an [`AdmissionStore`], keyed by the message [`fingerprint`], and
//! the store's atomic set-if-absent is the only mutual exclusion involved.

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod gate;
pub mod store;

pub use config::AdmissionConfig;
pub use error::{AdmissionError, Result};
pub use fingerprint::fingerprint;
pub use gate::AdmissionGate;
#[cfg(feature = "redis")]
pub use store::RedisAdmissionStore;
pub use store::{AdmissionStore, MemoryAdmissionStore, TestAdmissionStore};
