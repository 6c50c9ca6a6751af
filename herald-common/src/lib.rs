//! Types and ambient services shared by every herald crate
//!
//! - [`Message`]: the immutable unit of work handed to the delivery engine
//! - [`logging`]: subscriber initialisation and the `internal!`/`outgoing!` macros
//! - [`audit`]: structured lifecycle events with optional recipient redaction

pub mod audit;
pub mod logging;
pub mod message;

pub use message::Message;
pub use tracing;
