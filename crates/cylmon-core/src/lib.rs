//! Position monitoring for pneumatic cylinders.
//!
//! Each cylinder carries two binary proximity sensors. [`session`] polls both
//! sensor histories, [`reconcile`] folds them into one position series and
//! [`window`] keeps the most recent points. [`status`] polls the service's
//! own per-cylinder label. [`monitor::Monitor`] ties it all together.

pub mod config;
pub mod error;
pub mod event;
pub mod monitor;
pub(crate) mod poll;
pub mod reconcile;
pub mod session;
pub mod source;
pub mod status;
pub mod timestamp;
pub mod types;
pub mod window;

#[cfg(test)]
mod testing;

pub use error::{MonitorError, Result};
pub use monitor::{ActuatorSnapshot, Monitor};
