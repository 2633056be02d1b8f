//! Hookmill - a GitHub webhook receiver.
//!
//! Hookmill accepts signed webhook deliveries, verifies their HMAC-SHA1
//! signatures, archives each delivery to a deterministic on-disk layout, and
//! dispatches to per-event-type handlers. Handler failures are logged and
//! absorbed so one bad delivery never takes down the receiver.

pub mod config;
pub mod events;
pub mod logfile;
pub mod server;
