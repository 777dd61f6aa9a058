//! Background Tasks Module
//!
//! Contains background tasks that run periodically for the lifetime of a
//! cache session.
//!
//! # Tasks
//! - Sweep: Removes expired cache entries at configured intervals

mod sweep;

pub use sweep::{spawn_sweep_task, SweepHandle};
