//! Pass orchestration
//!
//! - `runner`: one load → diff → replicate → save pass
//! - `scheduler`: single pass or watch mode

pub mod runner;
pub mod scheduler;

pub use runner::{PassRunner, SyncRunner};
pub use scheduler::{Scheduler, WatchStats};
