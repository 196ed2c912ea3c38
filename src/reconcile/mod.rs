//! Browser-driven page reconciliation
//!
//! - `targets`: locator chains for the new-item button, title and body
//! - `render`: title/body text and truncation
//! - `engine`: the per-note create-or-update state machine
//! - `replicator`: `UiReplicator`, one browser session per pass

pub mod engine;
pub mod render;
pub mod replicator;
pub mod targets;

pub use engine::{
    ensure_logged_in, is_login_url, PageReconciler, ReconcileSettings, ReconcileStep, UiTimings,
};
pub use render::{render_body, render_title, render_update_block, truncate_chars};
pub use replicator::UiReplicator;
