//! Terminal progress for `sort` and `hash`
//!
//! Core reports [`ProgressUpdate`](anisort_core::ProgressUpdate)s through a
//! [`ChannelProvider`]; a renderer task drains the channel and draws them.

pub mod format;
pub mod provider;
pub mod renderer;

pub use format::{format_bytes, format_duration};
pub use provider::{ChannelProvider, progress_channel};
pub use renderer::{ProgressRenderer, render_progress};
