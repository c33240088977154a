//! Progress reporting surface.
//!
//! The orchestration invokes a single typed sink at defined points: after
//! every captured tile and once at completion or failure. Calls are
//! synchronous on the orchestration task, so event order is deterministic;
//! the sink must not block. Nothing the sink does affects control flow.

use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Receives progress notifications from a capture run.
///
/// Fire-and-forget: no return value is consumed and no backpressure is
/// applied. Implementations that need to hand events to another thread
/// should use [`ChannelProgress`].
pub trait ProgressSink: Send + Sync {
    /// Called after each successfully captured tile and at milestones.
    ///
    /// `fraction` is `current / total` in `[0, 1]`.
    fn on_progress(&self, status: &str, fraction: f32, current: usize, total: usize);

    /// Called exactly once, when the run ends.
    ///
    /// `output_path` is the written image on success, `None` otherwise.
    fn on_complete(&self, success: bool, output_path: Option<&Path>);
}

/// Sink that discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn on_progress(&self, _status: &str, _fraction: f32, _current: usize, _total: usize) {}
    fn on_complete(&self, _success: bool, _output_path: Option<&Path>) {}
}

/// Arc-wrapped sinks are sinks themselves, so one sink can be shared
/// between the run and the caller's own bookkeeping.
impl<T: ProgressSink + ?Sized> ProgressSink for Arc<T> {
    fn on_progress(&self, status: &str, fraction: f32, current: usize, total: usize) {
        (**self).on_progress(status, fraction, current, total);
    }

    fn on_complete(&self, success: bool, output_path: Option<&Path>) {
        (**self).on_complete(success, output_path);
    }
}

/// A progress event as carried by [`ChannelProgress`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Progress {
        status: String,
        fraction: f32,
        current: usize,
        total: usize,
    },
    Complete {
        success: bool,
        output_path: Option<std::path::PathBuf>,
    },
}

/// Sink that forwards events over an unbounded channel.
///
/// Useful when the consumer lives on another task (a UI loop, a test
/// asserting event order). Send failures are ignored: a dropped receiver
/// must not disturb the run.
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgress {
    /// Creates the sink and the receiving half.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelProgress {
    fn on_progress(&self, status: &str, fraction: f32, current: usize, total: usize) {
        let _ = self.tx.send(ProgressEvent::Progress {
            status: status.to_string(),
            fraction,
            current,
            total,
        });
    }

    fn on_complete(&self, success: bool, output_path: Option<&Path>) {
        let _ = self.tx.send(ProgressEvent::Complete {
            success,
            output_path: output_path.map(|p| p.to_path_buf()),
        });
    }
}
