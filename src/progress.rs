use std::sync::Arc;

use crate::attr::Attr;
use crate::error::Error;

/// Receives the progress in percent. Returning `false` aborts the operation
/// with [`Error::Aborted`].
pub type ProgressCallback = Arc<dyn Fn(f32) -> bool + Send + Sync>;

/// Receives human-readable diagnostic messages
pub type LogCallback = Arc<dyn Fn(&Attr, &str) + Send + Sync>;

/// Reports a slice `[start, end]` of the overall progress.
///
/// The callback is only invoked when the integer percentage changes, so
/// tight loops can call [`Phase::step`] on every iteration.
pub(crate) struct Phase<'a> {
    callback: Option<&'a ProgressCallback>,
    start: f32,
    end: f32,
    last: i32,
}

impl<'a> Phase<'a> {
    pub(crate) fn new(callback: Option<&'a ProgressCallback>, start: f32, end: f32) -> Self {
        Self {
            callback,
            start,
            end,
            last: -1,
        }
    }

    pub(crate) fn step(&mut self, done: usize, total: usize) -> Result<(), Error> {
        let Some(callback) = self.callback else {
            return Ok(());
        };

        let frac = if total == 0 { 1.0 } else { (done as f32 / total as f32).min(1.0) };
        let percent = self.start + (self.end - self.start) * frac;

        if percent as i32 == self.last {
            return Ok(());
        }
        self.last = percent as i32;

        if callback(percent.clamp(0.0, 100.0)) {
            Ok(())
        } else {
            Err(Error::Aborted)
        }
    }

    pub(crate) fn finish(&mut self) -> Result<(), Error> {
        self.step(1, 1)
    }
}
