//! Overall completion of one file's extraction as a single 0–100 value.
//!
//! Page-level and OCR-level updates are mapped onto one scale and pushed to a
//! [`ProgressSink`]. Reported values never decrease within a session, and a
//! session that finishes successfully always ends on exactly 100.

use std::sync::mpsc::Sender;

/// Receiver of progress percentages.
pub trait ProgressSink {
    fn report(&mut self, percent: u8);
}

impl<F: FnMut(u8)> ProgressSink for F {
    fn report(&mut self, percent: u8) {
        self(percent)
    }
}

impl ProgressSink for Sender<u8> {
    fn report(&mut self, percent: u8) {
        // A dropped receiver only means nobody is watching anymore.
        let _ = self.send(percent);
    }
}

pub struct ProgressTracker<'a> {
    sink: &'a mut dyn ProgressSink,
    last: Option<u8>,
    halted: bool,
}

impl<'a> ProgressTracker<'a> {
    /// Start a session at 0%.
    pub fn new(sink: &'a mut dyn ProgressSink) -> Self {
        let mut tracker = ProgressTracker {
            sink,
            last: None,
            halted: false,
        };
        tracker.emit(0);
        tracker
    }

    /// Page `page` (1-based) of `total` has been fully processed.
    pub fn page_completed(&mut self, page: usize, total: usize) {
        self.emit(page_fraction(page as f64, total));
    }

    /// Recognition of page `page` (1-based) of `total` reached `fraction`.
    pub fn ocr_progress(&mut self, page: usize, total: usize, fraction: f32) {
        let fraction = f64::from(fraction.clamp(0.0, 1.0));
        self.emit(page_fraction(fraction + page.saturating_sub(1) as f64, total));
    }

    pub fn complete(&mut self) {
        self.emit(100);
    }

    /// Stop reporting for the rest of the session.
    pub fn halt(&mut self) {
        self.halted = true;
    }

    pub fn current(&self) -> u8 {
        self.last.unwrap_or(0)
    }

    fn emit(&mut self, percent: u8) {
        if self.halted {
            return;
        }
        let percent = percent.min(100);
        match self.last {
            Some(last) if percent <= last => {}
            _ => {
                self.last = Some(percent);
                self.sink.report(percent);
            }
        }
    }
}

/// `round(done / total * 100)`, with an empty document counting as done.
fn page_fraction(done: f64, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done / total as f64) * 100.0).round().clamp(0.0, 100.0) as u8
}
