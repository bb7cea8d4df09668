//! Progress reporting for downloads and extraction.
//!
//! Samples are ephemeral and only meant for display. `ProgressThrottle`
//! keeps reporting coarse (one sample per completed MiB) so the hot write
//! loops stay cheap.

/// Report granularity: one sample per completed mebibyte.
pub const REPORT_INTERVAL_BYTES: u64 = 1024 * 1024;

/// Snapshot of one operation's progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSample {
    /// What is progressing (e.g. "download", "extract").
    pub label: &'static str,
    pub done: u64,
    /// Total bytes, when known.
    pub total: Option<u64>,
}

impl ProgressSample {
    /// Fraction complete in [0.0, 1.0], if the total is known.
    pub fn fraction(&self) -> Option<f64> {
        match self.total {
            Some(0) => Some(1.0),
            Some(total) => Some((self.done as f64 / total as f64).min(1.0)),
            None => None,
        }
    }
}

/// Receives progress samples.
pub trait ProgressSink {
    fn report(&mut self, sample: &ProgressSample);
}

impl<F: FnMut(&ProgressSample)> ProgressSink for F {
    fn report(&mut self, sample: &ProgressSample) {
        self(sample)
    }
}

/// Discards all samples.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _sample: &ProgressSample) {}
}

/// Emits samples as `tracing` debug events.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&mut self, sample: &ProgressSample) {
        tracing::debug!(
            label = sample.label,
            done = sample.done,
            total = ?sample.total,
            "{}",
            format_sample(sample)
        );
    }
}

/// Forwards at most one sample per `REPORT_INTERVAL_BYTES` to the sink.
pub struct ProgressThrottle<'a> {
    sink: &'a mut dyn ProgressSink,
    label: &'static str,
    total: Option<u64>,
    done: u64,
    last_reported: u64,
}

impl<'a> ProgressThrottle<'a> {
    /// Starts at `done` bytes (non-zero when resuming) and reports it once.
    pub fn start(
        sink: &'a mut dyn ProgressSink,
        label: &'static str,
        done: u64,
        total: Option<u64>,
    ) -> Self {
        let mut t = Self {
            sink,
            label,
            total,
            done,
            last_reported: done,
        };
        t.emit();
        t
    }

    /// Updates the total (e.g. from a `Content-Range` header).
    pub fn set_total(&mut self, total: Option<u64>) {
        if total.is_some() {
            self.total = total;
        }
    }

    /// Restarts the count at `done` (e.g. when a server ignores a range).
    pub fn rewind(&mut self, done: u64) {
        self.done = done;
        self.last_reported = done;
    }

    pub fn advance(&mut self, bytes: u64) {
        self.done += bytes;
        if self.done - self.last_reported >= REPORT_INTERVAL_BYTES {
            self.emit();
        }
    }

    /// Reports the final position regardless of the interval.
    pub fn finish(mut self) -> u64 {
        self.emit();
        self.done
    }

    fn emit(&mut self) {
        self.last_reported = self.done;
        self.sink.report(&ProgressSample {
            label: self.label,
            done: self.done,
            total: self.total,
        });
    }
}

/// Human-readable byte count (binary units).
pub fn human_bytes(n: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    if n < 1024 {
        return format!("{} B", n);
    }
    let mut value = n as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// `label: done / total (pct%)`, or `label: done` when the total is unknown.
pub fn format_sample(sample: &ProgressSample) -> String {
    match (sample.total, sample.fraction()) {
        (Some(total), Some(frac)) => format!(
            "{}: {} / {} ({:5.1}%)",
            sample.label,
            human_bytes(sample.done),
            human_bytes(total),
            frac * 100.0
        ),
        _ => format!("{}: {}", sample.label, human_bytes(sample.done)),
    }
}
