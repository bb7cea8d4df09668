//! Progress rendering on stderr.

use std::io::IsTerminal;

use pinget_core::progress::{format_sample, LogProgress, ProgressSample, ProgressSink};

/// Prints each sample as one stderr line (`label: done / total (pct%)`).
#[derive(Debug, Default)]
pub struct StderrProgress;

impl ProgressSink for StderrProgress {
    fn report(&mut self, sample: &ProgressSample) {
        eprintln!("{}", format_sample(sample));
    }
}

/// Stderr lines on a terminal; debug log events when stderr is redirected.
pub fn sink() -> Box<dyn ProgressSink> {
    sink_for(std::io::stderr().is_terminal())
}

fn sink_for(interactive: bool) -> Box<dyn ProgressSink> {
    if interactive {
        Box::new(StderrProgress)
    } else {
        Box::new(LogProgress)
    }
}
