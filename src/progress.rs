//! Progress events for long harvest runs.
//!
//! The engine reports through [`ProgressSink`]; nothing it decides depends on
//! what the sink does. [`TerminalProgress`] renders `indicatif` bars,
//! [`NoProgress`] drops everything (tests, `--no-progress`, non-TTY output).

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

const BAR_TEMPLATE: &str = "{msg:<20} {bar:40.cyan/blue} {pos}/{len} {unit}";

/// Receiver for harvest progress events. All methods default to no-ops.
pub trait ProgressSink: Send + Sync {
    /// Page `index` (1-based) of `total` was downloaded.
    fn page_fetched(&self, _index: usize, _total: usize) {}

    /// Page `index` (1-based) of `total` was parsed.
    fn page_parsed(&self, _index: usize, _total: usize) {}

    /// Attempt `attempt` of `max_attempts` at `offset` timed out; another attempt follows.
    fn retrying(&self, _offset: usize, _attempt: u32, _max_attempts: u32) {}
}

/// Sink that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// Two progress bars: one for downloads, one for parsing.
#[derive(Debug)]
pub struct TerminalProgress {
    // Keeps the bars' shared draw target alive.
    _multi: MultiProgress,
    download: ProgressBar,
    parse: ProgressBar,
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalProgress {
    #[must_use]
    pub fn new() -> Self {
        let multi = MultiProgress::new();
        let download = multi.add(styled_bar("Downloading records", "batches"));
        let parse = multi.add(styled_bar("Parsing XML", "chunks"));
        Self {
            _multi: multi,
            download,
            parse,
        }
    }
}

fn styled_bar(label: &'static str, unit: &'static str) -> ProgressBar {
    let bar = ProgressBar::new(0);
    let template = BAR_TEMPLATE.replace("{unit}", unit);
    bar.set_style(
        ProgressStyle::with_template(&template).unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.set_message(label);
    bar
}

fn advance(bar: &ProgressBar, index: usize, total: usize) {
    let total = u64::try_from(total).unwrap_or(u64::MAX);
    let index = u64::try_from(index).unwrap_or(u64::MAX);
    bar.set_length(total);
    bar.set_position(index);
    if index >= total {
        bar.finish();
    }
}

impl ProgressSink for TerminalProgress {
    fn page_fetched(&self, index: usize, total: usize) {
        advance(&self.download, index, total);
    }

    fn page_parsed(&self, index: usize, total: usize) {
        advance(&self.parse, index, total);
    }

    fn retrying(&self, offset: usize, attempt: u32, max_attempts: u32) {
        self.download
            .println(format!("Timeout on batch {offset}, attempt {attempt}/{max_attempts}"));
    }
}
