//! Structured log events and the sinks that render them.
//!
//! The pipeline never prints. It hands `LogEvent`s to a caller-supplied
//! [`LogSink`] through a [`Reporter`], which carries the minimum severity as
//! a construction parameter. The CLI installs a [`ConsoleSink`]; embedders
//! and tests can install a [`MemorySink`] or their own implementation.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{Arc, Mutex};

/// Event severity, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

/// One log event emitted by the pipeline.
#[derive(Debug, Clone)]
pub struct LogEvent {
    pub severity: Severity,
    pub message: String,
}

/// Receives events and batch-progress callbacks. Rendering policy lives
/// entirely in the sink.
pub trait LogSink: Send + Sync {
    fn emit(&self, event: &LogEvent);

    /// A batch of `total` jobs is about to run.
    fn batch_started(&self, total: usize) {
        let _ = total;
    }

    /// One job of the current batch finished (in any state).
    fn batch_advanced(&self) {}

    /// The current batch is done.
    fn batch_finished(&self) {}
}

/// A shared sink plus a severity threshold. Cloned freely and passed
/// explicitly into the coordinator, every stage driver, and the executor.
#[derive(Clone)]
pub struct Reporter {
    sink: Arc<dyn LogSink>,
    threshold: Severity,
}

impl Reporter {
    pub fn new(sink: Arc<dyn LogSink>, threshold: Severity) -> Self {
        Self { sink, threshold }
    }

    /// A copy of this reporter with the threshold lowered one step.
    /// Hook and export batches run under this so their command lines and
    /// output show up at default verbosity.
    pub fn verbose(&self) -> Self {
        let threshold = match self.threshold {
            Severity::Error => Severity::Warning,
            Severity::Warning => Severity::Info,
            _ => Severity::Debug,
        };
        Self {
            sink: Arc::clone(&self.sink),
            threshold,
        }
    }

    pub fn emit(&self, severity: Severity, message: impl Into<String>) {
        if severity >= self.threshold {
            self.sink.emit(&LogEvent {
                severity,
                message: message.into(),
            });
        }
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.emit(Severity::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(Severity::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.emit(Severity::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(Severity::Error, message);
    }

    pub fn batch_started(&self, total: usize) {
        self.sink.batch_started(total);
    }

    pub fn batch_advanced(&self) {
        self.sink.batch_advanced();
    }

    pub fn batch_finished(&self) {
        self.sink.batch_finished();
    }
}

/// Colored terminal renderer with a progress bar across multi-job batches.
pub struct ConsoleSink {
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for ConsoleSink {
    fn emit(&self, event: &LogEvent) {
        let line = match event.severity {
            Severity::Debug => format!("   {}", event.message.dimmed()),
            Severity::Info => format!("   {}", event.message),
            Severity::Warning => format!("{} {}", "!".yellow(), event.message),
            Severity::Error => format!("{} {}", "x".red(), event.message),
        };
        match self.bar.lock().unwrap().as_ref() {
            Some(pb) => pb.println(line),
            None => println!("{}", line),
        }
    }

    fn batch_started(&self, total: usize) {
        // single-job batches (link, size) don't warrant a bar
        if total < 2 {
            return;
        }
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-");
        let pb = ProgressBar::new(total as u64);
        pb.set_style(style);
        *self.bar.lock().unwrap() = Some(pb);
    }

    fn batch_advanced(&self) {
        if let Some(pb) = self.bar.lock().unwrap().as_ref() {
            pb.inc(1);
        }
    }

    fn batch_finished(&self) {
        if let Some(pb) = self.bar.lock().unwrap().take() {
            pb.finish_and_clear();
        }
    }
}

/// Collecting sink. Lets embedders and tests inspect the event stream
/// instead of rendering it.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<LogEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Messages recorded at exactly `severity`, in emission order.
    pub fn messages_at(&self, severity: Severity) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.severity == severity)
            .map(|e| e.message.clone())
            .collect()
    }
}

impl LogSink for MemorySink {
    fn emit(&self, event: &LogEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_filters_events() {
        let sink = Arc::new(MemorySink::new());
        let reporter = Reporter::new(sink.clone(), Severity::Info);

        reporter.debug("hidden");
        reporter.info("shown");
        reporter.error("also shown");

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].message, "shown");
        assert_eq!(events[1].severity, Severity::Error);
    }

    #[test]
    fn test_verbose_lowers_threshold_one_step() {
        let sink = Arc::new(MemorySink::new());
        let reporter = Reporter::new(sink.clone(), Severity::Info);

        reporter.verbose().debug("hook command line");
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn test_verbose_saturates_at_debug() {
        let sink = Arc::new(MemorySink::new());
        let reporter = Reporter::new(sink.clone(), Severity::Debug);

        reporter.verbose().debug("still visible");
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }
}
