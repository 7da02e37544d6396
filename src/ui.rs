//! Terminal UI: a progress bar over the batch, plus a stderr writer that lets
//! log lines and progress bars share the terminal.

use std::{
    borrow::Cow,
    io::{self, Write as _},
    sync::Arc,
    time::Duration,
};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Application UI state. Cheap to clone.
#[derive(Clone)]
pub struct Ui {
    multi_progress: Arc<MultiProgress>,
}

impl Ui {
    /// Create a new UI drawing to stderr.
    pub fn init() -> Ui {
        Ui {
            multi_progress: Arc::new(MultiProgress::new()),
        }
    }

    /// Create a UI that never draws anything, for unit tests.
    #[cfg(test)]
    pub fn init_for_tests() -> Ui {
        Ui {
            multi_progress: Arc::new(MultiProgress::with_draw_target(
                indicatif::ProgressDrawTarget::hidden(),
            )),
        }
    }

    /// Get a writer for `tracing` output that won't tear our progress bars.
    pub fn get_stderr_writer(&self) -> SafeStderrWriter {
        SafeStderrWriter { ui: self.clone() }
    }

    /// Create a progress bar for `len` items.
    pub fn new_progress_bar(&self, config: &ProgressConfig<'_>, len: u64) -> ProgressBar {
        let pb = self
            .multi_progress
            .add(ProgressBar::new(len).with_style(progress_style()));
        pb.set_prefix(config.emoji.to_owned());
        pb.set_message(config.msg.to_owned());
        pb.enable_steady_tick(Duration::from_millis(250));
        pb.with_finish(indicatif::ProgressFinish::WithMessage(Cow::Owned(
            config.done_msg.to_owned(),
        )))
    }
}

/// Labels for a progress bar.
pub struct ProgressConfig<'a> {
    /// Shown before the bar.
    pub emoji: &'a str,
    /// Shown while running. Replaced by the current document key as we go.
    pub msg: &'a str,
    /// Shown once the bar finishes.
    pub done_msg: &'a str,
}

fn progress_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("  {prefix:3}{msg:30!} {pos:>4}/{len:4} {elapsed_precise} {wide_bar:.cyan/blue}")
        .expect("bad progress bar template")
}

/// Writes to stderr, suspending the progress bars while it does.
#[derive(Clone)]
pub struct SafeStderrWriter {
    ui: Ui,
}

impl io::Write for SafeStderrWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.ui.multi_progress.suspend(|| io::stderr().write(buf))
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.ui.multi_progress.suspend(|| io::stderr().write_all(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.ui.multi_progress.suspend(|| io::stderr().flush())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SafeStderrWriter {
    type Writer = SafeStderrWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
