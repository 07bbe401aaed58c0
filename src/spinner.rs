//! "Thinking" indicator shown while the backend call is in flight.
//!
//! The indicator runs as its own tokio task and owns the current terminal
//! line until [`ProgressIndicator::stop`] returns. `stop` consumes the
//! indicator and awaits the task, so the line is erased before the caller
//! can print anything else.

use colored::Colorize;
use crossterm::cursor::MoveToColumn;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use rand::seq::SliceRandom;
use std::io::{self, Write};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Animation frames, cycled once per tick
pub const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Delay between frames
pub const TICK: Duration = Duration::from_millis(100);

/// Flavor texts, one picked per run
pub const FLAVOR_TEXTS: [&str; 5] = [
    "Scanning for brain cells...",
    "Locating the skill issue...",
    "Reading the docs (so you don't have to)...",
    "Consulting the Elder Gods...",
    "Mogging the compiler...",
];

/// Pick a flavor text at random
pub fn random_flavor() -> &'static str {
    FLAVOR_TEXTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FLAVOR_TEXTS[0])
}

/// A running indicator. Call [`stop`](Self::stop) before printing.
pub struct ProgressIndicator {
    stop_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ProgressIndicator {
    /// Indicator that draws nothing, for non-terminal or quiet runs
    pub fn disabled() -> Self {
        Self {
            stop_tx: None,
            handle: None,
        }
    }

    /// Spawn the animation task writing to `writer`
    pub fn start<W>(writer: W, label: &str) -> Self
    where
        W: Write + Send + 'static,
    {
        let (stop_tx, stop_rx) = oneshot::channel();
        let label = label.to_string();
        let handle = tokio::spawn(animate(writer, label, stop_rx));

        Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    /// Start on stdout with a random flavor text
    pub fn stdout() -> Self {
        Self::start(io::stdout(), random_flavor())
    }

    /// Signal the task and wait until it has erased its line and exited
    pub async fn stop(mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            // The task may already be gone; that is fine
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                tracing::warn!(error = %err, "progress indicator task failed");
            }
        }
    }
}

async fn animate<W: Write>(mut writer: W, label: String, mut stop_rx: oneshot::Receiver<()>) {
    let mut ticker = tokio::time::interval(TICK);
    let mut frames = FRAMES.iter().cycle();

    loop {
        tokio::select! {
            // A dropped sender counts as a stop too
            _ = &mut stop_rx => break,
            _ = ticker.tick() => {
                let frame = frames.next().copied().unwrap_or(FRAMES[0]);
                let line = format!("{frame} {label} ").yellow();
                if draw(&mut writer, &line.to_string()).is_err() {
                    break;
                }
            }
        }
    }

    if let Err(err) = erase(&mut writer) {
        tracing::debug!(error = %err, "failed to clear progress line");
    }
}

fn draw<W: Write>(writer: &mut W, line: &str) -> io::Result<()> {
    write!(writer, "\r{line}")?;
    writer.flush()
}

fn erase<W: Write>(writer: &mut W) -> io::Result<()> {
    queue!(writer, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    /// Writer that records everything into a shared buffer
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> Vec<u8> {
            self.0.lock().unwrap().clone()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn clear_sequence() -> Vec<u8> {
        let mut expected = Vec::new();
        erase(&mut expected).unwrap();
        expected
    }

    #[test]
    fn test_random_flavor_is_known() {
        let flavor = random_flavor();
        assert!(FLAVOR_TEXTS.contains(&flavor));
    }

    #[tokio::test]
    async fn test_stop_clears_line_before_returning() {
        let buffer = SharedBuffer::default();
        let indicator = ProgressIndicator::start(buffer.clone(), "Thinking...");

        tokio::time::sleep(Duration::from_millis(250)).await;
        indicator.stop().await;

        let written = buffer.contents();
        let text = String::from_utf8_lossy(&written);
        assert!(text.contains("Thinking..."));
        assert!(FRAMES.iter().any(|frame| text.contains(frame)));
        assert!(written.ends_with(&clear_sequence()));
    }

    #[tokio::test]
    async fn test_nothing_written_after_stop() {
        let buffer = SharedBuffer::default();
        let indicator = ProgressIndicator::start(buffer.clone(), "Thinking...");
        tokio::time::sleep(Duration::from_millis(150)).await;
        indicator.stop().await;

        let after_stop = buffer.contents();
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(buffer.contents(), after_stop);
    }

    #[tokio::test]
    async fn test_frames_advance() {
        let buffer = SharedBuffer::default();
        let indicator = ProgressIndicator::start(buffer.clone(), "x");
        tokio::time::sleep(Duration::from_millis(350)).await;
        indicator.stop().await;

        let text = String::from_utf8_lossy(&buffer.contents()).into_owned();
        assert!(text.contains(FRAMES[0]));
        assert!(text.contains(FRAMES[1]));
    }

    #[tokio::test]
    async fn test_stop_is_prompt() {
        let buffer = SharedBuffer::default();
        let indicator = ProgressIndicator::start(buffer.clone(), "x");
        tokio::time::sleep(Duration::from_millis(50)).await;

        let started = Instant::now();
        indicator.stop().await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_immediate_stop_still_clears() {
        let buffer = SharedBuffer::default();
        let indicator = ProgressIndicator::start(buffer.clone(), "x");
        indicator.stop().await;
        assert!(buffer.contents().ends_with(&clear_sequence()));
    }

    #[tokio::test]
    async fn test_disabled_indicator_stops() {
        ProgressIndicator::disabled().stop().await;
    }
}
