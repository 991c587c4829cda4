//! Terminal rendering of pipeline progress and streamed answers

use indicatif::{ProgressBar, ProgressStyle};
use scout_core::{ProgressEvent, ProgressStatus, StreamCallback, StreamToken};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

/// Spinner that follows the pipeline's progress events
#[derive(Clone)]
pub struct ProgressDisplay {
    bar: ProgressBar,
}

impl ProgressDisplay {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
        {
            bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
        }
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }

    pub fn update(&self, event: &ProgressEvent) {
        match event.status() {
            ProgressStatus::Idle => self.bar.finish_and_clear(),
            ProgressStatus::RequestTimeout => {
                let message = event.message().unwrap_or("Request timed out");
                self.bar.suspend(|| eprintln!("⚠️  {}", message));
            }
            status => {
                let message = event.message().unwrap_or_default();
                match event.progress() {
                    Some(fraction) => self.bar.set_message(format!(
                        "{:<16} {:>3.0}% {}",
                        status.as_str(),
                        fraction * 100.0,
                        message
                    )),
                    None => self
                        .bar
                        .set_message(format!("{:<16}      {}", status.as_str(), message)),
                }
            }
        }
    }

    /// Callback printing streamed tokens to stdout above the spinner
    pub fn token_printer(&self) -> StreamCallback {
        let bar = self.bar.clone();
        Arc::new(move |token: StreamToken| {
            bar.suspend(|| {
                let mut stdout = std::io::stdout();
                match token {
                    StreamToken::Delta(text) => {
                        let _ = write!(stdout, "{}", text);
                    }
                    StreamToken::End => {
                        let _ = writeln!(stdout);
                    }
                }
                let _ = stdout.flush();
            })
        })
    }
}
