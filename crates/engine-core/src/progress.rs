//! Counter of confirmed documents, optionally rendered as a terminal bar.
//!
//! [`ProgressCounter`] is the single writer and is not `Clone`; it is moved
//! into the stage that confirms documents. Anyone else observes the count
//! through a [`ProgressHandle`].

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})";

/// Whether progress output should be drawn at all.
pub fn stdout_is_terminal() -> bool {
    console::Term::stdout().is_term()
}

#[derive(Debug)]
pub struct ProgressCounter {
    confirmed: Arc<AtomicU64>,
    bar: Option<ProgressBar>,
}

/// Read-only view of a [`ProgressCounter`].
#[derive(Debug, Clone)]
pub struct ProgressHandle {
    confirmed: Arc<AtomicU64>,
}

impl ProgressCounter {
    /// A counter without any rendering.
    pub fn hidden() -> Self {
        ProgressCounter {
            confirmed: Arc::new(AtomicU64::new(0)),
            bar: None,
        }
    }

    /// A counter drawing a bar sized to `total`, or a spinner when the total
    /// is unknown.
    pub fn with_bar(total: Option<u64>) -> Self {
        let bar = match total {
            Some(total) if total > 0 => ProgressBar::new(total),
            _ => ProgressBar::new_spinner(),
        };
        bar.set_style(
            ProgressStyle::default_bar()
                .template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        ProgressCounter {
            confirmed: Arc::new(AtomicU64::new(0)),
            bar: Some(bar),
        }
    }

    /// Draws a bar only when stdout is an interactive terminal.
    pub fn for_terminal(total: Option<u64>) -> Self {
        if stdout_is_terminal() {
            Self::with_bar(total)
        } else {
            Self::hidden()
        }
    }

    pub fn handle(&self) -> ProgressHandle {
        ProgressHandle {
            confirmed: Arc::clone(&self.confirmed),
        }
    }

    pub fn inc(&mut self, n: u64) {
        self.confirmed.fetch_add(n, Ordering::Relaxed);
        if let Some(bar) = &self.bar {
            bar.inc(n);
        }
    }

    /// Stops rendering and returns the final count.
    pub fn finish(mut self) -> u64 {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
        self.confirmed.load(Ordering::Relaxed)
    }
}

impl Drop for ProgressCounter {
    fn drop(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.abandon();
        }
    }
}

impl ProgressHandle {
    pub fn confirmed(&self) -> u64 {
        self.confirmed.load(Ordering::Relaxed)
    }
}
