use std::sync::Mutex;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use starlens::CollectProgress;

/// Interactive progress reporter using indicatif.
pub struct InteractiveReporter {
    multi: MultiProgress,
    bar: Mutex<Option<ProgressBar>>,
}

impl InteractiveReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bar: Mutex::new(None),
        }
    }

    pub fn handle(&self, event: CollectProgress) {
        let mut bar = self.bar.lock().unwrap_or_else(|e| e.into_inner());

        match event {
            CollectProgress::Started {
                target_count,
                page_size,
            } => {
                let pb = self.multi.add(ProgressBar::new(target_count as u64));
                pb.set_style(Self::bar_style());
                pb.set_prefix(format!("{:12}", "collect"));
                pb.set_message(format!("{} per page", page_size));
                pb.enable_steady_tick(Duration::from_millis(100));
                *bar = Some(pb);
            }

            CollectProgress::FetchingPage { page, page_size } => {
                if let Some(ref pb) = *bar {
                    pb.set_message(format!("Fetching {} repositories for page {}", page_size, page));
                }
            }

            CollectProgress::FetchedPage {
                page, total_so_far, ..
            } => {
                if let Some(ref pb) = *bar {
                    pb.set_position(total_so_far as u64);
                    pb.set_message(format!("page {} done", page));
                }
            }

            CollectProgress::RetryBackoff {
                page,
                attempt,
                max_retries,
                delay,
                error,
            } => {
                if let Some(ref pb) = *bar {
                    pb.set_message(format!(
                        "⏳ page {} failed ({}), retry {}/{} in {:.1}s",
                        page,
                        error,
                        attempt,
                        max_retries,
                        delay.as_secs_f64()
                    ));
                }
            }

            CollectProgress::Warning { message } => {
                let _ = self.multi.println(format!("⚠ {}", message));
            }

            CollectProgress::Complete { total } => {
                if let Some(pb) = bar.take() {
                    pb.set_length(total as u64);
                    pb.set_position(total as u64);
                    pb.finish_with_message(format!("✓ {} repositories", total));
                }
            }
        }
    }

    /// Finish and clear a bar left behind by an aborted run.
    pub fn finish(&self) {
        let mut bar = self.bar.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pb) = bar.take() {
            pb.abandon();
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos:>4}/{len:4} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░")
    }
}

impl Default for InteractiveReporter {
    fn default() -> Self {
        Self::new()
    }
}
