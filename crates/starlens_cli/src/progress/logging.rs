use starlens::CollectProgress;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: CollectProgress) {
        match event {
            CollectProgress::Started {
                target_count,
                page_size,
            } => {
                tracing::info!(target_count, page_size, "Collecting repositories");
            }

            CollectProgress::FetchingPage { page, page_size } => {
                tracing::info!(page, page_size, "Fetching page");
            }

            CollectProgress::FetchedPage {
                page,
                count,
                total_so_far,
            } => {
                tracing::debug!(page, count, total_so_far, "Fetched page");
            }

            CollectProgress::RetryBackoff {
                page,
                attempt,
                max_retries,
                delay,
                error,
            } => {
                tracing::warn!(
                    page,
                    attempt,
                    max_retries,
                    delay_secs = delay.as_secs_f64(),
                    error = %error,
                    "Retrying page"
                );
            }

            CollectProgress::Warning { message } => {
                tracing::warn!("{}", message);
            }

            CollectProgress::Complete { total } => {
                tracing::info!(total, "Collection complete");
            }
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
