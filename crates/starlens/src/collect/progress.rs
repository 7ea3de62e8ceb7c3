//! Progress reporting types for collection runs.

use std::time::Duration;

/// Progress events emitted while collecting repositories.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectProgress {
    /// A collection run is starting.
    Started {
        /// Number of records requested.
        target_count: usize,
        /// Edges requested per page.
        page_size: usize,
    },

    /// About to request a page.
    FetchingPage {
        /// Page number (1-indexed).
        page: u32,
        /// Edges requested for this page.
        page_size: usize,
    },

    /// A page arrived and its edges were projected.
    FetchedPage {
        /// Page number (1-indexed).
        page: u32,
        /// Number of edges on this page.
        count: usize,
        /// Running total of records kept so far.
        total_so_far: usize,
    },

    /// A page fetch failed with a transient error and will be retried.
    RetryBackoff {
        /// Page being retried.
        page: u32,
        /// Retry number (1-indexed).
        attempt: u32,
        /// Retry budget for the page.
        max_retries: usize,
        /// Delay before the retry.
        delay: Duration,
        /// Short description of the failure.
        error: String,
    },

    /// Something unexpected that does not stop the run.
    Warning { message: String },

    /// Collection finished.
    Complete {
        /// Number of records returned.
        total: usize,
    },
}

/// Callback type for progress reporting.
pub type ProgressCallback = Box<dyn Fn(CollectProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: CollectProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_emit_without_callback_is_noop() {
        emit(None, CollectProgress::Complete { total: 3 });
    }

    #[test]
    fn test_emit_forwards_event() {
        let events: Arc<Mutex<Vec<CollectProgress>>> = Arc::default();
        let capture = Arc::clone(&events);
        let callback: ProgressCallback = Box::new(move |event| {
            capture.lock().unwrap().push(event);
        });

        emit(
            Some(&callback),
            CollectProgress::FetchedPage {
                page: 1,
                count: 25,
                total_so_far: 25,
            },
        );

        assert_eq!(
            *events.lock().unwrap(),
            vec![CollectProgress::FetchedPage {
                page: 1,
                count: 25,
                total_so_far: 25
            }]
        );
    }
}
