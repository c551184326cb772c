//! Transfer progress reporting.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use tokio::io::{AsyncRead, ReadBuf};

use super::constants::PROGRESS_INTERVAL;

/// Bytes transferred so far and the total, when known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub transferred: u64,
    pub total: Option<u64>,
}

impl ProgressEvent {
    /// Completed fraction in `0.0..=1.0`, or `None` when the total is unknown.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> Option<f64> {
        match self.total {
            Some(0) => Some(1.0),
            Some(total) => Some((self.transferred as f64 / total as f64).min(1.0)),
            None => None,
        }
    }
}

/// Receives progress events for one transfer.
///
/// Implemented for any `Fn(ProgressEvent) + Send + Sync`.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, event: ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: ProgressEvent) {
        self(event);
    }
}

/// Shared handle to an observer; cheap to clone into tasks.
pub type SharedProgress = Arc<dyn ProgressObserver>;

/// Wraps a reader and reports cumulative bytes read.
///
/// Emits `(0, total)` on construction, then at most one event per
/// [`PROGRESS_INTERVAL`] while reading. [`ProgressReader::finish`] emits the
/// final event exactly once.
pub struct ProgressReader<R> {
    inner: R,
    read: u64,
    total: Option<u64>,
    observer: Option<SharedProgress>,
    last_emit: Instant,
}

impl<R> ProgressReader<R> {
    pub fn new(inner: R, total: Option<u64>, observer: Option<SharedProgress>) -> Self {
        if let Some(observer) = &observer {
            observer.on_progress(ProgressEvent {
                transferred: 0,
                total,
            });
        }
        Self {
            inner,
            read: 0,
            total,
            observer,
            last_emit: Instant::now(),
        }
    }

    /// Bytes read so far.
    #[must_use]
    pub fn bytes_read(&self) -> u64 {
        self.read
    }

    /// Emits the completion event. The total becomes the bytes read when it
    /// was unknown.
    pub fn finish(self) {
        if let Some(observer) = &self.observer {
            let total = self.total.unwrap_or(self.read);
            observer.on_progress(ProgressEvent {
                transferred: total,
                total: Some(total),
            });
        }
    }
}

impl<R> fmt::Debug for ProgressReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReader")
            .field("read", &self.read)
            .field("total", &self.total)
            .field("observed", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for ProgressReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &poll {
            let n = buf.filled().len() - before;
            if n > 0 {
                this.read += n as u64;
                if let Some(observer) = &this.observer
                    && this.last_emit.elapsed() >= PROGRESS_INTERVAL
                {
                    this.last_emit = Instant::now();
                    observer.on_progress(ProgressEvent {
                        transferred: this.read,
                        total: this.total,
                    });
                }
            }
        }
        poll
    }
}
