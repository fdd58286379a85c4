//! Non-blocking handle to an in-flight image request.

use crossbeam_channel::{Receiver, TryRecvError};

use crate::request::GeneratedImage;
use crate::ImageGenError;

type ImageResult = Result<GeneratedImage, ImageGenError>;

/// Receives the outcome of one background image request.
///
/// [`poll`](ImageHandle::poll) never blocks and yields the outcome at most
/// once; afterwards the handle is spent and always returns `None`. Dropping
/// the handle abandons the request: the worker still runs to completion but
/// its result is discarded.
#[derive(Debug)]
pub struct ImageHandle {
    rx: Option<Receiver<ImageResult>>,
}

impl ImageHandle {
    /// Run `job` on a new thread and return a handle to its result.
    pub fn spawn<F>(job: F) -> Self
    where
        F: FnOnce() -> ImageResult + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let spawned = std::thread::Builder::new()
            .name("image-request".to_owned())
            .spawn(move || {
                if tx.send(job()).is_err() {
                    tracing::debug!("image request finished after its handle was dropped");
                }
            });
        match spawned {
            Ok(_) => Self { rx: Some(rx) },
            Err(e) => Self::ready(Err(ImageGenError::Io(e))),
        }
    }

    /// A handle whose result is already available.
    pub fn ready(result: ImageResult) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(1);
        // The channel has a free slot and `rx` is alive, so this cannot fail.
        let _ = tx.send(result);
        Self { rx: Some(rx) }
    }

    /// Take the result if it has arrived.
    ///
    /// A worker that exits without sending (e.g. it panicked) is reported as
    /// [`ImageGenError::Disconnected`].
    pub fn poll(&mut self) -> Option<ImageResult> {
        let rx = self.rx.as_ref()?;
        match rx.try_recv() {
            Ok(result) => {
                self.rx = None;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.rx = None;
                Some(Err(ImageGenError::Disconnected))
            }
        }
    }

    /// Whether the result has already been taken.
    pub fn is_spent(&self) -> bool {
        self.rx.is_none()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
