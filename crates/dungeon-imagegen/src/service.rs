//! The seam between scenes and whatever produces images.

use crate::handle::ImageHandle;
use crate::request::ImageRequest;
use crate::ImageGenError;

/// An image generator shared by every scene through `Arc<dyn ImageService>`.
///
/// All methods take `&self`; implementations keep their own interior state.
pub trait ImageService: Send + Sync {
    fn is_running(&self) -> bool;

    /// Idempotent.
    fn start(&self) -> Result<(), ImageGenError>;

    /// Idempotent. In-flight requests are not cancelled.
    fn stop(&self);

    /// Begin generating an image in the background.
    fn submit(&self, request: ImageRequest) -> ImageHandle;
}
