//! Dungeon ImageGen -- asynchronous image generation for the demo scenes.
//!
//! Scenes only see the [`ImageService`] trait: they submit an
//! [`ImageRequest`] and get back an [`ImageHandle`] they poll once per frame
//! without blocking. The result arrives as a [`GeneratedImage`] (an RGBA
//! raster) or an [`ImageGenError`].
//!
//! [`ComfyUiService`] is the concrete backend. It loads a workflow JSON file,
//! patches the nodes the request controls, queues it over HTTP and streams
//! the output image back over a websocket. Each request runs on its own
//! background thread and reports through a one-slot channel.
//!
//! - [`request`] -- request parameters and the decoded raster.
//! - [`handle`] -- the pollable result handle.
//! - [`service`] -- the `ImageService` trait.
//! - [`workflow`] -- workflow JSON loading and node patching.
//! - [`comfyui`] -- the ComfyUI HTTP + websocket client.

#![deny(unsafe_code)]

pub mod comfyui;
pub mod handle;
pub mod request;
pub mod service;
pub mod workflow;

use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while generating an image.
#[derive(Debug, thiserror::Error)]
pub enum ImageGenError {
    /// The workflow file could not be read.
    #[error("failed to read workflow '{}': {source}", path.display())]
    WorkflowRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document (workflow or server message) was malformed.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The workflow parsed but is not a node map.
    #[error("invalid workflow: {0}")]
    InvalidWorkflow(String),

    /// The workflow has no node that streams images back.
    #[error("workflow has no '{}' output node", workflow::OUTPUT_NODE_CLASS)]
    NoOutputNode,

    /// Queueing the prompt over HTTP failed (transport or non-2xx status).
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    /// Reading the HTTP response body failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The websocket connection could not be opened.
    #[error("websocket connection to {url} failed: {source}")]
    WebSocket {
        url: String,
        #[source]
        source: Box<tungstenite::Error>,
    },

    /// The returned bytes were not a decodable image.
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    /// A request was submitted while the service was stopped.
    #[error("image service is not running")]
    NotRunning,

    /// The worker thread went away without reporting a result.
    #[error("image request worker disconnected without a result")]
    Disconnected,
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::comfyui::{ComfyUiClient, ComfyUiService, FALLBACK_IMAGE_SIZE};
    pub use crate::handle::ImageHandle;
    pub use crate::request::{GeneratedImage, ImageRatio, ImageRequest};
    pub use crate::service::ImageService;
    pub use crate::workflow::{Workflow, OUTPUT_NODE_CLASS};
    pub use crate::ImageGenError;
}
