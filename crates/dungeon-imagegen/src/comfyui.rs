//! ComfyUI backend: HTTP to queue a workflow, websocket to receive images.
//!
//! One request runs as:
//!
//! 1. Load the workflow file and inject the request parameters.
//! 2. Open `ws://<host>/ws?clientId=<id>` so progress for this client is
//!    pushed to us.
//! 3. POST `{ "prompt": <workflow>, "client_id": <id> }` to `/prompt`; the
//!    reply carries the `prompt_id`.
//! 4. Read text frames until an `executing` message for our prompt reports
//!    `node: null`. Binary frames that arrive while the output node is
//!    executing carry an 8-byte header followed by an encoded image.
//! 5. Decode the first image that decodes; if none arrived, return a white
//!    [`FALLBACK_IMAGE_SIZE`]² placeholder.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tungstenite::Message;

use crate::handle::ImageHandle;
use crate::request::{GeneratedImage, ImageRequest};
use crate::service::ImageService;
use crate::workflow::Workflow;
use crate::ImageGenError;

/// Edge length of the white image returned when the server sent no image.
pub const FALLBACK_IMAGE_SIZE: u32 = 512;

/// Length of the event header ComfyUI prepends to binary image frames.
const BINARY_HEADER_LEN: usize = 8;

// ---------------------------------------------------------------------------
// Wire messages
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct QueueResponse {
    prompt_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Deserialize)]
struct ExecutingData {
    #[serde(default)]
    prompt_id: Option<String>,
    #[serde(default)]
    node: Option<String>,
}

/// Accumulates image frames for one prompt from the websocket stream.
#[derive(Debug)]
pub struct ImageCollector {
    prompt_id: String,
    output_node: String,
    current_node: Option<String>,
    images: Vec<Vec<u8>>,
}

impl ImageCollector {
    pub fn new(prompt_id: impl Into<String>, output_node: impl Into<String>) -> Self {
        Self {
            prompt_id: prompt_id.into(),
            output_node: output_node.into(),
            current_node: None,
            images: Vec::new(),
        }
    }

    /// Feed a text frame. Returns `true` once execution of our prompt is done.
    pub fn on_text(&mut self, text: &str) -> bool {
        let message: StatusMessage = match serde_json::from_str(text) {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring unparseable status message");
                return false;
            }
        };
        if message.kind != "executing" {
            return false;
        }
        let Ok(data) = serde_json::from_value::<ExecutingData>(message.data) else {
            return false;
        };
        if data.prompt_id.as_deref() != Some(self.prompt_id.as_str()) {
            return false;
        }
        match data.node {
            Some(node) => {
                tracing::trace!(node = %node, "executing node");
                self.current_node = Some(node);
                false
            }
            None => true,
        }
    }

    /// Feed a binary frame. Kept only while the output node is executing.
    pub fn on_binary(&mut self, frame: &[u8]) {
        if self.current_node.as_deref() != Some(self.output_node.as_str()) {
            return;
        }
        if frame.len() > BINARY_HEADER_LEN {
            self.images.push(frame[BINARY_HEADER_LEN..].to_vec());
        }
    }

    pub fn images(&self) -> &[Vec<u8>] {
        &self.images
    }

    /// First payload that decodes, or the white placeholder.
    pub fn into_image(self) -> GeneratedImage {
        for (index, bytes) in self.images.iter().enumerate() {
            match GeneratedImage::decode(bytes) {
                Ok(image) => {
                    tracing::info!(
                        width = image.width(),
                        height = image.height(),
                        "image generated"
                    );
                    return image;
                }
                Err(e) => {
                    tracing::error!(index, error = %e, "failed to decode image payload");
                }
            }
        }
        tracing::warn!("no image received from ComfyUI, using fallback");
        GeneratedImage::blank(FALLBACK_IMAGE_SIZE, FALLBACK_IMAGE_SIZE)
    }
}

// ---------------------------------------------------------------------------
// URLs
// ---------------------------------------------------------------------------

/// `http://host:port` -> `ws://host:port/ws?clientId=<id>`.
pub fn websocket_url(base_url: &str, client_id: &str) -> String {
    let mut url = if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base_url.to_owned()
    };
    if !url.ends_with('/') {
        url.push('/');
    }
    url.push_str("ws?clientId=");
    url.push_str(client_id);
    url
}

/// `http://host:port/` -> `http://host:port/prompt`.
pub fn prompt_url(base_url: &str) -> String {
    format!("{}/prompt", base_url.trim_end_matches('/'))
}

// ---------------------------------------------------------------------------
// ComfyUiClient
// ---------------------------------------------------------------------------

/// Blocking client for one ComfyUI server. Cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ComfyUiClient {
    base_url: String,
    workflow_folder: PathBuf,
    client_id: String,
}

impl ComfyUiClient {
    /// A client with a fresh random client id.
    pub fn new(base_url: impl Into<String>, workflow_folder: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.into(),
            workflow_folder: workflow_folder.into(),
            client_id: format!("{:032x}", rand::random::<u128>()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Run one request to completion. Blocks on the network.
    pub fn generate(&self, request: &ImageRequest) -> Result<GeneratedImage, ImageGenError> {
        tracing::info!(
            workflow = %request.workflow_name,
            prompt = %request.prompt,
            seed = request.seed,
            steps = request.steps,
            ratio = request.ratio.as_str(),
            "processing image request"
        );

        let mut workflow = Workflow::load(&self.workflow_folder, &request.workflow_name)?;
        workflow.apply_request(request);
        let output_node = workflow
            .output_node()
            .ok_or(ImageGenError::NoOutputNode)?
            .to_owned();

        let ws_url = websocket_url(&self.base_url, &self.client_id);
        tracing::debug!(url = %ws_url, "connecting websocket");
        let (mut socket, _response) =
            tungstenite::connect(ws_url.as_str()).map_err(|e| ImageGenError::WebSocket {
                url: ws_url.clone(),
                source: Box::new(e),
            })?;

        let prompt_id = self.queue_prompt(workflow.into_value())?;
        tracing::debug!(prompt_id = %prompt_id, "prompt queued");

        let mut collector = ImageCollector::new(prompt_id, output_node);
        loop {
            match socket.read() {
                Ok(Message::Text(text)) => {
                    if collector.on_text(&text) {
                        break;
                    }
                }
                Ok(Message::Binary(frame)) => collector.on_binary(&frame),
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "websocket read failed");
                    break;
                }
            }
        }
        if let Err(e) = socket.close(None) {
            tracing::debug!(error = %e, "websocket close failed");
        }

        tracing::debug!(images = collector.images().len(), "image stream finished");
        Ok(collector.into_image())
    }

    fn queue_prompt(&self, prompt: Value) -> Result<String, ImageGenError> {
        let url = prompt_url(&self.base_url);
        let payload = serde_json::json!({
            "prompt": prompt,
            "client_id": self.client_id,
        });
        let response = ureq::post(&url)
            .send_json(payload)
            .map_err(|e| ImageGenError::Http {
                url: url.clone(),
                source: Box::new(e),
            })?;
        let queued: QueueResponse = response.into_json()?;
        Ok(queued.prompt_id)
    }
}

// ---------------------------------------------------------------------------
// ComfyUiService
// ---------------------------------------------------------------------------

/// [`ImageService`] backed by a ComfyUI server.
#[derive(Debug)]
pub struct ComfyUiService {
    running: AtomicBool,
    client: Arc<ComfyUiClient>,
}

impl ComfyUiService {
    pub fn new(client: ComfyUiClient) -> Self {
        Self {
            running: AtomicBool::new(false),
            client: Arc::new(client),
        }
    }

    pub fn client(&self) -> &ComfyUiClient {
        &self.client
    }
}

impl ImageService for ComfyUiService {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn start(&self) -> Result<(), ImageGenError> {
        if !self.running.swap(true, Ordering::SeqCst) {
            tracing::info!(base_url = %self.client.base_url, "ComfyUI service started");
        }
        Ok(())
    }

    fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            tracing::info!("ComfyUI service stopped");
        }
    }

    fn submit(&self, request: ImageRequest) -> ImageHandle {
        if !self.is_running() {
            return ImageHandle::ready(Err(ImageGenError::NotRunning));
        }
        let client = Arc::clone(&self.client);
        ImageHandle::spawn(move || client.generate(&request))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
