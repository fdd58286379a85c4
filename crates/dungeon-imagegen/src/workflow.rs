//! ComfyUI workflow documents in API format.
//!
//! A workflow is a JSON object mapping node ids to nodes:
//!
//! ```json
//! { "6": { "class_type": "PrimitiveString",
//!          "inputs": { "value": "a castle" },
//!          "_meta": { "title": "ContentPrompt" } } }
//! ```
//!
//! Request parameters are injected by finding nodes through their
//! `_meta.title` and overwriting `inputs.value`. Node ids are iterated in
//! sorted order, so the first match for a duplicated title is stable.

use std::path::Path;

use serde_json::{Map, Value};

use crate::request::ImageRequest;
use crate::ImageGenError;

/// Class of the node that streams finished images over the websocket.
pub const OUTPUT_NODE_CLASS: &str = "SaveImageWebsocket";

pub const TITLE_RATIO: &str = "Ratio";
pub const TITLE_PROMPT: &str = "ContentPrompt";
pub const TITLE_SEED: &str = "Seed";
pub const TITLE_STEPS: &str = "Steps";
pub const TITLE_SIZE: &str = "Size";

#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
    nodes: Map<String, Value>,
}

impl Workflow {
    /// Read `<folder>/<name>`.
    pub fn load(folder: &Path, name: &str) -> Result<Self, ImageGenError> {
        let path = folder.join(name);
        let text = std::fs::read_to_string(&path)
            .map_err(|source| ImageGenError::WorkflowRead { path, source })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ImageGenError> {
        match serde_json::from_str::<Value>(text)? {
            Value::Object(nodes) => Ok(Self { nodes }),
            other => Err(ImageGenError::InvalidWorkflow(format!(
                "expected an object of nodes, found {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: &str) -> Option<&Value> {
        self.nodes.get(id)
    }

    /// Id of the first node whose `_meta.title` equals `title`.
    pub fn find_node_by_title(&self, title: &str) -> Option<&str> {
        self.nodes.iter().find_map(|(id, node)| {
            let node_title = node.get("_meta")?.get("title")?.as_str()?;
            (node_title == title).then_some(id.as_str())
        })
    }

    /// Id of the first node of class [`OUTPUT_NODE_CLASS`].
    pub fn output_node(&self) -> Option<&str> {
        self.nodes.iter().find_map(|(id, node)| {
            let class = node.get("class_type")?.as_str()?;
            (class == OUTPUT_NODE_CLASS).then_some(id.as_str())
        })
    }

    /// Overwrite `inputs.value` on the node titled `title`.
    ///
    /// Returns `false` (and logs a warning) if no such node exists or it has
    /// no `inputs` object.
    pub fn set_value(&mut self, title: &str, value: Value) -> bool {
        let Some(id) = self.find_node_by_title(title).map(str::to_owned) else {
            tracing::warn!(title, "no workflow node with this title");
            return false;
        };
        let inputs = self
            .nodes
            .get_mut(&id)
            .and_then(|node| node.get_mut("inputs"))
            .and_then(Value::as_object_mut);
        match inputs {
            Some(inputs) => {
                tracing::debug!(node_id = %id, title, %value, "updated workflow node");
                inputs.insert("value".to_owned(), value);
                true
            }
            None => {
                tracing::warn!(node_id = %id, title, "workflow node has no inputs");
                false
            }
        }
    }

    /// Inject the request's parameters. Empty strings and zero numbers are
    /// skipped so the workflow's own defaults remain.
    pub fn apply_request(&mut self, request: &ImageRequest) {
        self.set_value(TITLE_RATIO, Value::from(request.ratio.as_str()));
        if !request.prompt.is_empty() {
            self.set_value(TITLE_PROMPT, Value::from(request.prompt.as_str()));
        }
        if request.seed > 0 {
            self.set_value(TITLE_SEED, Value::from(request.seed));
        }
        if request.steps > 0 {
            self.set_value(TITLE_STEPS, Value::from(request.steps));
        }
        if request.size > 0 {
            self.set_value(TITLE_SIZE, Value::from(f64::from(request.size)));
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.nodes)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
