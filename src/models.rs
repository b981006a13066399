use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Axis-aligned box enclosing a polygon of (x, y) points.
    /// Negative coordinates are clamped to zero.
    pub fn from_points(points: &[[f64; 2]]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for [x, y] in points {
            min_x = min_x.min(*x);
            min_y = min_y.min(*y);
            max_x = max_x.max(*x);
            max_y = max_y.max(*y);
        }
        if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
            return None;
        }
        let min_x = min_x.max(0.0);
        let min_y = min_y.max(0.0);
        let max_x = max_x.max(min_x);
        let max_y = max_y.max(min_y);
        Some(Self {
            x: min_x as u32,
            y: min_y as u32,
            width: (max_x - min_x) as u32,
            height: (max_y - min_y) as u32,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    #[default]
    Line,
    Word,
    Paragraph,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    pub confidence: f32,
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
    #[serde(rename = "type", default)]
    pub block_type: BlockType,
}

impl TextBlock {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence: clamp_confidence(confidence),
            bbox: None,
            block_type: BlockType::Line,
        }
    }

    pub fn with_bbox(mut self, bbox: Option<BoundingBox>) -> Self {
        self.bbox = bbox;
        self
    }

    pub fn with_type(mut self, block_type: BlockType) -> Self {
        self.block_type = block_type;
        self
    }
}

fn clamp_confidence(c: f32) -> f32 {
    if c.is_nan() { 0.0 } else { c.clamp(0.0, 1.0) }
}

/// Output of a single engine invocation on one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Identity of the engine that produced this result.
    pub engine: String,
    pub raw_text: String,
    #[serde(default)]
    pub blocks: Vec<TextBlock>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub meta: BTreeMap<String, serde_json::Value>,
}

impl ExtractionResult {
    pub fn new(engine: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            raw_text: raw_text.into(),
            blocks: Vec::new(),
            language: None,
            meta: BTreeMap::new(),
        }
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.meta.insert(key.to_string(), value.into());
        self
    }
}

/// A discovered input paired with its extraction, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub path: PathBuf,
    #[serde(default)]
    pub ocr: Option<ExtractionResult>,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, ocr: Option<ExtractionResult>) -> Self {
        Self {
            path: path.into(),
            ocr,
        }
    }

    pub fn raw_text(&self) -> Option<&str> {
        self.ocr.as_ref().map(|o| o.raw_text.as_str())
    }
}
