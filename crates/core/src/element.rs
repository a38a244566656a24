use serde::{Deserialize, Serialize};

/// The closed set of drawable shape tags. Immutable once an element exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Rectangle,
    Ellipse,
    Diamond,
    Text,
    Line,
    Arrow,
    Freedraw,
    Image,
    Frame,
}

impl ElementType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rectangle" => Some(Self::Rectangle),
            "ellipse" => Some(Self::Ellipse),
            "diamond" => Some(Self::Diamond),
            "text" => Some(Self::Text),
            "line" => Some(Self::Line),
            "arrow" => Some(Self::Arrow),
            "freedraw" => Some(Self::Freedraw),
            "image" => Some(Self::Image),
            "frame" => Some(Self::Frame),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rectangle => "rectangle",
            Self::Ellipse => "ellipse",
            Self::Diamond => "diamond",
            Self::Text => "text",
            Self::Line => "line",
            Self::Arrow => "arrow",
            Self::Freedraw => "freedraw",
            Self::Image => "image",
            Self::Frame => "frame",
        }
    }

    pub fn is_linear(&self) -> bool {
        matches!(self, Self::Line | Self::Arrow)
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A raw endpoint reference carried on an arrow/line before binding resolution,
/// e.g. `{"id": "A"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointRef {
    pub id: String,
}

/// A resolved binding from an arrow/line endpoint to the element it attaches to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Binding {
    #[serde(rename = "elementId")]
    pub element_id: String,
    pub focus: f64,
    pub gap: f64,
}

/// The raw, client-supplied shape of an element before normalization.
///
/// Every field is optional — the Normalizer (see [`crate::normalize`]) fills
/// in defaults, assigns identity, and stamps versioning metadata to produce
/// a canonical [`Element`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementDraft {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub element_type: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub angle: Option<f64>,
    #[serde(rename = "strokeColor")]
    pub stroke_color: Option<String>,
    #[serde(rename = "backgroundColor")]
    pub background_color: Option<String>,
    #[serde(rename = "strokeWidth")]
    pub stroke_width: Option<f64>,
    #[serde(rename = "strokeStyle")]
    pub stroke_style: Option<String>,
    pub roughness: Option<f64>,
    pub opacity: Option<f64>,
    #[serde(rename = "fillStyle")]
    pub fill_style: Option<String>,
    pub text: Option<String>,
    #[serde(rename = "fontSize")]
    pub font_size: Option<f64>,
    #[serde(rename = "fontFamily")]
    pub font_family: Option<String>,
    pub points: Option<Vec<[f64; 2]>>,
    #[serde(rename = "startBinding")]
    pub start_binding: Option<Binding>,
    #[serde(rename = "endBinding")]
    pub end_binding: Option<Binding>,
    pub start: Option<EndpointRef>,
    pub end: Option<EndpointRef>,
    #[serde(rename = "groupIds")]
    pub group_ids: Option<Vec<String>>,
    pub locked: Option<bool>,
    #[serde(rename = "isDeleted")]
    pub is_deleted: Option<bool>,
    #[serde(rename = "boundElements")]
    pub bound_elements: Option<Vec<serde_json::Value>>,
}

/// A fully normalized element as it lives in the Scene Store.
///
/// `start`/`end` are transient: they carry the raw endpoint references from
/// the draft through to the Arrow Binding Resolver, which consumes and
/// clears them in favor of `start_binding`/`end_binding` (Invariant 2).
/// They are never present once an element is at rest in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub angle: f64,
    #[serde(rename = "strokeColor")]
    pub stroke_color: String,
    #[serde(rename = "backgroundColor")]
    pub background_color: String,
    #[serde(rename = "strokeWidth")]
    pub stroke_width: f64,
    #[serde(rename = "strokeStyle")]
    pub stroke_style: String,
    pub roughness: f64,
    pub opacity: f64,
    #[serde(rename = "fillStyle")]
    pub fill_style: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "fontSize", skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(rename = "fontFamily", skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<[f64; 2]>>,
    #[serde(rename = "startBinding", skip_serializing_if = "Option::is_none")]
    pub start_binding: Option<Binding>,
    #[serde(rename = "endBinding", skip_serializing_if = "Option::is_none")]
    pub end_binding: Option<Binding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<EndpointRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<EndpointRef>,
    #[serde(rename = "groupIds")]
    pub group_ids: Vec<String>,
    pub locked: bool,
    #[serde(rename = "isDeleted")]
    pub is_deleted: bool,
    #[serde(rename = "boundElements")]
    pub bound_elements: Option<Vec<serde_json::Value>>,
    pub version: u64,
    #[serde(rename = "versionNonce")]
    pub version_nonce: u32,
    pub updated: u64,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "updatedAt")]
    pub updated_at: String,
}

impl Element {
    /// True if this element still carries unresolved endpoint references.
    pub fn has_pending_endpoints(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// Center of the element's bounding box — used by the binding resolver
    /// and by alignment/distribution tools.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}
