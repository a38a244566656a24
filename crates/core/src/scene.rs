//! The Scene (S): an ordered sequence of elements plus app state and files.

use serde::{Deserialize, Serialize};

use crate::element::Element;

pub type AppStateMap = serde_json::Map<String, serde_json::Value>;
pub type FilesMap = serde_json::Map<String, serde_json::Value>;

/// The full canonical scene, as broadcast in `canvas_sync` frames and
/// returned by the legacy `/canvas` and primary `/api/elements` surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    pub elements: Vec<Element>,
    #[serde(rename = "appState")]
    pub app_state: AppStateMap,
    pub files: FilesMap,
}

impl Scene {
    pub fn new(elements: Vec<Element>) -> Self {
        Self {
            elements,
            app_state: default_app_state(),
            files: FilesMap::new(),
        }
    }
}

/// The minimum app state every scene carries (`viewBackgroundColor`, `gridSize`).
pub fn default_app_state() -> AppStateMap {
    let mut map = AppStateMap::new();
    map.insert(
        "viewBackgroundColor".into(),
        serde_json::Value::String("#ffffff".into()),
    );
    map.insert("gridSize".into(), serde_json::Value::from(20));
    map
}
