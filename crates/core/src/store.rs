//! The Scene Store (C1): the authoritative ordered element set, single-writer
//! discipline enforced by the caller (the server wraps this behind a mutex).

use serde::Serialize;

use crate::element::Element;
use crate::error::{Error, Result};
use crate::normalize::touch;
use crate::scene::{AppStateMap, FilesMap, Scene};
use crate::search::SearchQuery;

/// A named, independent copy of the scene at a point in time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub name: String,
    pub elements: Vec<Element>,
    pub created_at: String,
}

/// The listing shape for `snapshotList()` — omits the (potentially large)
/// element payload.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotSummary {
    pub name: String,
    pub created_at: String,
    pub element_count: usize,
}

/// The in-memory scene store. Elements are kept in Z-order (first-in is
/// back-most); snapshots are independent deep copies keyed by name.
#[derive(Debug, Default)]
pub struct SceneStore {
    elements: Vec<Element>,
    app_state: AppStateMap,
    files: FilesMap,
    snapshots: Vec<Snapshot>,
}

impl SceneStore {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            app_state: crate::scene::default_app_state(),
            files: FilesMap::new(),
            snapshots: Vec::new(),
        }
    }

    pub fn list(&self) -> &[Element] {
        &self.elements
    }

    pub fn get(&self, id: &str) -> Result<&Element> {
        self.elements
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Insert or replace by id. Keeps the element's current Z-order position
    /// if already present, else appends.
    pub fn put(&mut self, element: Element) -> Element {
        match self.elements.iter().position(|e| e.id == element.id) {
            Some(idx) => {
                self.elements[idx] = element.clone();
            }
            None => {
                self.elements.push(element.clone());
            }
        }
        element
    }

    /// Merge `delta` fields onto the stored element, preserving any field
    /// absent from `delta` (Invariant: `angle` is never silently zeroed),
    /// then bump version fields.
    pub fn patch(&mut self, id: &str, delta: serde_json::Value) -> Result<Element> {
        let idx = self
            .elements
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        let mut base = serde_json::to_value(&self.elements[idx])?;
        if let (Some(base_obj), serde_json::Value::Object(delta_obj)) =
            (base.as_object_mut(), &delta)
        {
            for (key, value) in delta_obj {
                // Identity, type tag, and server-managed versioning/lifecycle
                // fields are immutable from a client-supplied delta —
                // `touch()` below is the only thing allowed to advance them.
                if matches!(
                    key.as_str(),
                    "id" | "type"
                        | "version"
                        | "versionNonce"
                        | "updated"
                        | "createdAt"
                        | "updatedAt"
                        | "isDeleted"
                ) {
                    continue;
                }
                base_obj.insert(key.clone(), value.clone());
            }
        }

        let mut merged: Element = serde_json::from_value(base)?;
        touch(&mut merged);
        self.elements[idx] = merged.clone();
        Ok(merged)
    }

    pub fn delete(&mut self, id: &str) -> bool {
        let before = self.elements.len();
        self.elements.retain(|e| e.id != id);
        self.elements.len() != before
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    /// Atomically replace the entire element set.
    pub fn replace(&mut self, elements: Vec<Element>) {
        self.elements = elements;
    }

    pub fn search(&self, query: &SearchQuery) -> Vec<&Element> {
        self.elements.iter().filter(|e| query.matches(e)).collect()
    }

    pub fn scene(&self) -> Scene {
        Scene {
            elements: self.elements.clone(),
            app_state: self.app_state.clone(),
            files: self.files.clone(),
        }
    }

    pub fn app_state(&self) -> &AppStateMap {
        &self.app_state
    }

    pub fn files(&self) -> &FilesMap {
        &self.files
    }

    /// Create (or overwrite) a named snapshot with a deep copy of the
    /// current elements (Invariant 6).
    pub fn snapshot_create(&mut self, name: &str, created_at: String) {
        let snapshot = Snapshot {
            name: name.to_string(),
            elements: self.elements.clone(),
            created_at,
        };
        match self.snapshots.iter().position(|s| s.name == name) {
            Some(idx) => self.snapshots[idx] = snapshot,
            None => self.snapshots.push(snapshot),
        }
    }

    pub fn snapshot_list(&self) -> Vec<SnapshotSummary> {
        self.snapshots
            .iter()
            .map(|s| SnapshotSummary {
                name: s.name.clone(),
                created_at: s.created_at.clone(),
                element_count: s.elements.len(),
            })
            .collect()
    }

    pub fn snapshot_get(&self, name: &str) -> Result<&Snapshot> {
        self.snapshots
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::SnapshotNotFound(name.to_string()))
    }

    pub fn snapshot_restore(&mut self, name: &str) -> Result<()> {
        let snapshot = self.snapshot_get(name)?;
        self.elements = snapshot.elements.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementDraft;
    use crate::normalize::normalize;

    fn rect() -> Element {
        normalize(ElementDraft {
            element_type: Some("rectangle".into()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn put_then_get_round_trips() {
        let mut store = SceneStore::new();
        let el = rect();
        let id = el.id.clone();
        store.put(el);
        assert_eq!(store.get(&id).unwrap().id, id);
    }

    #[test]
    fn patch_preserves_absent_fields() {
        let mut store = SceneStore::new();
        let el = rect();
        let id = el.id.clone();
        let angle_before = el.angle;
        store.put(el);

        let patched = store
            .patch(&id, serde_json::json!({ "x": 200.0 }))
            .unwrap();
        assert_eq!(patched.angle, angle_before);
        assert_eq!(patched.x, 200.0);
        assert_eq!(patched.version, 2);
    }

    #[test]
    fn patch_rejects_type_and_id_changes() {
        let mut store = SceneStore::new();
        let el = rect();
        let id = el.id.clone();
        store.put(el);

        let patched = store
            .patch(&id, serde_json::json!({ "type": "ellipse", "id": "other" }))
            .unwrap();
        assert_eq!(patched.id, id);
        assert_eq!(patched.element_type.as_str(), "rectangle");
    }

    #[test]
    fn patch_ignores_spoofed_version_and_resurrected_is_deleted() {
        let mut store = SceneStore::new();
        let el = rect();
        let id = el.id.clone();
        store.put(el);

        let patched = store
            .patch(
                &id,
                serde_json::json!({
                    "version": 50,
                    "versionNonce": 999,
                    "isDeleted": true,
                    "updated": 1,
                    "createdAt": "1970-01-01T00:00:00Z",
                    "updatedAt": "1970-01-01T00:00:00Z",
                }),
            )
            .unwrap();
        assert_eq!(patched.version, 2);
        assert!(!patched.is_deleted);
        assert!(store.get(&id).is_ok());
    }

    #[test]
    fn snapshot_is_independent_of_live_mutation() {
        let mut store = SceneStore::new();
        let el = rect();
        let id = el.id.clone();
        store.put(el);
        store.snapshot_create("before", "2026-01-01T00:00:00Z".into());

        store.patch(&id, serde_json::json!({ "x": 999.0 })).unwrap();

        let snapshot = store.snapshot_get("before").unwrap();
        assert_eq!(snapshot.elements[0].x, 100.0);
        assert_eq!(store.get(&id).unwrap().x, 999.0);
    }

    #[test]
    fn delete_removes_and_returns_bool() {
        let mut store = SceneStore::new();
        let el = rect();
        let id = el.id.clone();
        store.put(el);
        assert!(store.delete(&id));
        assert!(!store.delete(&id));
        assert!(store.get(&id).is_err());
    }
}
