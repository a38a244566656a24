//! The Element Normalizer (C2): fills defaults, assigns identity, and stamps
//! versioning metadata on every inbound element before it reaches the store.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;

use crate::element::{Element, ElementDraft, ElementType};
use crate::error::{Error, Result};

const DEFAULT_STROKE_COLOR: &str = "#1e1e2e";
const DEFAULT_BACKGROUND_COLOR: &str = "transparent";
const DEFAULT_FILL_STYLE: &str = "hachure";
const DEFAULT_STROKE_STYLE: &str = "solid";
const DEFAULT_STROKE_WIDTH: f64 = 2.0;
const DEFAULT_ROUGHNESS: f64 = 1.0;
const DEFAULT_OPACITY: f64 = 100.0;
const DEFAULT_WIDTH: f64 = 200.0;
const DEFAULT_HEIGHT: f64 = 100.0;
const DEFAULT_X: f64 = 100.0;
const DEFAULT_Y: f64 = 100.0;

/// Generate a 20 hex-character id from a v4 UUID with dashes stripped.
pub fn generate_id() -> String {
    let simple = uuid::Uuid::new_v4().simple().to_string();
    simple[..20].to_string()
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

/// Normalize a client-supplied draft into a canonical [`Element`].
///
/// This is the single place defaults are materialized (Invariant 1, 2, 3).
/// `start`/`end` endpoint references are passed through unchanged for the
/// Arrow Binding Resolver to consume afterward.
pub fn normalize(draft: ElementDraft) -> Result<Element> {
    let element_type = match draft.element_type.as_deref() {
        Some(t) => ElementType::parse(t)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown element type: {t}")))?,
        None => {
            return Err(Error::InvalidArgument(
                "element is missing required field 'type'".into(),
            ));
        }
    };

    if let Some(start) = &draft.start {
        if start.id.is_empty() {
            return Err(Error::InvalidArgument(
                "start binding reference must be a non-empty string id".into(),
            ));
        }
    }
    if let Some(end) = &draft.end {
        if end.id.is_empty() {
            return Err(Error::InvalidArgument(
                "end binding reference must be a non-empty string id".into(),
            ));
        }
    }

    let id = draft.id.filter(|s| !s.is_empty()).unwrap_or_else(generate_id);
    let width = draft.width.unwrap_or(DEFAULT_WIDTH);
    let height = draft.height.unwrap_or(DEFAULT_HEIGHT);

    let points = draft.points.or_else(|| {
        if element_type.is_linear() {
            Some(vec![[0.0, 0.0], [width, 0.0]])
        } else {
            None
        }
    });

    let now = now_ms();
    let now_iso = now_iso();

    Ok(Element {
        id,
        element_type,
        x: draft.x.unwrap_or(DEFAULT_X),
        y: draft.y.unwrap_or(DEFAULT_Y),
        width,
        height,
        angle: draft.angle.unwrap_or(0.0),
        stroke_color: draft.stroke_color.unwrap_or_else(|| DEFAULT_STROKE_COLOR.into()),
        background_color: draft
            .background_color
            .unwrap_or_else(|| DEFAULT_BACKGROUND_COLOR.into()),
        stroke_width: draft.stroke_width.unwrap_or(DEFAULT_STROKE_WIDTH),
        stroke_style: draft.stroke_style.unwrap_or_else(|| DEFAULT_STROKE_STYLE.into()),
        roughness: draft.roughness.unwrap_or(DEFAULT_ROUGHNESS),
        opacity: draft.opacity.unwrap_or(DEFAULT_OPACITY),
        fill_style: draft.fill_style.unwrap_or_else(|| DEFAULT_FILL_STYLE.into()),
        text: draft.text,
        font_size: draft.font_size,
        font_family: draft.font_family,
        points,
        start_binding: draft.start_binding,
        end_binding: draft.end_binding,
        start: draft.start,
        end: draft.end,
        group_ids: draft.group_ids.unwrap_or_default(),
        locked: draft.locked.unwrap_or(false),
        is_deleted: draft.is_deleted.unwrap_or(false),
        bound_elements: draft.bound_elements,
        version: 1,
        version_nonce: rand::random(),
        updated: now,
        created_at: now_iso.clone(),
        updated_at: now_iso,
    })
}

/// Bump an element's versioning fields after a mutation (Invariant 3).
pub fn touch(element: &mut Element) {
    element.version += 1;
    element.version_nonce = rand::random();
    element.updated = now_ms();
    element.updated_at = now_iso();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(ty: &str) -> ElementDraft {
        ElementDraft {
            element_type: Some(ty.into()),
            ..Default::default()
        }
    }

    #[test]
    fn fills_geometry_and_style_defaults() {
        let el = normalize(draft("rectangle")).unwrap();
        assert_eq!(el.x, DEFAULT_X);
        assert_eq!(el.y, DEFAULT_Y);
        assert_eq!(el.width, DEFAULT_WIDTH);
        assert_eq!(el.height, DEFAULT_HEIGHT);
        assert_eq!(el.angle, 0.0);
        assert_eq!(el.stroke_color, DEFAULT_STROKE_COLOR);
        assert_eq!(el.version, 1);
        assert!(!el.id.is_empty());
    }

    #[test]
    fn arrow_gets_default_points_when_absent() {
        let el = normalize(draft("arrow")).unwrap();
        let points = el.points.unwrap();
        assert!(points.len() >= 2);
    }

    #[test]
    fn rejects_unknown_type() {
        let err = normalize(draft("hexagon")).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn rejects_missing_type() {
        let err = normalize(ElementDraft::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn preserves_supplied_id() {
        let mut d = draft("text");
        d.id = Some("my-id".into());
        let el = normalize(d).unwrap();
        assert_eq!(el.id, "my-id");
    }
}
