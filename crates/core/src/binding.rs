//! The Arrow Binding Resolver (C3): computes edge-attachment points, gap
//! offsets, and binding records for arrows/lines that reference endpoints.

use std::collections::HashMap;

use crate::element::{Binding, Element, ElementType};

/// Uniform gap applied between an edge attachment point and the arrow tip.
pub const GAP: f64 = 8.0;

type Point = (f64, f64);

/// Resolve bindings for every arrow/line in `batch` that carries `start`/`end`
/// references, against a working map of `batch ∪ already_stored`.
///
/// Elements with no pending endpoint references are left untouched.
pub fn resolve_batch(batch: &mut [Element], already_stored: &[Element]) {
    let mut working: HashMap<String, Element> = HashMap::new();
    for el in already_stored {
        working.insert(el.id.clone(), el.clone());
    }
    for el in batch.iter() {
        working.insert(el.id.clone(), el.clone());
    }

    for el in batch.iter_mut() {
        if el.element_type.is_linear() && el.has_pending_endpoints() {
            resolve_one(el, &working);
        }
    }
}

fn resolve_one(el: &mut Element, working: &HashMap<String, Element>) {
    let default_start: Point = (el.x, el.y);
    let default_end: Point = (el.x + 100.0, el.y);

    let start_peer = el.start.as_ref().and_then(|r| working.get(&r.id));
    let end_peer = el.end.as_ref().and_then(|r| working.get(&r.id));

    let toward_for_start = end_peer.map(Element::center).unwrap_or(default_end);
    let toward_for_end = start_peer.map(Element::center).unwrap_or(default_start);

    let (start_point, start_binding) = match (&el.start, start_peer) {
        (Some(r), Some(peer)) => {
            let edge = edge_attachment(peer, toward_for_start);
            let point = apply_gap(peer.center(), edge, GAP);
            (
                point,
                Some(Binding {
                    element_id: r.id.clone(),
                    focus: 0.0,
                    gap: GAP,
                }),
            )
        }
        _ => (default_start, None),
    };

    let (end_point, end_binding) = match (&el.end, end_peer) {
        (Some(r), Some(peer)) => {
            let edge = edge_attachment(peer, toward_for_end);
            let point = apply_gap(peer.center(), edge, GAP);
            (
                point,
                Some(Binding {
                    element_id: r.id.clone(),
                    focus: 0.0,
                    gap: GAP,
                }),
            )
        }
        _ => (default_end, None),
    };

    el.x = start_point.0;
    el.y = start_point.1;
    let end_rel = (end_point.0 - start_point.0, end_point.1 - start_point.1);
    el.points = Some(vec![[0.0, 0.0], [end_rel.0, end_rel.1]]);
    el.start_binding = start_binding;
    el.end_binding = end_binding;
    el.start = None;
    el.end = None;
}

/// Project `toward` onto the silhouette of `peer`'s bounding shape.
fn edge_attachment(peer: &Element, toward: Point) -> Point {
    let (cx, cy) = peer.center();
    let dx = toward.0 - cx;
    let dy = toward.1 - cy;
    let hw = peer.width / 2.0;
    let hh = peer.height / 2.0;

    if dx == 0.0 && dy == 0.0 {
        return (cx, cy + hh);
    }

    match peer.element_type {
        ElementType::Diamond => {
            let denom = dx.abs() / hw.max(f64::EPSILON) + dy.abs() / hh.max(f64::EPSILON);
            let scale = 1.0 / denom;
            (cx + dx * scale, cy + dy * scale)
        }
        ElementType::Ellipse => {
            let theta = dy.atan2(dx);
            (cx + hw * theta.cos(), cy + hh * theta.sin())
        }
        _ => {
            // Rectangle (and the default for every other shape): intersect
            // the ray with whichever bounding-box face it reaches first.
            let scale_x = if dx != 0.0 { hw / dx.abs() } else { f64::INFINITY };
            let scale_y = if dy != 0.0 { hh / dy.abs() } else { f64::INFINITY };
            let scale = scale_x.min(scale_y);
            (cx + dx * scale, cy + dy * scale)
        }
    }
}

/// Push `edge` further along the `center -> edge` direction by `gap`.
fn apply_gap(center: Point, edge: Point, gap: f64) -> Point {
    let dx = edge.0 - center.0;
    let dy = edge.1 - center.1;
    let len = (dx * dx + dy * dy).sqrt();
    if len < f64::EPSILON {
        return (edge.0, edge.1 + gap);
    }
    (edge.0 + dx / len * gap, edge.1 + dy / len * gap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ElementDraft, EndpointRef};
    use crate::normalize::normalize;

    fn rect(id: &str, x: f64, y: f64, w: f64, h: f64) -> Element {
        normalize(ElementDraft {
            id: Some(id.into()),
            element_type: Some("rectangle".into()),
            x: Some(x),
            y: Some(y),
            width: Some(w),
            height: Some(h),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn resolves_two_known_endpoints() {
        let a = rect("A", 0.0, 0.0, 100.0, 50.0);
        let b = rect("B", 300.0, 0.0, 100.0, 50.0);
        let mut arrow = normalize(ElementDraft {
            element_type: Some("arrow".into()),
            x: Some(0.0),
            y: Some(0.0),
            start: Some(EndpointRef { id: "A".into() }),
            end: Some(EndpointRef { id: "B".into() }),
            ..Default::default()
        })
        .unwrap();

        resolve_batch(std::slice::from_mut(&mut arrow), &[a, b]);

        assert_eq!(arrow.start_binding.as_ref().unwrap().element_id, "A");
        assert_eq!(arrow.end_binding.as_ref().unwrap().element_id, "B");
        assert!(arrow.start.is_none());
        assert!(arrow.end.is_none());
        assert_eq!(arrow.points.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn missing_reference_falls_back_to_straight_default() {
        let mut arrow = normalize(ElementDraft {
            element_type: Some("arrow".into()),
            x: Some(10.0),
            y: Some(20.0),
            start: Some(EndpointRef { id: "ghost".into() }),
            ..Default::default()
        })
        .unwrap();

        resolve_batch(std::slice::from_mut(&mut arrow), &[]);

        assert!(arrow.start_binding.is_none());
        assert_eq!(arrow.x, 10.0);
        assert_eq!(arrow.y, 20.0);
    }

    #[test]
    fn diamond_attachment_lies_on_rhombus() {
        let d = rect("D", 0.0, 0.0, 100.0, 100.0);
        let mut diamond = d.clone();
        diamond.element_type = ElementType::Diamond;
        let edge = edge_attachment(&diamond, (200.0, 50.0));
        // Moving straight right from center (50,50) should hit the rhombus
        // at its right vertex (100, 50).
        assert!((edge.0 - 100.0).abs() < 1e-6);
        assert!((edge.1 - 50.0).abs() < 1e-6);
    }
}
