//! The composite search predicate used by `GET /api/elements/search` and the
//! `query_elements` tool.

use crate::element::Element;

/// A conjunctive filter over the live scene (§4.6).
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Membership check against `type`/`types`.
    pub types: Vec<String>,
    /// Arbitrary `field == String(value)` equality checks, e.g.
    /// `strokeColor`, `backgroundColor`, `roughness`, `fillStyle`.
    pub field_equals: Vec<(String, String)>,
    pub min_width: Option<f64>,
    pub max_width: Option<f64>,
    pub min_height: Option<f64>,
    pub max_height: Option<f64>,
    pub text_contains: Option<String>,
}

impl SearchQuery {
    pub fn matches(&self, element: &Element) -> bool {
        if !self.types.is_empty() && !self.types.iter().any(|t| t == element.element_type.as_str())
        {
            return false;
        }

        if let Some(min) = self.min_width {
            if element.width < min {
                return false;
            }
        }
        if let Some(max) = self.max_width {
            if element.width > max {
                return false;
            }
        }
        if let Some(min) = self.min_height {
            if element.height < min {
                return false;
            }
        }
        if let Some(max) = self.max_height {
            if element.height > max {
                return false;
            }
        }

        if let Some(substr) = &self.text_contains {
            let text = element.text.as_deref().unwrap_or("");
            if !text.to_lowercase().contains(&substr.to_lowercase()) {
                return false;
            }
        }

        if !self.field_equals.is_empty() {
            let value = serde_json::to_value(element).unwrap_or_default();
            for (key, expected) in &self.field_equals {
                let Some(actual) = value.get(key) else {
                    return false;
                };
                if !json_as_string(actual).eq(expected) {
                    return false;
                }
            }
        }

        true
    }
}

/// Mirrors JS `String(element[key])` coercion: whole-valued numbers print
/// without a trailing `.0` (`String(1) === "1"`), not `serde_json`'s
/// `1.0`, so `?roughness=1` matches the default `1.0` roughness value.
fn json_as_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => match n.as_f64() {
            Some(f) if f == f.trunc() && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementDraft;
    use crate::normalize::normalize;

    #[test]
    fn composite_filter_matches_type_color_and_width() {
        let el = normalize(ElementDraft {
            element_type: Some("rectangle".into()),
            width: Some(200.0),
            stroke_color: Some("#ff0000".into()),
            ..Default::default()
        })
        .unwrap();

        let query = SearchQuery {
            types: vec!["rectangle".into()],
            field_equals: vec![("strokeColor".into(), "#ff0000".into())],
            min_width: Some(100.0),
            ..Default::default()
        };
        assert!(query.matches(&el));

        let mismatched = SearchQuery {
            min_width: Some(500.0),
            ..Default::default()
        };
        assert!(!mismatched.matches(&el));
    }

    #[test]
    fn whole_valued_float_field_matches_without_trailing_zero() {
        let el = normalize(ElementDraft {
            element_type: Some("rectangle".into()),
            ..Default::default()
        })
        .unwrap();
        let query = SearchQuery {
            field_equals: vec![("roughness".into(), "1".into())],
            ..Default::default()
        };
        assert!(query.matches(&el));
    }

    #[test]
    fn text_contains_is_case_insensitive() {
        let el = normalize(ElementDraft {
            element_type: Some("text".into()),
            text: Some("Hello World".into()),
            ..Default::default()
        })
        .unwrap();
        let query = SearchQuery {
            text_contains: Some("world".into()),
            ..Default::default()
        };
        assert!(query.matches(&el));
    }
}
