//! Shared create/batch orchestration used by the REST facade, the WebSocket
//! facade, and the Tool Gateway alike — each pushes an [`ElementDraft`]
//! through the Normalizer and (for arrows/lines) the Arrow Binding Resolver
//! before it ever reaches the Scene Store.

use canvas_core::{binding, normalize, Element, ElementDraft, SceneStore};

use crate::error::ApiError;

/// Normalize one draft, resolve it against everything already stored, and
/// insert it. Mirrors the single-element path of `POST /api/elements`.
pub fn create_one(store: &mut SceneStore, draft: ElementDraft) -> Result<Element, ApiError> {
    let mut element = normalize::normalize(draft)?;
    if element.element_type.is_linear() && element.has_pending_endpoints() {
        let mut batch = [element];
        binding::resolve_batch(&mut batch, store.list());
        element = batch.into_iter().next().unwrap();
    }
    Ok(store.put(element))
}

/// Normalize every draft in `drafts`, then resolve arrow/line bindings
/// across the whole batch against the batch itself plus the existing store
/// (spec §4.6 batch semantics: intra-batch references resolve), then insert
/// all of them in order.
pub fn create_batch(
    store: &mut SceneStore,
    drafts: Vec<ElementDraft>,
) -> Result<Vec<Element>, ApiError> {
    let mut batch: Vec<Element> = drafts
        .into_iter()
        .map(normalize::normalize)
        .collect::<Result<_, _>>()?;
    binding::resolve_batch(&mut batch, store.list());
    for element in &batch {
        store.put(element.clone());
    }
    Ok(batch)
}

/// Normalize every draft in `drafts` and resolve bindings only against the
/// batch itself — used when the batch is about to wholesale replace the
/// store (`POST /api/elements/sync`, inbound `canvas_sync`), so there is no
/// "already stored" set to resolve against.
pub fn normalize_full_sync(drafts: Vec<ElementDraft>) -> Result<Vec<Element>, ApiError> {
    let mut batch: Vec<Element> = drafts
        .into_iter()
        .map(normalize::normalize)
        .collect::<Result<_, _>>()?;
    binding::resolve_batch(&mut batch, &[]);
    Ok(batch)
}
