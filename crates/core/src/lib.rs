pub mod binding;
pub mod element;
pub mod error;
pub mod normalize;
pub mod scene;
pub mod search;
pub mod store;

pub use element::{Binding, Element, ElementDraft, ElementType, EndpointRef};
pub use error::{Error, Result};
pub use scene::Scene;
pub use search::SearchQuery;
pub use store::{SceneStore, Snapshot, SnapshotSummary};
