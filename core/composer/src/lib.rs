pub mod api;
pub mod composer;
pub mod source;

pub use api::{router, AppState};
pub use composer::InsightComposer;
pub use source::{HttpSource, MemorySource, SnapshotSource, SourceError};
