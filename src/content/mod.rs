//! Content records and their editorial lifecycle.

pub mod analysis;
pub mod errors;
pub mod lifecycle;
pub mod manager;
pub mod model;

pub use analysis::analyze_content;
pub use errors::ContentError;
pub use lifecycle::Transition;
pub use manager::{BulkOutcome, ContentManager};
pub use model::*;
