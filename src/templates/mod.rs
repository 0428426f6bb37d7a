//! Template boilerplate detection: persistence, harvesting, and similarity matching.

pub mod harvest;
pub mod matcher;
pub mod similarity;
pub mod store;
pub mod types;

pub use harvest::harvest_templates;
pub use matcher::{best_match, best_match_with};
pub use similarity::{SimilarityOptions, ratio, ratio_with};
pub use store::{load_templates, save_templates};
pub use types::{MatchResult, StorePresence, Template, TemplateStoreError};
