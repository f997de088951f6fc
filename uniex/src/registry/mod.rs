/// Certified/pro classification and priority tiers, derived from static tables.
pub mod classification;

/// Cross-exchange capability queries over loaded specs.
pub mod discovery;

pub use classification::{ClassificationCounts, PriorityTier, Registry, registry};
pub use discovery::{all_capabilities, compare, which_support, which_support_all};
