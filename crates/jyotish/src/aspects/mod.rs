pub mod calculator;
pub mod types;

pub use calculator::{TransitAnalyzer, EXACT_ORB};
pub use types::{AspectKind, TransitAspect};
