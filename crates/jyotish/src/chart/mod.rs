pub mod cache;
pub mod natal;
pub mod validator;

pub use cache::{chart_key, ChartCache, TransitCache};
pub use natal::{ChartEngine, NatalChart, SiderealPosition, SkySnapshot};
pub use validator::{ChartValidator, CriticalFailure, QualityReport};
