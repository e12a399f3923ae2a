pub mod adapter;
pub mod analytical;
pub mod handle;
pub mod provider;
pub mod types;

pub use adapter::{PrimaryEphemeris, SwissEphemerisAdapter};
pub use analytical::AnalyticalEphemeris;
pub use handle::{EphemerisHandle, DEFAULT_EPHEMERIS_PATHS};
pub use provider::{EphemerisProvider, PositionSource};
pub use types::{Body, EphemerisSource, GeoLocation, RawHouses, TropicalPosition};
