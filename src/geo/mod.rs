pub mod distance;
pub mod grouper;

pub use distance::{distance_km, resolve};
pub use grouper::{city_group, GeoGrouping};
