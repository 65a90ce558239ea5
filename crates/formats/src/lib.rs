pub mod geojson;
pub mod topology;

pub use geojson::*;
pub use topology::*;
