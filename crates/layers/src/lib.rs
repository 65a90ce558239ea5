pub mod circle;
pub mod graticule;
pub mod layer;
pub mod path;
pub mod scene;
pub mod style;
pub mod tissot;

pub use layer::*;
pub use path::GeoPath;
pub use scene::{Backdrop, MapScene};
pub use style::LayerStyle;
pub use tissot::{TissotGrid, TissotIndicator};
