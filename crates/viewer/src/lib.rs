//! Interactive state for the two synchronized maps: renderers, the parent
//! view, the search panel and the async collaborators it talks to.

pub mod app;
pub mod geocode;
pub mod projection;
pub mod renderer;
pub mod search;
pub mod state;
pub mod world;

pub use app::PerspectiveView;
pub use geocode::{GeocodeError, Geocoder, NominatimGeocoder, ProxyGeocoder};
pub use renderer::{invert_point, render_svg, EqualAreaMap, MapRenderer, MercatorMap};
pub use search::{Key, LookupTicket, SearchPanel};
pub use state::*;
pub use world::{WorldCache, WorldLoadError, WorldSource};
