//! How each map kind fits its projection to a viewport and expresses a
//! focal point.

use std::f64::consts::TAU;

use foundation::math::{
    AzimuthalEqualAreaRaw, LonLat, MercatorRaw, Projection, RawProjection, azimuthal_equal_area,
    mercator,
};
use foundation::Viewport;
use layers::Backdrop;

use crate::state::MapKind;

/// Radius of the equal-area world disk in raw units (`2 sin 90°`).
pub const BOUNDARY_FACTOR: f64 = 2.0;
/// Leaves a small margin around the disk.
const DISK_PADDING: f64 = 2.1;

pub trait MapProjection {
    type Raw: RawProjection + Clone + std::fmt::Debug;
    const KIND: MapKind;

    fn create() -> Projection<Self::Raw>;

    /// Size the projection to the viewport. Leaves the focal point alone.
    fn fit(projection: &mut Projection<Self::Raw>, viewport: Viewport);

    /// Current focal point as `[lon, lat]`.
    fn focus(projection: &Projection<Self::Raw>) -> [f64; 2];

    fn set_focus(projection: &mut Projection<Self::Raw>, focus: [f64; 2]);

    fn backdrop(projection: &Projection<Self::Raw>, viewport: Viewport) -> Backdrop;
}

/// Lambert azimuthal equal-area disk, focused by rotation.
#[derive(Debug, Copy, Clone)]
pub struct EqualArea;

impl MapProjection for EqualArea {
    type Raw = AzimuthalEqualAreaRaw;
    const KIND: MapKind = MapKind::EqualArea;

    fn create() -> Projection<Self::Raw> {
        let mut projection = azimuthal_equal_area();
        projection.set_clip_angle(Some(180.0));
        projection
    }

    fn fit(projection: &mut Projection<Self::Raw>, viewport: Viewport) {
        projection.set_translate(viewport.center());
        projection.set_scale(viewport.min_dimension() / (BOUNDARY_FACTOR * DISK_PADDING));
    }

    fn focus(projection: &Projection<Self::Raw>) -> [f64; 2] {
        let [lambda, phi, _] = projection.rotation();
        [-lambda + 0.0, -phi + 0.0]
    }

    fn set_focus(projection: &mut Projection<Self::Raw>, focus: [f64; 2]) {
        projection.set_rotation([-focus[0], -focus[1], 0.0]);
    }

    fn backdrop(projection: &Projection<Self::Raw>, _viewport: Viewport) -> Backdrop {
        Backdrop::Disk {
            center: projection.translate(),
            radius: BOUNDARY_FACTOR * projection.scale(),
        }
    }
}

/// Web-style Mercator rectangle, focused by its center.
#[derive(Debug, Copy, Clone)]
pub struct Mercator;

impl MapProjection for Mercator {
    type Raw = MercatorRaw;
    const KIND: MapKind = MapKind::Mercator;

    fn create() -> Projection<Self::Raw> {
        mercator()
    }

    fn fit(projection: &mut Projection<Self::Raw>, viewport: Viewport) {
        projection.set_translate(viewport.center());
        projection.set_scale(viewport.width / TAU);
    }

    fn focus(projection: &Projection<Self::Raw>) -> [f64; 2] {
        projection.center().to_array()
    }

    fn set_focus(projection: &mut Projection<Self::Raw>, focus: [f64; 2]) {
        projection.set_center(LonLat::from_array(focus));
    }

    fn backdrop(_projection: &Projection<Self::Raw>, viewport: Viewport) -> Backdrop {
        Backdrop::Rect {
            width: viewport.width,
            height: viewport.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EqualArea, MapProjection, Mercator};
    use foundation::math::LonLat;
    use foundation::Viewport;
    use layers::Backdrop;

    #[test]
    fn equal_area_disk_fits_the_short_side() {
        let mut p = EqualArea::create();
        EqualArea::fit(&mut p, Viewport::new(630.0, 420.0));
        match EqualArea::backdrop(&p, Viewport::new(630.0, 420.0)) {
            Backdrop::Disk { center, radius } => {
                assert_eq!((center.x, center.y), (315.0, 210.0));
                assert!((radius - 200.0).abs() < 1e-9);
            }
            other => panic!("unexpected backdrop {other:?}"),
        }
    }

    #[test]
    fn focus_round_trips() {
        let mut ea = EqualArea::create();
        EqualArea::set_focus(&mut ea, [139.7, 35.7]);
        assert_eq!(EqualArea::focus(&ea), [139.7, 35.7]);
        let c = ea.project(LonLat::new(139.7, 35.7)).expect("visible");
        assert!((c.x - ea.translate().x).abs() < 1e-9);

        let mut m = Mercator::create();
        Mercator::fit(&mut m, Viewport::new(628.0, 400.0));
        Mercator::set_focus(&mut m, [-74.0, 40.7]);
        assert_eq!(Mercator::focus(&m), [-74.0, 40.7]);
        assert!((m.scale() - 628.0 / std::f64::consts::TAU).abs() < 1e-12);
    }
}
