use crate::math::Vec2;

/// Axis-aligned bounding box in screen space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    /// Smallest box containing every point, or `None` for an empty input.
    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut b = Aabb2::new([first.x, first.y], [first.x, first.y]);
        for p in iter {
            b.min[0] = b.min[0].min(p.x);
            b.min[1] = b.min[1].min(p.y);
            b.max[0] = b.max[0].max(p.x);
            b.max[1] = b.max[1].max(p.y);
        }
        Some(b)
    }

    pub fn intersects(&self, other: &Aabb2) -> bool {
        self.min[0] <= other.max[0]
            && self.max[0] >= other.min[0]
            && self.min[1] <= other.max[1]
            && self.max[1] >= other.min[1]
    }
}

/// Pixel size of a map drawing area.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn min_dimension(&self) -> f64 {
        self.width.min(self.height)
    }

    pub fn extent(&self) -> Aabb2 {
        Aabb2::new([0.0, 0.0], [self.width, self.height])
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(960.0, 600.0)
    }
}
