//! One projected map: projection state, rendered layers, click inversion and
//! recenter animation.

use std::marker::PhantomData;
use std::sync::Arc;

use foundation::math::{nearest_longitude, wrap_longitude, LonLat, Projection, Vec2};
use foundation::time::Time;
use foundation::Viewport;
use formats::FeatureCollection;
use layers::graticule::graticule10;
use layers::{GeoPath, MapScene, TissotGrid, TissotIndicator};
use runtime::{TimerHandle, Timers, Tween};
use tracing::debug;

use crate::projection::{EqualArea, MapProjection, Mercator};
use crate::state::{MapControls, MapKind};

pub const ANIMATION_DURATION_S: f64 = 0.8;
/// Recenters closer than this on both axes are ignored.
pub const RECENTER_TOLERANCE_DEG: f64 = 0.01;

pub type EqualAreaMap = MapRenderer<EqualArea>;
pub type MercatorMap = MapRenderer<Mercator>;

struct Animation {
    tween: Tween<2>,
    timer: TimerHandle,
}

pub struct MapRenderer<M: MapProjection> {
    projection: Projection<M::Raw>,
    viewport: Viewport,
    controls: MapControls,
    grid: TissotGrid,
    world: Option<Arc<FeatureCollection>>,
    indicators: Option<Vec<TissotIndicator>>,
    graticule: Vec<Vec<LonLat>>,
    scene: MapScene,
    timers: Timers,
    animation: Option<Animation>,
    renders: u64,
    _kind: PhantomData<M>,
}

impl<M: MapProjection> MapRenderer<M> {
    /// Fit a fresh projection to `viewport`, focused on `center`. Nothing is
    /// drawn until world data is attached.
    pub fn mount(viewport: Viewport, center: LonLat, controls: MapControls, timers: Timers) -> Self {
        let mut projection = M::create();
        M::fit(&mut projection, viewport);
        M::set_focus(&mut projection, center.to_array());
        let scene = MapScene::new(viewport, M::backdrop(&projection, viewport));
        Self {
            projection,
            viewport,
            controls,
            grid: TissotGrid::default(),
            world: None,
            indicators: None,
            graticule: graticule10(),
            scene,
            timers,
            animation: None,
            renders: 0,
            _kind: PhantomData,
        }
    }

    pub fn new(viewport: Viewport) -> Self {
        Self::mount(viewport, LonLat::new(0.0, 0.0), MapControls::default(), Timers::new())
    }

    pub fn with_grid(mut self, grid: TissotGrid) -> Self {
        self.grid = grid;
        if self.indicators.is_some() {
            self.indicators = Some(grid.generate());
            self.render();
        }
        self
    }

    pub fn kind(&self) -> MapKind {
        M::KIND
    }

    pub fn projection(&self) -> &Projection<M::Raw> {
        &self.projection
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn controls(&self) -> MapControls {
        self.controls
    }

    pub fn scene(&self) -> &MapScene {
        &self.scene
    }

    pub fn indicators(&self) -> Option<&[TissotIndicator]> {
        self.indicators.as_deref()
    }

    /// Number of full scene rebuilds so far.
    pub fn render_count(&self) -> u64 {
        self.renders
    }

    pub fn focus(&self) -> LonLat {
        LonLat::from_array(M::focus(&self.projection))
    }

    pub fn has_data(&self) -> bool {
        self.world.is_some() && self.indicators.is_some()
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        M::fit(&mut self.projection, viewport);
        self.render();
    }

    pub fn attach_world(&mut self, world: Arc<FeatureCollection>) {
        self.world = Some(world);
        self.indicators = Some(self.grid.generate());
        self.render();
    }

    /// Show or hide the optional layers. Projection and paths are untouched.
    pub fn set_controls(&mut self, controls: MapControls) {
        self.controls = controls;
        self.scene.graticule.visible = controls.show_graticule;
        self.scene.indicators.visible = controls.show_tissot;
    }

    /// Rebuild every layer from the current projection. Does nothing until
    /// both boundary and indicator data are present.
    pub fn render(&mut self) {
        let (Some(world), Some(indicators)) = (&self.world, &self.indicators) else {
            return;
        };
        let path = GeoPath::new(&self.projection).with_extent(self.viewport.extent());

        let mut scene = MapScene::new(self.viewport, M::backdrop(&self.projection, self.viewport));
        scene.land.paths = path.features(world);
        scene.graticule.paths = vec![path.lines(&self.graticule)];
        scene.indicators.paths = indicators
            .iter()
            .map(|i| path.polygon(std::slice::from_ref(&i.ring)))
            .filter(|d| !d.is_empty())
            .collect();
        scene.graticule.visible = self.controls.show_graticule;
        scene.indicators.visible = self.controls.show_tissot;

        self.scene = scene;
        self.renders += 1;
    }

    /// Geographic point under a screen position. `None` while animating or
    /// outside the map.
    pub fn click(&self, point: Vec2) -> Option<LonLat> {
        if self.is_animating() {
            return None;
        }
        let p = self.projection.invert(point)?;
        Some(LonLat::new(wrap_longitude(p.lon), p.lat))
    }

    /// Start moving toward `target`. Returns whether an animation started.
    ///
    /// A running animation is always stopped, even when the target is
    /// already in view. Before data arrives the projection
    /// jumps straight to the target.
    pub fn recenter(&mut self, target: LonLat, now: Time) -> bool {
        self.animation = None;
        let from = M::focus(&self.projection);
        let to = [nearest_longitude(from[0], target.lon), target.lat];
        if (to[0] - from[0]).abs() < RECENTER_TOLERANCE_DEG
            && (to[1] - from[1]).abs() < RECENTER_TOLERANCE_DEG
        {
            return false;
        }

        if !self.has_data() {
            M::set_focus(&mut self.projection, [wrap_longitude(to[0]), to[1]]);
            return false;
        }

        debug!(map = M::KIND.as_str(), ?from, ?to, "recenter");
        self.animation = Some(Animation {
            tween: Tween::new(from, to, ANIMATION_DURATION_S),
            timer: self.timers.start(now),
        });
        true
    }

    /// Step a running animation to `now`. Returns whether anything moved.
    pub fn advance(&mut self, now: Time) -> bool {
        let Some(animation) = &self.animation else {
            return false;
        };
        let elapsed = animation.timer.elapsed(now);
        let finished = animation.tween.is_finished(elapsed);
        let mut focus = animation.tween.sample(elapsed);
        if finished {
            focus[0] = wrap_longitude(focus[0]);
            self.animation = None;
        }
        M::set_focus(&mut self.projection, focus);
        self.render();
        true
    }

    /// Release the animation timer.
    pub fn teardown(&mut self) {
        self.animation = None;
    }

    pub fn to_svg(&self) -> String {
        self.scene.to_svg()
    }
}

/// Render one map at a fixed focus without animation.
pub fn render_svg(
    kind: MapKind,
    viewport: Viewport,
    center: LonLat,
    controls: MapControls,
    grid: TissotGrid,
    world: Arc<FeatureCollection>,
) -> String {
    fn draw<M: MapProjection>(
        viewport: Viewport,
        center: LonLat,
        controls: MapControls,
        grid: TissotGrid,
        world: Arc<FeatureCollection>,
    ) -> String {
        let mut map = MapRenderer::<M>::mount(viewport, center, controls, Timers::new()).with_grid(grid);
        map.attach_world(world);
        map.to_svg()
    }
    match kind {
        MapKind::EqualArea => draw::<EqualArea>(viewport, center, controls, grid, world),
        MapKind::Mercator => draw::<Mercator>(viewport, center, controls, grid, world),
    }
}

/// Geographic point under `point` on a map focused on `center`.
pub fn invert_point(kind: MapKind, viewport: Viewport, center: LonLat, point: Vec2) -> Option<LonLat> {
    let controls = MapControls::default();
    match kind {
        MapKind::EqualArea => EqualAreaMap::mount(viewport, center, controls, Timers::new()).click(point),
        MapKind::Mercator => MercatorMap::mount(viewport, center, controls, Timers::new()).click(point),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use formats::{Feature, FeatureCollection, Geometry};
    use foundation::math::{LonLat, Vec2};
    use foundation::time::Time;
    use foundation::Viewport;
    use layers::TissotGrid;
    use pretty_assertions::assert_eq;
    use runtime::Timers;

    use super::{invert_point, render_svg, EqualAreaMap, MercatorMap, ANIMATION_DURATION_S};
    use crate::state::{MapControls, MapKind};

    fn square_world() -> Arc<FeatureCollection> {
        let ring = vec![
            LonLat::new(0.0, 0.0),
            LonLat::new(10.0, 0.0),
            LonLat::new(10.0, 10.0),
            LonLat::new(0.0, 10.0),
            LonLat::new(0.0, 0.0),
        ];
        Arc::new(FeatureCollection::new(vec![Feature::new(Geometry::Polygon(vec![ring]))]))
    }

    fn equal_area(timers: &Timers) -> EqualAreaMap {
        let mut map = EqualAreaMap::mount(
            Viewport::new(420.0, 420.0),
            LonLat::new(0.0, 0.0),
            MapControls::default(),
            timers.clone(),
        );
        map.attach_world(square_world());
        map
    }

    #[test]
    fn nothing_renders_without_data() {
        let mut map = MercatorMap::new(Viewport::new(600.0, 400.0));
        map.render();
        assert_eq!(map.render_count(), 0);
        assert!(map.scene().land.is_empty());
        map.attach_world(square_world());
        assert_eq!(map.render_count(), 1);
        assert_eq!(map.scene().land.paths.len(), 1);
        assert_eq!(map.indicators().map(|i| i.len()), Some(162));
    }

    #[test]
    fn render_is_idempotent() {
        let timers = Timers::new();
        let mut map = equal_area(&timers);
        let before = map.scene().clone();
        map.render();
        assert_eq!(map.scene(), &before);
    }

    #[test]
    fn tiny_recenter_starts_no_timer() {
        let timers = Timers::new();
        let mut map = equal_area(&timers);
        let before = map.scene().clone();
        assert!(!map.recenter(LonLat::new(0.005, -0.009), Time(1.0)));
        assert_eq!(timers.started(), 0);
        assert!(!map.is_animating());
        assert_eq!(map.scene(), &before);
    }

    #[test]
    fn clicking_the_center_returns_the_focus() {
        let timers = Timers::new();
        let mut map = equal_area(&timers);
        map.recenter(LonLat::new(139.7, 35.7), Time(0.0));
        map.advance(Time(ANIMATION_DURATION_S));
        assert!(!map.is_animating());

        let center = map.projection().translate();
        let hit = map.click(center).expect("inside the disk");
        assert!((hit.lon - 139.7).abs() < 1e-9);
        assert!((hit.lat - 35.7).abs() < 1e-9);

        // Corners of a square viewport fall outside the disk.
        assert!(map.click(Vec2::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn animation_eases_and_releases_its_timer() {
        let timers = Timers::new();
        let mut map = equal_area(&timers);
        assert!(map.recenter(LonLat::new(40.0, 20.0), Time(2.0)));
        assert_eq!(timers.active(), 1);

        // Clicks are ignored mid-flight.
        assert!(map.click(map.projection().translate()).is_none());

        map.advance(Time(2.4));
        let halfway = map.focus();
        assert!((halfway.lon - 20.0).abs() < 1e-9);
        assert!((halfway.lat - 10.0).abs() < 1e-9);

        map.advance(Time(3.0));
        assert!(!map.is_animating());
        assert_eq!(timers.active(), 0);
        assert_eq!(map.focus(), LonLat::new(40.0, 20.0));
    }

    #[test]
    fn new_recenter_supersedes_running_one() {
        let timers = Timers::new();
        let mut map = equal_area(&timers);
        map.recenter(LonLat::new(40.0, 20.0), Time(0.0));
        map.advance(Time(0.2));
        map.recenter(LonLat::new(-60.0, -10.0), Time(0.2));
        assert_eq!(timers.started(), 2);
        assert_eq!(timers.active(), 1);
        map.teardown();
        assert_eq!(timers.active(), 0);
    }

    #[test]
    fn travels_the_short_way_across_the_antimeridian() {
        let timers = Timers::new();
        let mut map = MercatorMap::mount(
            Viewport::new(720.0, 360.0),
            LonLat::new(170.0, 0.0),
            MapControls::default(),
            timers.clone(),
        );
        map.attach_world(square_world());
        map.recenter(LonLat::new(-170.0, 0.0), Time(0.0));
        map.advance(Time(ANIMATION_DURATION_S / 2.0));
        assert!((map.focus().lon - 180.0).abs() < 1e-9);
        map.advance(Time(ANIMATION_DURATION_S));
        assert!((map.focus().lon + 170.0).abs() < 1e-9);
    }

    #[test]
    fn recenter_before_data_jumps() {
        let timers = Timers::new();
        let mut map = EqualAreaMap::mount(
            Viewport::new(300.0, 300.0),
            LonLat::new(0.0, 0.0),
            MapControls::default(),
            timers.clone(),
        );
        assert!(!map.recenter(LonLat::new(10.0, 5.0), Time(0.0)));
        assert_eq!(timers.started(), 0);
        assert_eq!(map.focus(), LonLat::new(10.0, 5.0));
    }

    #[test]
    fn toggling_graticule_keeps_other_layers() {
        let timers = Timers::new();
        let mut map = equal_area(&timers);
        let land = map.scene().land.clone();
        let indicators = map.scene().indicators.clone();
        let renders = map.render_count();

        let mut controls = map.controls();
        controls.show_graticule = false;
        map.set_controls(controls);
        assert!(!map.scene().graticule.visible);
        controls.show_graticule = true;
        map.set_controls(controls);

        assert!(map.scene().graticule.visible);
        assert_eq!(map.scene().land, land);
        assert_eq!(map.scene().indicators, indicators);
        assert_eq!(map.render_count(), renders);
    }

    #[test]
    fn resize_refits() {
        let timers = Timers::new();
        let mut map = equal_area(&timers);
        map.resize(Viewport::new(840.0, 630.0));
        assert!((map.projection().scale() - 630.0 / 4.2).abs() < 1e-9);
        assert!(map.to_svg().contains(r#"width="840""#));
    }

    #[test]
    fn one_shot_render_and_invert() {
        let controls = MapControls {
            show_tissot: true,
            show_graticule: false,
        };
        let svg = render_svg(
            MapKind::Mercator,
            Viewport::new(600.0, 400.0),
            LonLat::new(0.0, 0.0),
            controls,
            TissotGrid::uniform(40.0, 5.0),
            square_world(),
        );
        assert!(svg.contains(r#"<rect class="ocean""#));
        assert!(svg.contains(r#"class="graticule""#));

        let hit = invert_point(
            MapKind::Mercator,
            Viewport::new(600.0, 400.0),
            LonLat::new(30.0, 0.0),
            Vec2::new(300.0, 200.0),
        )
        .expect("inside");
        assert!((hit.lon - 30.0).abs() < 1e-9 && hit.lat.abs() < 1e-9);
        assert_eq!(
            invert_point(
                MapKind::EqualArea,
                Viewport::new(400.0, 400.0),
                LonLat::new(0.0, 0.0),
                Vec2::new(0.0, 0.0),
            ),
            None
        );
    }

    #[test]
    fn recenter_back_to_the_start_cancels_the_tween() {
        let timers = Timers::new();
        let mut map = equal_area(&timers);
        assert!(map.recenter(LonLat::new(40.0, 20.0), Time(0.0)));
        assert!(!map.recenter(LonLat::new(0.0, 0.0), Time(0.0)));
        assert!(!map.is_animating());
        assert_eq!(timers.active(), 0);

        assert!(!map.advance(Time(1.0)));
        assert_eq!(map.focus(), LonLat::new(0.0, 0.0));
    }

    #[test]
    fn empty_world_still_draws_the_frame() {
        let mut map = EqualAreaMap::new(Viewport::new(420.0, 420.0));
        map.attach_world(Arc::new(FeatureCollection::default()));
        assert!(map.has_data());
        assert!(map.scene().land.paths.is_empty());
        assert_eq!(map.scene().graticule.paths.len(), 1);
        assert!(!map.scene().indicators.paths.is_empty());

        let svg = map.to_svg();
        assert!(svg.contains(r#"<circle class="ocean""#));
        assert!(svg.contains(r#"<circle class="outline""#));
        assert!(svg.contains(r#"class="graticule""#));
    }
}
