use std::sync::Arc;

use foundation::math::Vec2;
use foundation::time::Time;
use foundation::Viewport;
use formats::FeatureCollection;
use runtime::Timers;
use tracing::info;

use crate::geocode::GeocodeError;
use crate::renderer::{EqualAreaMap, MercatorMap};
use crate::search::{Key, LookupTicket, SearchPanel};
use crate::state::{GeocodingResult, MapCenter, MapControls, MapKind};

pub const INTRO: &str = "Every flat map distorts the Earth. Search for a place or click the globe \
to re-center both maps and see how the world looks different depending on what's at the center.";

/// Owns the shared center and controls and pushes every change to both maps.
pub struct PerspectiveView {
    center: MapCenter,
    controls: MapControls,
    equal_area: EqualAreaMap,
    mercator: MercatorMap,
    search: SearchPanel,
    timers: Timers,
}

impl PerspectiveView {
    pub fn new(equal_area: Viewport, mercator: Viewport) -> Self {
        Self::with_timers(equal_area, mercator, Timers::new())
    }

    pub fn with_timers(equal_area: Viewport, mercator: Viewport, timers: Timers) -> Self {
        let center = MapCenter::default();
        let controls = MapControls::default();
        Self {
            equal_area: EqualAreaMap::mount(equal_area, center.lon_lat(), controls, timers.clone()),
            mercator: MercatorMap::mount(mercator, center.lon_lat(), controls, timers.clone()),
            center,
            controls,
            search: SearchPanel::new(),
            timers,
        }
    }

    pub fn center(&self) -> &MapCenter {
        &self.center
    }

    pub fn controls(&self) -> MapControls {
        self.controls
    }

    pub fn equal_area(&self) -> &EqualAreaMap {
        &self.equal_area
    }

    pub fn mercator(&self) -> &MercatorMap {
        &self.mercator
    }

    pub fn search(&self) -> &SearchPanel {
        &self.search
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn svg(&self, kind: MapKind) -> String {
        match kind {
            MapKind::EqualArea => self.equal_area.to_svg(),
            MapKind::Mercator => self.mercator.to_svg(),
        }
    }

    pub fn attach_world(&mut self, world: Arc<FeatureCollection>) {
        info!(features = world.len(), "world attached");
        self.equal_area.attach_world(world.clone());
        self.mercator.attach_world(world);
    }

    pub fn resize(&mut self, kind: MapKind, viewport: Viewport) {
        match kind {
            MapKind::EqualArea => self.equal_area.resize(viewport),
            MapKind::Mercator => self.mercator.resize(viewport),
        }
    }

    /// Recenter both maps on the clicked point. Returns whether the click
    /// landed on the map.
    pub fn click(&mut self, kind: MapKind, point: Vec2, now: Time) -> bool {
        let hit = match kind {
            MapKind::EqualArea => self.equal_area.click(point),
            MapKind::Mercator => self.mercator.click(point),
        };
        let Some(hit) = hit else {
            return false;
        };
        self.set_center(MapCenter::new(hit.lon, hit.lat), now);
        true
    }

    pub fn select(&mut self, result: &GeocodingResult, now: Time) {
        let chosen = self.search.select(result);
        self.set_center(MapCenter::from(&chosen), now);
    }

    pub fn set_center(&mut self, center: MapCenter, now: Time) {
        self.equal_area.recenter(center.lon_lat(), now);
        self.mercator.recenter(center.lon_lat(), now);
        self.center = center;
    }

    pub fn set_controls(&mut self, controls: MapControls) {
        self.controls = controls;
        self.equal_area.set_controls(controls);
        self.mercator.set_controls(controls);
    }

    pub fn toggle_tissot(&mut self) {
        let mut controls = self.controls;
        controls.show_tissot = !controls.show_tissot;
        self.set_controls(controls);
    }

    pub fn toggle_graticule(&mut self) {
        let mut controls = self.controls;
        controls.show_graticule = !controls.show_graticule;
        self.set_controls(controls);
    }

    /// Step both animations. Returns whether either map moved.
    pub fn advance(&mut self, now: Time) -> bool {
        let a = self.equal_area.advance(now);
        let b = self.mercator.advance(now);
        a || b
    }

    pub fn is_animating(&self) -> bool {
        self.equal_area.is_animating() || self.mercator.is_animating()
    }

    pub fn search_input(&mut self, text: &str, now: Time) {
        self.search.input(text, now);
    }

    pub fn search_poll(&mut self, now: Time) -> Option<LookupTicket> {
        self.search.poll(now)
    }

    pub fn search_complete(
        &mut self,
        ticket: &LookupTicket,
        outcome: Result<Vec<GeocodingResult>, GeocodeError>,
    ) -> bool {
        self.search.complete(ticket, outcome)
    }

    /// Enter recenters on the top result.
    pub fn search_key(&mut self, key: Key, now: Time) -> Option<GeocodingResult> {
        let chosen = self.search.key(key)?;
        self.set_center(MapCenter::from(&chosen), now);
        Some(chosen)
    }

    pub fn search_focus(&mut self) {
        self.search.focus();
    }

    pub fn search_clear(&mut self) {
        self.search.clear();
    }

    pub fn caption(&self) -> String {
        if !self.center.is_custom() {
            return INTRO.to_string();
        }
        let place = match &self.center.label {
            Some(label) => label.clone(),
            None => format!("{:.1}, {:.1}", self.center.latitude, self.center.longitude),
        };
        format!(
            "Showing the world centered on {place}. Notice how countries change size and shape \
between the two projections."
        )
    }

    /// Stop both animations and release their timers.
    pub fn teardown(&mut self) {
        self.equal_area.teardown();
        self.mercator.teardown();
    }
}
