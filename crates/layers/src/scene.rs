use std::fmt::Write;

use foundation::Viewport;
use foundation::math::Vec2;

use crate::layer::{LayerKind, PathLayer};
use crate::style::LayerStyle;

const CLIP_ID: &str = "globe-clip";

/// Ocean fill and outline shape.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Backdrop {
    /// Disk maps clip their content to the disk.
    Disk { center: Vec2, radius: f64 },
    Rect { width: f64, height: f64 },
}

/// Everything one map draws, already in screen space.
#[derive(Debug, Clone, PartialEq)]
pub struct MapScene {
    pub viewport: Viewport,
    pub backdrop: Backdrop,
    pub land: PathLayer,
    pub graticule: PathLayer,
    pub indicators: PathLayer,
}

impl MapScene {
    pub fn new(viewport: Viewport, backdrop: Backdrop) -> Self {
        Self {
            viewport,
            backdrop,
            land: PathLayer::new(LayerKind::Land),
            graticule: PathLayer::new(LayerKind::Graticule),
            indicators: PathLayer::new(LayerKind::Tissot),
        }
    }

    /// Paint order, bottom to top.
    pub fn layers(&self) -> [&PathLayer; 3] {
        [&self.land, &self.graticule, &self.indicators]
    }

    pub fn layer(&self, kind: LayerKind) -> &PathLayer {
        match kind {
            LayerKind::Land => &self.land,
            LayerKind::Graticule => &self.graticule,
            LayerKind::Tissot => &self.indicators,
        }
    }

    pub fn to_svg(&self) -> String {
        let (w, h) = (num(self.viewport.width), num(self.viewport.height));
        let mut svg = String::new();
        let _ = write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
        );

        let clip = match self.backdrop {
            Backdrop::Disk { center, radius } => {
                let circle = format!(
                    r#"cx="{}" cy="{}" r="{}""#,
                    num(center.x),
                    num(center.y),
                    num(radius)
                );
                let _ = write!(
                    svg,
                    r#"<defs><clipPath id="{CLIP_ID}"><circle {circle}/></clipPath></defs>"#
                );
                let _ = write!(
                    svg,
                    r#"<circle class="ocean" {circle}{}/>"#,
                    LayerStyle::OCEAN.svg_attributes()
                );
                Some(circle)
            }
            Backdrop::Rect { width, height } => {
                let _ = write!(
                    svg,
                    r#"<rect class="ocean" width="{}" height="{}"{}/>"#,
                    num(width),
                    num(height),
                    LayerStyle::OCEAN.svg_attributes()
                );
                None
            }
        };

        if clip.is_some() {
            let _ = write!(svg, r#"<g clip-path="url(#{CLIP_ID})">"#);
        }
        for layer in self.layers() {
            write_layer(&mut svg, layer);
        }
        if clip.is_some() {
            svg.push_str("</g>");
        }

        let outline = LayerStyle::OUTLINE.svg_attributes();
        match (&clip, self.backdrop) {
            (Some(circle), _) => {
                let _ = write!(svg, r#"<circle class="outline" {circle}{outline}/>"#);
            }
            (None, Backdrop::Rect { width, height }) => {
                let _ = write!(
                    svg,
                    r#"<rect class="outline" width="{}" height="{}"{outline}/>"#,
                    num(width),
                    num(height)
                );
            }
            (None, Backdrop::Disk { .. }) => {}
        }

        svg.push_str("</svg>");
        svg
    }
}

fn write_layer(svg: &mut String, layer: &PathLayer) {
    let display = if layer.visible { "" } else { r#" display="none""# };
    let _ = write!(
        svg,
        r#"<g class="{}"{}{display}>"#,
        layer.kind.class_name(),
        layer.style.svg_attributes()
    );
    for d in &layer.paths {
        let _ = write!(svg, r#"<path d="{d}"/>"#);
    }
    svg.push_str("</g>");
}

fn num(v: f64) -> f64 {
    (v * 100.0).round() / 100.0 + 0.0
}
