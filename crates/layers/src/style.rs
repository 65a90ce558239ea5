/// SVG paint for one layer. `None` paints nothing.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayerStyle {
    pub fill: Option<&'static str>,
    pub stroke: Option<&'static str>,
    pub stroke_width: f64,
}

impl LayerStyle {
    pub const fn new(fill: Option<&'static str>, stroke: Option<&'static str>, stroke_width: f64) -> Self {
        Self {
            fill,
            stroke,
            stroke_width,
        }
    }

    pub const OCEAN: LayerStyle = LayerStyle::new(Some("#1e3a5f"), None, 0.0);
    pub const LAND: LayerStyle = LayerStyle::new(Some("#d4d4d8"), Some("#a1a1aa"), 0.5);
    pub const GRATICULE: LayerStyle =
        LayerStyle::new(None, Some("rgba(255, 255, 255, 0.15)"), 0.5);
    pub const TISSOT: LayerStyle = LayerStyle::new(
        Some("rgba(239, 68, 68, 0.15)"),
        Some("rgba(239, 68, 68, 0.4)"),
        0.5,
    );
    pub const OUTLINE: LayerStyle = LayerStyle::new(None, Some("rgba(255, 255, 255, 0.3)"), 1.5);

    /// `fill`, `stroke` and `stroke-width` attributes, each with a leading space.
    pub fn svg_attributes(&self) -> String {
        let mut out = format!(" fill=\"{}\"", self.fill.unwrap_or("none"));
        if let Some(stroke) = self.stroke {
            out.push_str(&format!(
                " stroke=\"{stroke}\" stroke-width=\"{}\"",
                self.stroke_width
            ));
        }
        out
    }
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self::new(None, Some("#000"), 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::LayerStyle;

    #[test]
    fn attributes_cover_fill_and_stroke() {
        assert_eq!(
            LayerStyle::LAND.svg_attributes(),
            r##" fill="#d4d4d8" stroke="#a1a1aa" stroke-width="0.5""##
        );
        assert_eq!(LayerStyle::OCEAN.svg_attributes(), r##" fill="#1e3a5f""##);
        assert!(LayerStyle::GRATICULE.svg_attributes().starts_with(" fill=\"none\""));
    }
}
