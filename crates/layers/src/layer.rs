use crate::style::LayerStyle;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LayerKind {
    Land,
    Graticule,
    Tissot,
}

impl LayerKind {
    pub fn class_name(self) -> &'static str {
        match self {
            LayerKind::Land => "land",
            LayerKind::Graticule => "graticule",
            LayerKind::Tissot => "tissot",
        }
    }

    pub fn default_style(self) -> LayerStyle {
        match self {
            LayerKind::Land => LayerStyle::LAND,
            LayerKind::Graticule => LayerStyle::GRATICULE,
            LayerKind::Tissot => LayerStyle::TISSOT,
        }
    }
}

/// Projected SVG path data for one layer. Hidden layers keep their paths so
/// toggling visibility never re-projects.
#[derive(Debug, Clone, PartialEq)]
pub struct PathLayer {
    pub kind: LayerKind,
    pub style: LayerStyle,
    pub visible: bool,
    pub paths: Vec<String>,
}

impl PathLayer {
    pub fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            style: kind.default_style(),
            visible: true,
            paths: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
