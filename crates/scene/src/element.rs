use foundation::math::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

impl TextAnchor {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// One or more polylines; closed parts are rings.
    Path { parts: Vec<Vec<Vec2>>, closed: bool },
    Circle { center: Vec2, r: f64 },
    Rect { origin: Vec2, width: f64, height: f64 },
    Line { from: Vec2, to: Vec2 },
    Text { at: Vec2, text: String, anchor: TextAnchor },
}

impl Shape {
    pub fn polyline(points: Vec<Vec2>) -> Self {
        Shape::Path {
            parts: vec![points],
            closed: false,
        }
    }

    pub fn text(at: Vec2, text: impl Into<String>, anchor: TextAnchor) -> Self {
        Shape::Text {
            at,
            text: text.into(),
            anchor,
        }
    }
}

/// Presentation attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub stroke: Option<String>,
    pub stroke_width: f64,
    pub fill: Option<String>,
    pub opacity: f64,
    pub font_size: Option<f64>,
    pub class: Option<String>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            stroke: None,
            stroke_width: 0.0,
            fill: None,
            opacity: 1.0,
            font_size: None,
            class: None,
        }
    }
}

impl Style {
    pub fn stroked(color: impl Into<String>, width: f64) -> Self {
        Self {
            stroke: Some(color.into()),
            stroke_width: width,
            ..Self::default()
        }
    }

    pub fn filled(color: impl Into<String>) -> Self {
        Self {
            fill: Some(color.into()),
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = Some(size);
        self
    }
}

/// Interaction state that lives on the element, not in the data.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RuntimeState {
    pub hovered: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub shape: Shape,
    pub style: Style,
    pub visible: bool,
    pub runtime: RuntimeState,
}

impl Element {
    pub fn new(shape: Shape, style: Style) -> Self {
        Self {
            shape,
            style,
            visible: true,
            runtime: RuntimeState::default(),
        }
    }
}
