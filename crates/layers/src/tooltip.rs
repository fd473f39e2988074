//! Hover tooltip: content for links and gauges, placement at the pointer.

use formats::state_variable;
use foundation::math::{Vec2, format_significant, round_to};
use foundation::{LonLat, wrap_lon_once};
use scene::{Element, GroupId, Shape, Style, TextAnchor, World};
use streaming::{GaugeRecord, LinkRecord};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TooltipContent {
    pub lines: Vec<String>,
}

fn fixed2(p: LonLat) -> String {
    format!("{:.2}, {:.2}", p.lon, p.lat)
}

impl TooltipContent {
    /// Link id, first and last vertex, and the active variable's value.
    pub fn for_link(record: &LinkRecord, variable: &str) -> Self {
        let mut lines = vec![format!("LinkID: {}", record.link_id)];
        if let Some(line) = &record.line {
            lines.push(format!("Src: {}", fixed2(line.first())));
            lines.push(format!("Dst: {}", fixed2(line.last())));
        }
        if let Some(v) = record.value(variable) {
            let units = state_variable(variable).short_units;
            let value = format_significant(v, 3);
            if units.is_empty() {
                lines.push(format!("Value: {value}"));
            } else {
                lines.push(format!("Value: {value} {units}"));
            }
        }
        Self { lines }
    }

    pub fn for_gauge(record: &GaugeRecord) -> Self {
        let loc = record.location();
        Self {
            lines: vec![
                format!(
                    "Gauge Location: ({}, {})",
                    round_to(wrap_lon_once(loc.lon), 2),
                    round_to(loc.lat, 2)
                ),
                format!("LinkID: {}", record.link_id),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tooltip {
    content: Option<TooltipContent>,
    /// Client coordinates of the last pointer move.
    position: Vec2,
}

const LINE_HEIGHT: f64 = 14.0;
const FONT_SIZE: f64 = 11.0;
const CHAR_WIDTH: f64 = 6.0;
const PADDING: f64 = 4.0;

impl Tooltip {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display(&mut self, content: TooltipContent) {
        self.content = Some(content);
    }

    pub fn move_to(&mut self, client: Vec2) {
        self.position = client;
    }

    pub fn hide(&mut self) {
        self.content = None;
    }

    pub fn is_visible(&self) -> bool {
        self.content.is_some()
    }

    pub fn content(&self) -> Option<&TooltipContent> {
        self.content.as_ref()
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Redraws the tooltip box into `group`, anchored at its top-left corner.
    pub fn render(&self, world: &mut World, group: GroupId) {
        world.clear_group(group);
        let Some(content) = &self.content else {
            return;
        };
        let longest = content.lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let width = longest as f64 * CHAR_WIDTH + 2.0 * PADDING;
        let height = content.lines.len() as f64 * LINE_HEIGHT + 2.0 * PADDING;
        let mut background = Style::filled("white").with_opacity(0.9);
        background.stroke = Some("grey".to_string());
        background.stroke_width = 0.5;
        world.spawn(
            group,
            Element::new(
                Shape::Rect {
                    origin: self.position,
                    width,
                    height,
                },
                background,
            ),
        );
        for (i, line) in content.lines.iter().enumerate() {
            let at = Vec2::new(
                self.position.x + PADDING,
                self.position.y + PADDING + (i + 1) as f64 * LINE_HEIGHT - 3.0,
            );
            world.spawn(
                group,
                Element::new(
                    Shape::text(at, line.clone(), TextAnchor::Start),
                    Style::filled("black").with_font_size(FONT_SIZE),
                ),
            );
        }
    }
}
