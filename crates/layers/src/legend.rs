//! Continuous color legend for the link layer.

use formats::StateVariableInfo;
use foundation::math::{Vec2, ZoomTransform, format_significant_padded, round_to};
use foundation::Aabb2;
use scene::{Element, GroupId, Shape, Style, TextAnchor, World};
use serde::{Deserialize, Serialize};
use streaming::{Aggregation, DaStage, Inflation};

use crate::symbology::warm;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendConfig {
    pub rect_width: f64,
    pub rect_min_height: f64,
    /// Height added across the ramp, from the first to the last rect.
    pub rect_height_growth: f64,
    pub rect_count: usize,
    pub num_ticks: usize,
    pub tick_height: f64,
    pub tick_font_size: f64,
    pub title_font_size: f64,
    pub subtitle_font_size: f64,
    pub title_vertical_offset: f64,
    /// Position as fractions of the plot rectangle.
    pub anchor: [f64; 2],
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            rect_width: 0.7,
            rect_min_height: 5.0,
            rect_height_growth: 20.0,
            rect_count: 256,
            num_ticks: 3,
            tick_height: 25.0,
            tick_font_size: 12.0,
            title_font_size: 15.0,
            subtitle_font_size: 12.0,
            title_vertical_offset: -40.0,
            anchor: [0.02, 0.9],
        }
    }
}

impl LegendConfig {
    pub fn ramp_width(&self) -> f64 {
        self.rect_width * self.rect_count as f64
    }

    /// Top-left corner of the legend for a given plot rectangle.
    pub fn position(&self, plot: Aabb2) -> Vec2 {
        Vec2::new(
            plot.min[0] + plot.width() * self.anchor[0],
            plot.min[1] + plot.height() * self.anchor[1],
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendRect {
    pub x: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendTick {
    pub x: f64,
    pub label: String,
}

/// Ramp samples at `i / rect_count`, growing taller to the right.
pub fn legend_rects(config: &LegendConfig) -> Vec<LegendRect> {
    let n = config.rect_count as f64;
    (0..config.rect_count)
        .map(|i| {
            let t = i as f64 / n;
            LegendRect {
                x: i as f64 * config.rect_width,
                width: config.rect_width,
                height: config.rect_min_height + config.rect_height_growth * t,
                color: warm(t).css(),
            }
        })
        .collect()
}

/// Evenly spaced ticks between `min` and `max`, each rounded to 2 decimals first.
pub fn legend_ticks(min: f64, max: f64, config: &LegendConfig) -> Vec<LegendTick> {
    let min = round_to(min, 2);
    let max = round_to(max, 2);
    let n = config.num_ticks;
    let width = config.ramp_width();
    (0..n)
        .map(|i| {
            let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.0 };
            LegendTick {
                x: width * t,
                label: format_significant_padded(min + (max - min) * t, 3, 2),
            }
        })
        .collect()
}

/// `"{Mean|Standard Deviation|Member N} of {Forecast|Analysis} for [{Prior|Posterior} Inflation on ]{name}"`.
pub fn legend_title(
    aggregation: Aggregation,
    da_stage: DaStage,
    inflation: Inflation,
    variable: &StateVariableInfo,
) -> String {
    let agg = match aggregation {
        Aggregation::Mean => "Mean".to_string(),
        Aggregation::Sd => "Standard Deviation".to_string(),
        Aggregation::Member(n) => format!("Member {n}"),
    };
    let stage = match da_stage {
        DaStage::Preassim => "Forecast",
        DaStage::Analysis => "Analysis",
    };
    let inflation = match inflation {
        Inflation::None => "",
        Inflation::Priorinf => "Prior Inflation on ",
        Inflation::Postinf => "Posterior Inflation on ",
    };
    format!("{agg} of {stage} for {inflation}{}", variable.common_name)
}

pub fn legend_subtitle(variable: &StateVariableInfo) -> String {
    format!("in {}", variable.units)
}

/// What the legend describes.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendContent {
    pub extent: (f64, f64),
    pub aggregation: Aggregation,
    pub da_stage: DaStage,
    pub inflation: Inflation,
    pub variable: StateVariableInfo,
}

#[derive(Debug)]
pub struct Legend {
    group: GroupId,
    config: LegendConfig,
}

impl Legend {
    pub fn new(world: &mut World, config: LegendConfig, plot: Aabb2) -> Self {
        let group = world.group("legend");
        let at = config.position(plot);
        world.set_group_transform(group, ZoomTransform::new(1.0, at.x, at.y));
        Self { group, config }
    }

    pub fn group(&self) -> GroupId {
        self.group
    }

    /// Regenerates ramp, ticks, title and subtitle.
    pub fn render(&self, world: &mut World, content: &LegendContent) {
        let c = &self.config;
        world.clear_group(self.group);

        for r in legend_rects(c) {
            world.spawn(
                self.group,
                Element::new(
                    Shape::Rect {
                        origin: Vec2::new(r.x, 0.0),
                        width: r.width,
                        height: r.height,
                    },
                    Style::filled(r.color),
                ),
            );
        }

        let tick_style = Style::stroked("black", 1.0);
        let label_style = Style::filled("black").with_font_size(c.tick_font_size);
        for t in legend_ticks(content.extent.0, content.extent.1, c) {
            world.spawn(
                self.group,
                Element::new(
                    Shape::Line {
                        from: Vec2::new(t.x, 0.0),
                        to: Vec2::new(t.x, c.tick_height),
                    },
                    tick_style.clone(),
                ),
            );
            world.spawn(
                self.group,
                Element::new(
                    Shape::text(Vec2::new(t.x, -5.0), t.label, TextAnchor::Middle),
                    label_style.clone(),
                ),
            );
        }

        let title = legend_title(
            content.aggregation,
            content.da_stage,
            content.inflation,
            &content.variable,
        );
        world.spawn(
            self.group,
            Element::new(
                Shape::text(
                    Vec2::new(0.0, c.title_vertical_offset - 5.0),
                    title,
                    TextAnchor::Start,
                ),
                Style::filled("black").with_font_size(c.title_font_size),
            ),
        );
        world.spawn(
            self.group,
            Element::new(
                Shape::text(
                    Vec2::new(0.0, c.title_vertical_offset / 2.0 - 5.0),
                    legend_subtitle(&content.variable),
                    TextAnchor::Start,
                ),
                Style::filled("black").with_font_size(c.subtitle_font_size),
            ),
        );
    }

    pub fn clear(&self, world: &mut World) {
        world.clear_group(self.group);
    }
}
