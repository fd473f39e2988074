//! Side plots for the selected link: ensemble distribution and hydrograph.
//!
//! Each plot draws into its own scene so it can be exported on its own.

use compute::{Bin, DistributionModel, HydrographModel, Series};
use foundation::math::{LinearScale, Vec2, format_significant};
use foundation::{Aabb2, Margins};
use scene::{Element, GroupId, Shape, Style, TextAnchor, World};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionPlotConfig {
    pub width: f64,
    pub height: f64,
    pub margins: Margins,
    pub x_ticks: usize,
    pub y_ticks: usize,
    pub analysis_color: String,
    pub forecast_color: String,
    pub opacity: f64,
    /// Ticks on the density axis, drawn on the right.
    pub density_ticks: usize,
    pub tick_font_size: f64,
    pub label_font_size: f64,
}

impl Default for DistributionPlotConfig {
    fn default() -> Self {
        Self {
            width: 480.0,
            height: 300.0,
            margins: Margins::new(40.0, 20.0, 40.0, 40.0),
            x_ticks: 10,
            y_ticks: 5,
            analysis_color: "#1f78b4".to_string(),
            forecast_color: "#33a02c".to_string(),
            opacity: 0.5,
            density_ticks: 5,
            tick_font_size: 10.0,
            label_font_size: 15.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydrographPlotConfig {
    pub width: f64,
    pub height: f64,
    pub margins: Margins,
    pub x_ticks: usize,
    pub y_ticks: usize,
    pub stroke_width: f64,
    pub forecast_color: String,
    pub analysis_color: String,
    pub observation_color: String,
    pub opacity: f64,
    /// Opacity of the ±1 standard deviation bands.
    pub band_opacity: f64,
    pub tick_font_size: f64,
    pub label_font_size: f64,
}

impl Default for HydrographPlotConfig {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 300.0,
            margins: Margins::new(50.0, 20.0, 10.0, 50.0),
            x_ticks: 5,
            y_ticks: 5,
            stroke_width: 2.0,
            forecast_color: "#33a02c".to_string(),
            analysis_color: "#1f78b4".to_string(),
            observation_color: "#e31a1c".to_string(),
            opacity: 0.5,
            band_opacity: 0.2,
            tick_font_size: 10.0,
            label_font_size: 15.0,
        }
    }
}

struct Frame {
    plot: Aabb2,
    x: LinearScale,
    y: LinearScale,
}

impl Frame {
    fn new(width: f64, height: f64, margins: Margins, x: (f64, f64), y: (f64, f64)) -> Self {
        let plot = margins.plot_rect(width, height);
        Self {
            plot,
            x: LinearScale::new([x.0, x.1], [plot.min[0], plot.max[0]]),
            y: LinearScale::new([y.0, y.1], [plot.max[1], plot.min[1]]),
        }
    }

    fn point(&self, x: f64, y: f64) -> Vec2 {
        Vec2::new(self.x.apply(x), self.y.apply(y))
    }
}

fn text(world: &mut World, group: GroupId, at: Vec2, s: String, anchor: TextAnchor, size: f64) {
    world.spawn(
        group,
        Element::new(
            Shape::text(at, s, anchor),
            Style::filled("black").with_font_size(size),
        ),
    );
}

/// Bottom and left axis lines with tick marks and labels.
fn draw_axes(
    world: &mut World,
    group: GroupId,
    frame: &Frame,
    x_ticks: &[(f64, String)],
    y_ticks: &[(f64, String)],
    font_size: f64,
) {
    let line = Style::stroked("black", 1.0);
    let p = frame.plot;
    for (from, to) in [
        (p.bottom_left(), p.bottom_right()),
        (p.bottom_left(), p.top_left()),
    ] {
        world.spawn(group, Element::new(Shape::Line { from, to }, line.clone()));
    }
    for (v, label) in x_ticks {
        let x = frame.x.apply(*v);
        world.spawn(
            group,
            Element::new(
                Shape::Line {
                    from: Vec2::new(x, p.max[1]),
                    to: Vec2::new(x, p.max[1] + 6.0),
                },
                line.clone(),
            ),
        );
        text(
            world,
            group,
            Vec2::new(x, p.max[1] + 6.0 + font_size),
            label.clone(),
            TextAnchor::Middle,
            font_size,
        );
    }
    for (v, label) in y_ticks {
        let y = frame.y.apply(*v);
        world.spawn(
            group,
            Element::new(
                Shape::Line {
                    from: Vec2::new(p.min[0] - 6.0, y),
                    to: Vec2::new(p.min[0], y),
                },
                line.clone(),
            ),
        );
        text(
            world,
            group,
            Vec2::new(p.min[0] - 9.0, y + 3.0),
            label.clone(),
            TextAnchor::End,
            font_size,
        );
    }
}

fn numeric_ticks(scale: &LinearScale, count: usize) -> Vec<(f64, String)> {
    scale
        .ticks(count)
        .into_iter()
        .map(|v| (v, format_significant(v, 4)))
        .collect()
}

fn legend_entries(
    world: &mut World,
    group: GroupId,
    frame: &Frame,
    entries: &[(&str, &str)],
    opacity: f64,
    font_size: f64,
) {
    let w = frame.plot.width() * 0.05;
    let h = frame.plot.height() * 0.05;
    let x = frame.plot.min[0] + frame.plot.width() * 0.8;
    for (i, (label, color)) in entries.iter().enumerate() {
        let y = frame.plot.min[1] + (h + 5.0) * i as f64 + 5.0;
        world.spawn(
            group,
            Element::new(
                Shape::Rect {
                    origin: Vec2::new(x, y),
                    width: w,
                    height: h,
                },
                Style::filled(*color).with_opacity(opacity),
            ),
        );
        text(
            world,
            group,
            Vec2::new(x + w + 5.0, y + h),
            label.to_string(),
            TextAnchor::Start,
            font_size,
        );
    }
}

fn bars(world: &mut World, group: GroupId, frame: &Frame, bins: &[Bin], style: &Style) {
    for b in bins.iter().filter(|b| b.count > 0) {
        let top = frame.point(b.x0, b.count as f64);
        let x1 = frame.x.apply(b.x1);
        let base = frame.y.apply(0.0);
        world.spawn(
            group,
            Element::new(
                Shape::Rect {
                    origin: top,
                    width: (x1 - top.x).max(1.0),
                    height: base - top.y,
                },
                style.clone(),
            ),
        );
    }
}

/// Filled area between a density curve and zero, in the density frame.
fn density_area(frame: &Frame, curve: &[(f64, f64)]) -> Option<Vec<Vec2>> {
    let (first, last) = (curve.first()?, curve.last()?);
    let mut ring = Vec::with_capacity(curve.len() + 2);
    ring.push(frame.point(first.0, 0.0));
    ring.extend(curve.iter().map(|&(x, d)| frame.point(x, d)));
    ring.push(frame.point(last.0, 0.0));
    Some(ring)
}

/// Density tick marks and labels along the right edge of the plot.
fn draw_right_axis(world: &mut World, group: GroupId, frame: &Frame, count: usize, font_size: f64) {
    let line = Style::stroked("black", 1.0);
    let p = frame.plot;
    world.spawn(
        group,
        Element::new(
            Shape::Line {
                from: p.bottom_right(),
                to: Vec2::new(p.max[0], p.min[1]),
            },
            line.clone(),
        ),
    );
    for v in frame.y.ticks(count) {
        let y = frame.y.apply(v);
        world.spawn(
            group,
            Element::new(
                Shape::Line {
                    from: Vec2::new(p.max[0], y),
                    to: Vec2::new(p.max[0] + 6.0, y),
                },
                line.clone(),
            ),
        );
        text(
            world,
            group,
            Vec2::new(p.max[0] + 9.0, y + 3.0),
            format_significant(v, 3),
            TextAnchor::Start,
            font_size,
        );
    }
}

/// Overlaid analysis and forecast histograms and density curves with axes,
/// legend and title.
pub fn render_distribution(
    world: &mut World,
    model: &DistributionModel,
    config: &DistributionPlotConfig,
    title: &str,
) {
    let frame = Frame::new(
        config.width,
        config.height,
        config.margins,
        model.x_domain,
        model.y_domain,
    );
    let bars_group = world.group("distribution-bars");
    let density_group = world.group("distribution-density");
    let axes_group = world.group("distribution-axes");
    world.clear_group(bars_group);
    world.clear_group(density_group);
    world.clear_group(axes_group);
    if let Some(g) = world.group_info_mut(density_group) {
        g.clip = Some(frame.plot);
    }

    let analysis = Style::filled(config.analysis_color.clone()).with_opacity(config.opacity);
    let forecast = Style::filled(config.forecast_color.clone()).with_opacity(config.opacity);
    bars(world, bars_group, &frame, &model.analysis, &analysis);
    bars(world, bars_group, &frame, &model.forecast, &forecast);

    // Densities share the x scale but not the count axis.
    if model.density_domain.1 > model.density_domain.0 {
        let density = Frame::new(
            config.width,
            config.height,
            config.margins,
            model.x_domain,
            model.density_domain,
        );
        let curves = [
            (&model.analysis_density, &config.analysis_color),
            (&model.forecast_density, &config.forecast_color),
        ];
        for (curve, color) in curves {
            let Some(ring) = density_area(&density, curve) else {
                continue;
            };
            world.spawn(
                density_group,
                Element::new(
                    Shape::Path {
                        parts: vec![ring],
                        closed: true,
                    },
                    Style::filled(color.clone())
                        .with_opacity(config.opacity)
                        .with_class("density"),
                ),
            );
        }
        draw_right_axis(
            world,
            axes_group,
            &density,
            config.density_ticks,
            config.tick_font_size,
        );
    }

    draw_axes(
        world,
        axes_group,
        &frame,
        &numeric_ticks(&frame.x, config.x_ticks),
        &numeric_ticks(&frame.y, config.y_ticks),
        config.tick_font_size,
    );
    legend_entries(
        world,
        axes_group,
        &frame,
        &[
            ("Analysis", config.analysis_color.as_str()),
            ("Forecast", config.forecast_color.as_str()),
        ],
        config.opacity,
        config.tick_font_size,
    );
    text(
        world,
        axes_group,
        Vec2::new(
            (frame.plot.min[0] + frame.plot.max[0]) / 2.0,
            config.height - 5.0,
        ),
        "Ensemble Model Outputs".to_string(),
        TextAnchor::Middle,
        config.label_font_size,
    );
    text(
        world,
        axes_group,
        Vec2::new(frame.plot.min[0], config.margins.top - 5.0),
        title.to_string(),
        TextAnchor::Start,
        config.label_font_size,
    );
}

/// Forecast, analysis and observation series over time, with optional
/// standard deviation bands.
pub fn render_hydrograph(
    world: &mut World,
    model: &HydrographModel,
    config: &HydrographPlotConfig,
    title: &str,
) {
    let frame = Frame::new(
        config.width,
        config.height,
        config.margins,
        model.x_domain,
        model.y_domain,
    );
    let lines_group = world.group("hydrograph-lines");
    let axes_group = world.group("hydrograph-axes");
    world.clear_group(lines_group);
    world.clear_group(axes_group);
    if let Some(g) = world.group_info_mut(lines_group) {
        g.clip = Some(frame.plot);
    }

    let bands = [
        (
            model
                .samples
                .iter()
                .filter_map(|s| s.forecast_band.map(|b| (s.timestamp, b)))
                .collect::<Vec<_>>(),
            &config.forecast_color,
        ),
        (
            model
                .samples
                .iter()
                .filter_map(|s| s.analysis_band.map(|b| (s.timestamp, b)))
                .collect::<Vec<_>>(),
            &config.analysis_color,
        ),
    ];
    for (band, color) in bands {
        if band.len() < 2 {
            continue;
        }
        let upper = band
            .iter()
            .map(|(t, (_, hi))| frame.point(t.hours_since_epoch() as f64, *hi));
        let lower = band
            .iter()
            .rev()
            .map(|(t, (lo, _))| frame.point(t.hours_since_epoch() as f64, *lo));
        world.spawn(
            lines_group,
            Element::new(
                Shape::Path {
                    parts: vec![upper.chain(lower).collect()],
                    closed: true,
                },
                Style::filled(color.clone()).with_opacity(config.band_opacity),
            ),
        );
    }

    let series = [
        (Series::Forecast, &config.forecast_color),
        (Series::Analysis, &config.analysis_color),
        (Series::Observation, &config.observation_color),
    ];
    for (s, color) in series {
        let parts: Vec<Vec<Vec2>> = model
            .segments(s)
            .into_iter()
            .map(|run| run.into_iter().map(|(x, y)| frame.point(x, y)).collect())
            .collect();
        if parts.is_empty() {
            continue;
        }
        world.spawn(
            lines_group,
            Element::new(
                Shape::Path {
                    parts,
                    closed: false,
                },
                Style::stroked(color.clone(), config.stroke_width).with_opacity(config.opacity),
            ),
        );
    }

    // Label a handful of the sample timestamps.
    let n = model.samples.len();
    let every = n.div_ceil(config.x_ticks.max(1)).max(1);
    let x_ticks: Vec<(f64, String)> = model
        .samples
        .iter()
        .step_by(every)
        .map(|s| {
            let t = s.timestamp;
            (
                t.hours_since_epoch() as f64,
                format!("{:02}/{:02} {:02}h", t.month(), t.day(), t.hour()),
            )
        })
        .collect();
    draw_axes(
        world,
        axes_group,
        &frame,
        &x_ticks,
        &numeric_ticks(&frame.y, config.y_ticks),
        config.tick_font_size,
    );

    let mut entries = vec![
        ("Forecast", config.forecast_color.as_str()),
        ("Analysis", config.analysis_color.as_str()),
    ];
    if model.has_observations {
        entries.push(("Observation", config.observation_color.as_str()));
    }
    legend_entries(
        world,
        axes_group,
        &frame,
        &entries,
        config.opacity,
        config.tick_font_size,
    );
    text(
        world,
        axes_group,
        Vec2::new(
            (frame.plot.min[0] + frame.plot.max[0]) / 2.0,
            config.height - 5.0,
        ),
        "Time".to_string(),
        TextAnchor::Middle,
        config.label_font_size,
    );
    text(
        world,
        axes_group,
        Vec2::new(frame.plot.min[0], config.margins.top - 5.0),
        title.to_string(),
        TextAnchor::Start,
        config.label_font_size,
    );
}

#[cfg(test)]
mod tests {
    use super::{
        DistributionPlotConfig, HydrographPlotConfig, render_distribution, render_hydrograph,
    };
    use compute::{DistributionConfig, DistributionModel, HydrographModel, HydrographSample};
    use foundation::Timestamp;
    use scene::{Shape, World};

    #[test]
    fn distribution_bars_stay_inside_the_plot() {
        let model = DistributionModel::build(
            &[1.0, 2.0, 2.5, 9.9],
            &[3.0, 10.0],
            &DistributionConfig::default(),
        )
        .unwrap();
        let config = DistributionPlotConfig::default();
        let mut world = World::new();
        render_distribution(&mut world, &model, &config, "7 at (-91.54, 41.23)");
        let bars = world.find_group("distribution-bars").unwrap();
        // Six values in six distinct bins.
        assert_eq!(world.members(bars).len(), 6);
        let plot = config.margins.plot_rect(config.width, config.height);
        for &id in world.members(bars) {
            match world.get(id).unwrap().shape {
                Shape::Rect {
                    origin,
                    width,
                    height,
                } => {
                    assert!(origin.x >= plot.min[0] - 1e-9);
                    assert!(origin.x + width <= plot.max[0] + 1.0);
                    assert!((origin.y + height - plot.max[1]).abs() < 1e-9);
                }
                ref other => panic!("unexpected shape {other:?}"),
            }
        }
    }

    #[test]
    fn distribution_draws_both_density_curves() {
        let model = DistributionModel::build(
            &[1.0, 2.0, 2.5, 9.9],
            &[3.0, 10.0],
            &DistributionConfig::default(),
        )
        .unwrap();
        let config = DistributionPlotConfig::default();
        let mut world = World::new();
        render_distribution(&mut world, &model, &config, "FeatureID: 7");
        let density = world.find_group("distribution-density").unwrap();
        let curves = world.members(density);
        assert_eq!(curves.len(), 2);

        let plot = config.margins.plot_rect(config.width, config.height);
        let fills: Vec<Option<String>> = curves
            .iter()
            .map(|&id| world.get(id).unwrap().style.fill.clone())
            .collect();
        assert_eq!(
            fills,
            vec![Some(config.analysis_color.clone()), Some(config.forecast_color.clone())]
        );
        for &id in curves {
            match &world.get(id).unwrap().shape {
                Shape::Path { parts, closed } => {
                    assert!(*closed);
                    let ring = &parts[0];
                    assert_eq!(ring.len(), model.analysis_density.len() + 2);
                    assert!((ring[0].y - plot.max[1]).abs() < 1e-9);
                    assert!(ring.iter().all(|p| p.y >= plot.min[1] - 1e-9));
                }
                other => panic!("unexpected shape {other:?}"),
            }
        }

        let svg = scene::svg::to_svg(&world, config.width, config.height, None);
        assert_eq!(svg.matches(r#"class="density""#).count(), 2);
    }

    #[test]
    fn hydrograph_gaps_split_the_line() {
        let mut gap = sample("2019060106", 2.0, None);
        gap.forecast = None;
        gap.forecast_band = None;
        let model = HydrographModel::build(vec![
            sample("2019060100", 1.0, None),
            sample("2019060103", 1.2, None),
            gap,
            sample("2019060109", 1.4, None),
            sample("2019060112", 1.5, None),
        ])
        .unwrap();
        let config = HydrographPlotConfig::default();
        let mut world = World::new();
        render_hydrograph(&mut world, &model, &config, "FeatureID: 7");
        let lines = world.find_group("hydrograph-lines").unwrap();
        let forecast = world
            .members(lines)
            .iter()
            .map(|&id| world.get(id).unwrap())
            .find(|e| {
                e.style.stroke.as_deref() == Some(config.forecast_color.as_str())
                    && matches!(e.shape, Shape::Path { closed: false, .. })
            })
            .unwrap();
        match &forecast.shape {
            Shape::Path { parts, .. } => {
                assert_eq!(parts.len(), 2);
                assert_eq!(parts[0].len(), 2);
                assert_eq!(parts[1].len(), 2);
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    fn sample(ts: &str, v: f64, observation: Option<f64>) -> HydrographSample {
        HydrographSample {
            timestamp: Timestamp::parse(ts).unwrap(),
            forecast: Some(v),
            analysis: Some(v + 0.5),
            observation,
            forecast_band: Some((v - 1.0, v + 1.0)),
            analysis_band: None,
        }
    }

    #[test]
    fn hydrograph_draws_bands_and_present_series() {
        let model = HydrographModel::build(vec![
            sample("2019060100", 1.0, None),
            sample("2019060106", 2.0, Some(2.2)),
            sample("2019060112", 1.5, None),
        ])
        .unwrap();
        let mut world = World::new();
        render_hydrograph(&mut world, &model, &HydrographPlotConfig::default(), "FeatureID: 7");
        let lines = world.find_group("hydrograph-lines").unwrap();
        // Forecast band, forecast, analysis, observation.
        assert_eq!(world.members(lines).len(), 4);
        let again = world.len();
        render_hydrograph(&mut world, &model, &HydrographPlotConfig::default(), "FeatureID: 7");
        assert_eq!(world.len(), again);
    }
}
