//! Gauge locations: small circles keyed by link id.

use std::collections::{BTreeMap, HashMap};

use foundation::LinkId;
use foundation::math::Projection;
use runtime::ParamAction;
use scene::{Element, ElementId, GroupId, Shape, Style, World};
use serde::{Deserialize, Serialize};
use streaming::GaugeRecord;
use tracing::{debug, warn};

use crate::layer::Layer;
use crate::links::JoinStats;
use crate::tooltip::TooltipContent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaugeLayerConfig {
    pub radius: f64,
    pub fill: String,
    pub opacity: f64,
    pub stroke: String,
    pub hover_stroke_width: f64,
}

impl Default for GaugeLayerConfig {
    fn default() -> Self {
        Self {
            radius: 2.0,
            fill: "#e31a1c".to_string(),
            opacity: 0.5,
            stroke: "black".to_string(),
            hover_stroke_width: 1.0,
        }
    }
}

#[derive(Debug)]
pub struct GaugeLayer {
    group: GroupId,
    config: GaugeLayerConfig,
    bound: BTreeMap<LinkId, (ElementId, GaugeRecord)>,
    by_element: HashMap<ElementId, LinkId>,
}

impl GaugeLayer {
    pub fn new(world: &mut World, config: GaugeLayerConfig) -> Self {
        Self {
            group: world.group("gauges"),
            config,
            bound: BTreeMap::new(),
            by_element: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }

    pub fn element(&self, link: LinkId) -> Option<ElementId> {
        self.bound.get(&link).map(|(e, _)| *e)
    }

    pub fn link_at(&self, element: ElementId) -> Option<LinkId> {
        self.by_element.get(&element).copied()
    }

    fn style(&self) -> Style {
        let mut style = Style::filled(self.config.fill.clone()).with_opacity(self.config.opacity);
        style.stroke = Some(self.config.stroke.clone());
        style.stroke_width = 0.0;
        style.with_class("gauge")
    }

    /// Keyed join of gauge records; positions follow `projection`.
    pub fn join(
        &mut self,
        world: &mut World,
        records: &[GaugeRecord],
        projection: &Projection,
    ) -> JoinStats {
        let mut stats = JoinStats::default();
        let mut next: BTreeMap<LinkId, GaugeRecord> = BTreeMap::new();
        for record in records {
            let loc = record.location();
            if !loc.lon.is_finite() || !loc.lat.is_finite() {
                warn!(gauge = %record.link_id, "gauge with a non-finite location; skipped");
                stats.skipped += 1;
                continue;
            }
            if next.insert(record.link_id, *record).is_some() {
                warn!(gauge = %record.link_id, "duplicate gauge id; keeping the last record");
                stats.skipped += 1;
            }
        }

        let gone: Vec<LinkId> = self
            .bound
            .keys()
            .filter(|k| !next.contains_key(k))
            .copied()
            .collect();
        for key in gone {
            if let Some((element, _)) = self.bound.remove(&key) {
                world.despawn(element);
                self.by_element.remove(&element);
                stats.exited += 1;
            }
        }

        for (key, record) in next {
            let center = projection.project(record.location());
            match self.bound.get_mut(&key) {
                Some((element, bound)) => {
                    if let Some(e) = world.get_mut(*element) {
                        e.shape = Shape::Circle {
                            center,
                            r: self.config.radius,
                        };
                    }
                    *bound = record;
                    stats.updated += 1;
                }
                None => {
                    let element = world.spawn(
                        self.group,
                        Element::new(
                            Shape::Circle {
                                center,
                                r: self.config.radius,
                            },
                            self.style(),
                        ),
                    );
                    self.by_element.insert(element, key);
                    self.bound.insert(key, (element, record));
                    stats.entered += 1;
                }
            }
        }
        debug!(?stats, "gauge join");
        stats
    }

    /// Moves every gauge to its position under a new projection.
    pub fn reproject(&self, world: &mut World, projection: &Projection) -> usize {
        let mut moved = 0;
        for (element, record) in self.bound.values() {
            if let Some(e) = world.get_mut(*element) {
                e.shape = Shape::Circle {
                    center: projection.project(record.location()),
                    r: self.config.radius,
                };
                moved += 1;
            }
        }
        moved
    }

    /// Removes every gauge, as when gauge display is switched off.
    pub fn clear(&mut self, world: &mut World) -> usize {
        self.bound.clear();
        self.by_element.clear();
        world.clear_group(self.group)
    }

    pub fn pointer_enter(&self, world: &mut World, link: LinkId) -> Option<TooltipContent> {
        let (element, record) = self.bound.get(&link)?;
        let e = world.get_mut(*element)?;
        e.runtime.hovered = true;
        e.style.stroke_width = self.config.hover_stroke_width;
        Some(TooltipContent::for_gauge(record))
    }

    pub fn pointer_leave(&self, world: &mut World, link: LinkId) {
        if let Some((element, _)) = self.bound.get(&link)
            && let Some(e) = world.get_mut(*element)
        {
            e.runtime.hovered = false;
            e.style.stroke_width = 0.0;
        }
    }

    /// Selects the gauge; hydrographs then read observations at its location.
    pub fn click(&self, link: LinkId) -> Option<ParamAction> {
        let (_, record) = self.bound.get(&link)?;
        Some(ParamAction::SelectGauge {
            link_id: link,
            location: record.location(),
        })
    }
}

impl Layer for GaugeLayer {
    fn name(&self) -> &'static str {
        "gauges"
    }

    fn group(&self) -> GroupId {
        self.group
    }

    fn pickable(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{GaugeLayer, GaugeLayerConfig};
    use foundation::math::Projection;
    use foundation::{LinkId, LonLat};
    use runtime::ParamAction;
    use scene::{Shape, World};
    use streaming::GaugeRecord;

    fn gauge(id: i64, lon: f64) -> GaugeRecord {
        GaugeRecord {
            link_id: LinkId(id),
            location: [lon, 41.0],
        }
    }

    #[test]
    fn join_is_keyed_and_clear_removes_everything() {
        let mut world = World::new();
        let mut layer = GaugeLayer::new(&mut world, GaugeLayerConfig::default());
        let p = Projection::new(91.0);
        let stats = layer.join(&mut world, &[gauge(1, 268.0), gauge(2, 269.0)], &p);
        assert_eq!(stats.entered, 2);
        let e1 = layer.element(LinkId(1)).unwrap();

        let stats = layer.join(&mut world, &[gauge(1, 268.5)], &p);
        assert_eq!((stats.updated, stats.exited), (1, 1));
        assert_eq!(layer.element(LinkId(1)), Some(e1));

        assert_eq!(layer.clear(&mut world), 1);
        assert!(world.is_empty());
        assert!(layer.is_empty());
    }

    #[test]
    fn hover_outlines_the_gauge() {
        let mut world = World::new();
        let mut layer = GaugeLayer::new(&mut world, GaugeLayerConfig::default());
        layer.join(&mut world, &[gauge(7, -92.0)], &Projection::new(91.0));
        let tip = layer.pointer_enter(&mut world, LinkId(7)).unwrap();
        assert_eq!(tip.lines[1], "LinkID: 7");
        let e = layer.element(LinkId(7)).unwrap();
        assert_eq!(world.get(e).unwrap().style.stroke_width, 1.0);
        layer.pointer_leave(&mut world, LinkId(7));
        assert_eq!(world.get(e).unwrap().style.stroke_width, 0.0);
        assert_eq!(world.get(e).unwrap().style.fill.as_deref(), Some("#e31a1c"));
    }

    #[test]
    fn click_reads_from_gauge_location() {
        let mut world = World::new();
        let mut layer = GaugeLayer::new(&mut world, GaugeLayerConfig::default());
        layer.join(&mut world, &[gauge(3, 268.0)], &Projection::new(91.0));
        assert_eq!(
            layer.click(LinkId(3)),
            Some(ParamAction::SelectGauge {
                link_id: LinkId(3),
                location: LonLat::new(268.0, 41.0),
            })
        );
    }

    #[test]
    fn reproject_follows_the_new_projection() {
        let mut world = World::new();
        let mut layer = GaugeLayer::new(&mut world, GaugeLayerConfig::default());
        let g = gauge(4, -95.0);
        layer.join(&mut world, &[g], &Projection::new(91.0));
        let moved = Projection::new(120.0);
        assert_eq!(layer.reproject(&mut world, &moved), 1);
        let e = world.get(layer.element(LinkId(4)).unwrap()).unwrap();
        assert_eq!(
            e.shape,
            Shape::Circle {
                center: moved.project(g.location()),
                r: 2.0,
            }
        );
    }
}
