//! River links: keyed data join of link records against retained path elements.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use compute::Statistics;
use foundation::LinkId;
use foundation::math::Projection;
use runtime::ParamAction;
use scene::{Element, ElementId, GroupId, Shape, Style, World};
use serde::{Deserialize, Serialize};
use streaming::LinkRecord;
use tracing::{debug, warn};

use crate::layer::Layer;
use crate::symbology::ValueEncodings;
use crate::tooltip::TooltipContent;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkLayerConfig {
    /// Stroke width range the value extent maps onto.
    pub size_range: [f64; 2],
    /// Stroke width multiplier while hovered.
    pub hover_width_factor: f64,
}

impl Default for LinkLayerConfig {
    fn default() -> Self {
        Self {
            size_range: [0.5, 10.0],
            hover_width_factor: 2.0,
        }
    }
}

/// Outcome of one join.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct JoinStats {
    pub entered: usize,
    pub updated: usize,
    pub exited: usize,
    /// Records left out of the join (no value, no line, duplicate key).
    pub skipped: usize,
}

#[derive(Debug, Clone)]
struct Bound {
    element: ElementId,
    record: LinkRecord,
    value: f64,
}

#[derive(Debug)]
pub struct LinkLayer {
    group: GroupId,
    config: LinkLayerConfig,
    bound: BTreeMap<LinkId, Bound>,
    by_element: HashMap<ElementId, LinkId>,
    encodings: Option<ValueEncodings>,
    state_variable: String,
}

impl LinkLayer {
    pub fn new(world: &mut World, config: LinkLayerConfig) -> Self {
        Self {
            group: world.group("links"),
            config,
            bound: BTreeMap::new(),
            by_element: HashMap::new(),
            encodings: None,
            state_variable: String::new(),
        }
    }

    pub fn config(&self) -> &LinkLayerConfig {
        &self.config
    }

    /// Scales used by the latest join; `None` before the first non-empty one.
    pub fn encodings(&self) -> Option<&ValueEncodings> {
        self.encodings.as_ref()
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }

    pub fn element(&self, link: LinkId) -> Option<ElementId> {
        self.bound.get(&link).map(|b| b.element)
    }

    pub fn link_at(&self, element: ElementId) -> Option<LinkId> {
        self.by_element.get(&element).copied()
    }

    pub fn record(&self, link: LinkId) -> Option<&LinkRecord> {
        self.bound.get(&link).map(|b| &b.record)
    }

    /// Values of every joined record, in key order.
    pub fn values(&self) -> Vec<f64> {
        self.bound.values().map(|b| b.value).collect()
    }

    /// Reconciles `records` with the elements on screen.
    ///
    /// Keys already bound keep their element and its runtime state; new keys
    /// spawn elements; keys no longer present are despawned.
    pub fn join(
        &mut self,
        world: &mut World,
        records: &[LinkRecord],
        state_variable: &str,
        projection: &Projection,
    ) -> JoinStats {
        let mut stats = JoinStats::default();
        let mut seen = BTreeSet::new();
        let mut joined: Vec<(&LinkRecord, f64)> = Vec::with_capacity(records.len());
        for record in records {
            let Some(value) = record.value(state_variable) else {
                warn!(link = %record.link_id, state_variable, "link record without a finite value; skipped");
                stats.skipped += 1;
                continue;
            };
            if record.line.is_none() {
                warn!(link = %record.link_id, "link record without geometry; skipped");
                stats.skipped += 1;
                continue;
            }
            if !seen.insert(record.link_id) {
                warn!(link = %record.link_id, "duplicate link id; keeping the first record");
                stats.skipped += 1;
                continue;
            }
            joined.push((record, value));
        }

        let extent = Statistics::extent(joined.iter().map(|(_, v)| *v));
        self.encodings = extent.map(|e| ValueEncodings::from_extent(e, self.config.size_range));
        self.state_variable = state_variable.to_string();

        // Exit.
        let gone: Vec<LinkId> = self
            .bound
            .keys()
            .filter(|k| !seen.contains(k))
            .copied()
            .collect();
        for key in gone {
            if let Some(bound) = self.bound.remove(&key) {
                world.despawn(bound.element);
                self.by_element.remove(&bound.element);
                stats.exited += 1;
            }
        }

        let Some(encodings) = self.encodings else {
            debug!(?stats, "link join");
            return stats;
        };

        for (record, value) in joined {
            let parts = record
                .line
                .as_ref()
                .map(|l| projection.project_line(l.points()))
                .unwrap_or_default();
            let color = encodings.color(value);
            let width = encodings.width(value);

            match self.bound.get_mut(&record.link_id) {
                Some(bound) => {
                    // Update in place; hover state survives.
                    if let Some(element) = world.get_mut(bound.element) {
                        element.shape = Shape::Path {
                            parts,
                            closed: false,
                        };
                        element.style.stroke = Some(color);
                        element.style.stroke_width = if element.runtime.hovered {
                            width * self.config.hover_width_factor
                        } else {
                            width
                        };
                    }
                    bound.record = record.clone();
                    bound.value = value;
                    stats.updated += 1;
                }
                None => {
                    let element = world.spawn(
                        self.group,
                        Element::new(
                            Shape::Path {
                                parts,
                                closed: false,
                            },
                            Style::stroked(color, width).with_class("link"),
                        ),
                    );
                    self.by_element.insert(element, record.link_id);
                    self.bound.insert(
                        record.link_id,
                        Bound {
                            element,
                            record: record.clone(),
                            value,
                        },
                    );
                    stats.entered += 1;
                }
            }
        }

        debug!(?stats, "link join");
        stats
    }

    /// Recomputes every bound path under a new projection; styles and
    /// runtime state are untouched.
    pub fn reproject(&self, world: &mut World, projection: &Projection) -> usize {
        let mut moved = 0;
        for bound in self.bound.values() {
            let (Some(line), Some(element)) = (&bound.record.line, world.get_mut(bound.element))
            else {
                continue;
            };
            element.shape = Shape::Path {
                parts: projection.project_line(line.points()),
                closed: false,
            };
            moved += 1;
        }
        moved
    }

    fn base_width(&self, value: f64) -> f64 {
        self.encodings
            .map(|e| e.width(value))
            .unwrap_or(self.config.size_range[0])
    }

    /// Widens the link and returns its tooltip content.
    pub fn pointer_enter(&self, world: &mut World, link: LinkId) -> Option<TooltipContent> {
        let bound = self.bound.get(&link)?;
        let width = self.base_width(bound.value) * self.config.hover_width_factor;
        let element = world.get_mut(bound.element)?;
        element.runtime.hovered = true;
        element.style.stroke_width = width;
        Some(TooltipContent::for_link(&bound.record, &self.state_variable))
    }

    pub fn pointer_leave(&self, world: &mut World, link: LinkId) {
        let Some(bound) = self.bound.get(&link) else {
            return;
        };
        let width = self.base_width(bound.value);
        if let Some(element) = world.get_mut(bound.element) {
            element.runtime.hovered = false;
            element.style.stroke_width = width;
        }
    }

    /// Selection spanning the link's first two vertices.
    pub fn click(&self, link: LinkId) -> Option<ParamAction> {
        let line = self.bound.get(&link)?.record.line.as_ref()?;
        let points = line.points();
        Some(ParamAction::SelectLink {
            link_id: link,
            src: points[0],
            dst: points[1],
        })
    }

    /// Removes every element, e.g. before switching datasets.
    pub fn clear(&mut self, world: &mut World) {
        world.clear_group(self.group);
        self.bound.clear();
        self.by_element.clear();
        self.encodings = None;
    }
}

impl Layer for LinkLayer {
    fn name(&self) -> &'static str {
        "links"
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
    use super::{JoinStats, LinkLayer, LinkLayerConfig};
    use formats::LineString;
    use foundation::math::Projection;
    use foundation::{LinkId, LonLat};
    use pretty_assertions::assert_eq;
    use runtime::ParamAction;
    use scene::{Shape, World};
    use streaming::LinkRecord;

    fn record(id: i64, value: f64) -> LinkRecord {
        let lon = -91.0 + id as f64 * 0.1;
        let line = LineString::new(vec![
            LonLat::new(lon, 41.0),
            LonLat::new(lon + 0.05, 41.05),
            LonLat::new(lon + 0.1, 41.1),
        ])
        .unwrap();
        LinkRecord::new(LinkId(id), line).with_value("qlink1", value)
    }

    fn projection() -> Projection {
        Projection::new(91.0)
    }

    fn width(world: &World, layer: &LinkLayer, id: i64) -> f64 {
        world
            .get(layer.element(LinkId(id)).unwrap())
            .unwrap()
            .style
            .stroke_width
    }

    #[test]
    fn persisting_keys_keep_their_elements() {
        let mut world = World::new();
        let mut layer = LinkLayer::new(&mut world, LinkLayerConfig::default());
        let p = projection();

        let stats = layer.join(&mut world, &[record(1, 5.0), record(2, 7.0)], "qlink1", &p);
        assert_eq!(stats.entered, 2);
        let e1 = layer.element(LinkId(1)).unwrap();
        let e2 = layer.element(LinkId(2)).unwrap();

        let stats = layer.join(
            &mut world,
            &[record(1, 9.0), record(2, 7.0), record(3, 3.0)],
            "qlink1",
            &p,
        );
        assert_eq!(
            stats,
            JoinStats {
                entered: 1,
                updated: 2,
                exited: 0,
                skipped: 0
            }
        );
        assert_eq!(layer.element(LinkId(1)), Some(e1));
        assert_eq!(layer.element(LinkId(2)), Some(e2));
        assert!(layer.element(LinkId(3)).is_some());
        assert_eq!(world.len(), 3);
        // Extent is now [3, 9]: link 1 gets the widest stroke.
        assert_eq!(width(&world, &layer, 1), 10.0);
        assert_eq!(width(&world, &layer, 3), 0.5);
    }

    #[test]
    fn missing_keys_exit() {
        let mut world = World::new();
        let mut layer = LinkLayer::new(&mut world, LinkLayerConfig::default());
        let p = projection();
        layer.join(&mut world, &[record(1, 5.0), record(2, 7.0)], "qlink1", &p);
        let e2 = layer.element(LinkId(2)).unwrap();
        let stats = layer.join(&mut world, &[record(1, 5.0)], "qlink1", &p);
        assert_eq!(stats.exited, 1);
        assert!(!world.contains(e2));
        assert_eq!(layer.link_at(e2), None);
        assert_eq!(layer.len(), 1);
    }

    #[test]
    fn records_without_values_are_skipped() {
        let mut world = World::new();
        let mut layer = LinkLayer::new(&mut world, LinkLayerConfig::default());
        let mut no_value = record(4, 1.0);
        no_value.values.clear();
        let stats = layer.join(
            &mut world,
            &[record(1, 2.0), no_value, record(1, 3.0)],
            "qlink1",
            &projection(),
        );
        assert_eq!(stats.entered, 1);
        assert_eq!(stats.skipped, 2);
        assert_eq!(layer.values(), vec![2.0]);
    }

    #[test]
    fn hover_doubles_width_and_survives_updates() {
        let mut world = World::new();
        let mut layer = LinkLayer::new(&mut world, LinkLayerConfig::default());
        let p = projection();
        layer.join(&mut world, &[record(1, 0.0), record(2, 10.0)], "qlink1", &p);

        let tip = layer.pointer_enter(&mut world, LinkId(2)).unwrap();
        assert_eq!(tip.lines[0], "LinkID: 2");
        assert_eq!(width(&world, &layer, 2), 20.0);

        layer.join(&mut world, &[record(1, 0.0), record(2, 10.0)], "qlink1", &p);
        let e = world.get(layer.element(LinkId(2)).unwrap()).unwrap();
        assert!(e.runtime.hovered);
        assert_eq!(e.style.stroke_width, 20.0);

        layer.pointer_leave(&mut world, LinkId(2));
        assert_eq!(width(&world, &layer, 2), 10.0);
    }

    #[test]
    fn click_selects_first_two_vertices() {
        let mut world = World::new();
        let mut layer = LinkLayer::new(&mut world, LinkLayerConfig::default());
        let r = record(0, 1.0);
        layer.join(&mut world, std::slice::from_ref(&r), "qlink1", &projection());
        let points = r.line.as_ref().unwrap().points();
        assert_eq!(
            layer.click(LinkId(0)),
            Some(ParamAction::SelectLink {
                link_id: LinkId(0),
                src: points[0],
                dst: points[1],
            })
        );
        assert_eq!(layer.click(LinkId(9)), None);
    }

    #[test]
    fn elements_are_projected_paths() {
        let mut world = World::new();
        let mut layer = LinkLayer::new(&mut world, LinkLayerConfig::default());
        let p = projection();
        let r = record(1, 1.0);
        layer.join(&mut world, std::slice::from_ref(&r), "qlink1", &p);
        let first = r.line.as_ref().unwrap().first();
        let e = world.get(layer.element(LinkId(1)).unwrap()).unwrap();
        match &e.shape {
            Shape::Path { parts, closed } => {
                assert!(!closed);
                assert_eq!(parts.len(), 1);
                assert_eq!(parts[0][0], p.project(first));
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn reproject_moves_paths_and_keeps_hover() {
        let mut world = World::new();
        let mut layer = LinkLayer::new(&mut world, LinkLayerConfig::default());
        let r = record(1, 1.0);
        layer.join(&mut world, std::slice::from_ref(&r), "qlink1", &projection());
        layer.pointer_enter(&mut world, LinkId(1));
        let hovered_width = width(&world, &layer, 1);

        let moved = Projection::new(60.0);
        assert_eq!(layer.reproject(&mut world, &moved), 1);

        let e = world.get(layer.element(LinkId(1)).unwrap()).unwrap();
        assert!(e.runtime.hovered);
        assert_eq!(e.style.stroke_width, hovered_width);
        match &e.shape {
            Shape::Path { parts, .. } => {
                assert_eq!(parts[0][0], moved.project(r.line.as_ref().unwrap().first()));
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }
}
