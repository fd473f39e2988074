use foundation::math::precision::stable_total_cmp_f64;
use foundation::math::{Vec2, ZoomTransform, distance_to_segment};

use crate::World;
use crate::element::{Element, Shape};
use crate::entity::{ElementId, GroupId};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    pub element: ElementId,
    pub group: GroupId,
    /// Screen-space distance from the pointer to the element's painted edge.
    pub distance_px: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickOptions {
    pub max_distance_px: f64,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            max_distance_px: 3.0,
        }
    }
}

/// Deterministic pointer picking over the given groups.
///
/// Ordering contract:
/// - The smallest screen distance wins.
/// - Ties go to the lower `ElementId::index()`.
///
/// Notes:
/// - The pointer is mapped into each group's content space through the
///   group's zoom transform; distances are scaled back to pixels.
/// - Hidden elements and hidden groups are skipped. Text is never hit.
pub fn pick_point(
    world: &World,
    groups: &[GroupId],
    pointer: Vec2,
    opts: PickOptions,
) -> Option<PickHit> {
    let mut best: Option<PickHit> = None;

    for &group in groups {
        let Some(info) = world.group_info(group) else {
            continue;
        };
        if !info.visible {
            continue;
        }
        let transform = info.transform.unwrap_or(ZoomTransform::IDENTITY);
        let p = transform.invert(pointer);

        for &id in info.members() {
            let Some(element) = world.get(id) else {
                continue;
            };
            if !element.visible {
                continue;
            }
            let Some(d) = content_distance(element, p) else {
                continue;
            };
            let d = d * transform.k;
            if d > opts.max_distance_px {
                continue;
            }

            let candidate = PickHit {
                element: id,
                group,
                distance_px: d,
            };
            best = match best {
                None => Some(candidate),
                Some(b) => {
                    let ord = stable_total_cmp_f64(d, b.distance_px)
                        .then_with(|| id.index().cmp(&b.element.index()));
                    if ord.is_lt() { Some(candidate) } else { Some(b) }
                }
            };
        }
    }
    best
}

fn content_distance(element: &Element, p: Vec2) -> Option<f64> {
    let half_stroke = element.style.stroke_width / 2.0;
    let d = match &element.shape {
        Shape::Path { parts, closed } => {
            let mut best = f64::INFINITY;
            for part in parts {
                for w in part.windows(2) {
                    best = best.min(distance_to_segment(p, w[0], w[1]));
                }
                if *closed
                    && part.len() > 2
                    && let (Some(first), Some(last)) = (part.first(), part.last())
                {
                    best = best.min(distance_to_segment(p, *last, *first));
                }
            }
            if !best.is_finite() {
                return None;
            }
            (best - half_stroke).max(0.0)
        }
        Shape::Circle { center, r } => (p.distance(*center) - r - half_stroke).max(0.0),
        Shape::Rect {
            origin,
            width,
            height,
        } => {
            let dx = (origin.x - p.x).max(p.x - (origin.x + width)).max(0.0);
            let dy = (origin.y - p.y).max(p.y - (origin.y + height)).max(0.0);
            (dx * dx + dy * dy).sqrt()
        }
        Shape::Line { from, to } => (distance_to_segment(p, *from, *to) - half_stroke).max(0.0),
        Shape::Text { .. } => return None,
    };
    Some(d)
}
