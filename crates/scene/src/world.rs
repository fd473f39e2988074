use foundation::bounds::Aabb2;
use foundation::handles::Handle;
use foundation::math::ZoomTransform;

use crate::element::Element;
use crate::entity::{ElementId, GroupId};

#[derive(Debug)]
struct Slot {
    generation: u32,
    element: Option<Element>,
    group: GroupId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub name: String,
    /// Pan/zoom applied to every member at render time.
    pub transform: Option<ZoomTransform>,
    pub clip: Option<Aabb2>,
    pub visible: bool,
    members: Vec<ElementId>,
}

impl Group {
    pub fn members(&self) -> &[ElementId] {
        &self.members
    }
}

/// Retained element scene. Groups draw in creation order, members in
/// insertion order.
#[derive(Debug, Default)]
pub struct World {
    slots: Vec<Slot>,
    free: Vec<u32>,
    groups: Vec<Group>,
    live: usize,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the group called `name`, creating it at the end of the draw order.
    pub fn group(&mut self, name: &str) -> GroupId {
        if let Some(id) = self.find_group(name) {
            return id;
        }
        self.groups.push(Group {
            name: name.to_string(),
            transform: None,
            clip: None,
            visible: true,
            members: Vec::new(),
        });
        GroupId(self.groups.len() as u32 - 1)
    }

    pub fn find_group(&self, name: &str) -> Option<GroupId> {
        self.groups
            .iter()
            .position(|g| g.name == name)
            .map(|i| GroupId(i as u32))
    }

    pub fn group_info(&self, group: GroupId) -> Option<&Group> {
        self.groups.get(group.0 as usize)
    }

    pub fn group_info_mut(&mut self, group: GroupId) -> Option<&mut Group> {
        self.groups.get_mut(group.0 as usize)
    }

    pub fn groups(&self) -> impl Iterator<Item = (GroupId, &Group)> {
        self.groups
            .iter()
            .enumerate()
            .map(|(i, g)| (GroupId(i as u32), g))
    }

    pub fn set_group_transform(&mut self, group: GroupId, transform: ZoomTransform) {
        if let Some(g) = self.groups.get_mut(group.0 as usize) {
            g.transform = Some(transform);
        }
    }

    pub fn members(&self, group: GroupId) -> &[ElementId] {
        self.groups
            .get(group.0 as usize)
            .map(|g| g.members.as_slice())
            .unwrap_or(&[])
    }

    pub fn spawn(&mut self, group: GroupId, element: Element) -> ElementId {
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.element = Some(element);
                slot.group = group;
                ElementId(Handle::new(index, slot.generation))
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    element: Some(element),
                    group,
                });
                ElementId(Handle::new(self.slots.len() as u32 - 1, 0))
            }
        };
        if let Some(g) = self.groups.get_mut(group.0 as usize) {
            g.members.push(id);
        }
        self.live += 1;
        id
    }

    /// Removes an element; stale or unknown ids return `None`.
    pub fn despawn(&mut self, id: ElementId) -> Option<Element> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        let element = slot.element.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        let group = slot.group;
        self.free.push(id.index());
        if let Some(g) = self.groups.get_mut(group.0 as usize) {
            g.members.retain(|m| *m != id);
        }
        self.live -= 1;
        Some(element)
    }

    /// Despawns every member of `group`; returns how many were removed.
    pub fn clear_group(&mut self, group: GroupId) -> usize {
        let members = match self.groups.get_mut(group.0 as usize) {
            Some(g) => std::mem::take(&mut g.members),
            None => return 0,
        };
        let n = members.len();
        for id in members {
            let slot = &mut self.slots[id.index() as usize];
            if slot.generation == id.generation() && slot.element.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index());
                self.live -= 1;
            }
        }
        n
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.element.as_ref()
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.element.as_mut()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.get(id).is_some()
    }

    pub fn group_of(&self, id: ElementId) -> Option<GroupId> {
        self.get(id)?;
        Some(self.slots[id.index() as usize].group)
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }
}

#[cfg(test)]
mod tests {
    use super::World;
    use crate::element::{Element, Shape, Style};
    use foundation::math::Vec2;
    use pretty_assertions::assert_eq;

    fn dot() -> Element {
        Element::new(
            Shape::Circle {
                center: Vec2::new(1.0, 1.0),
                r: 2.0,
            },
            Style::filled("#e31a1c"),
        )
    }

    #[test]
    fn spawn_and_get() {
        let mut world = World::new();
        let g = world.group("gauges");
        let id = world.spawn(g, dot());
        assert!(world.contains(id));
        assert_eq!(world.members(g), &[id]);
        assert_eq!(world.group_of(id), Some(g));
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn groups_are_found_by_name() {
        let mut world = World::new();
        let a = world.group("links");
        let b = world.group("gauges");
        assert_ne!(a, b);
        assert_eq!(world.group("links"), a);
        assert_eq!(world.find_group("axes"), None);
    }

    #[test]
    fn stale_handles_do_not_alias_reused_slots() {
        let mut world = World::new();
        let g = world.group("links");
        let old = world.spawn(g, dot());
        assert!(world.despawn(old).is_some());
        let new = world.spawn(g, dot());
        assert_eq!(old.index(), new.index());
        assert_ne!(old, new);
        assert!(world.get(old).is_none());
        assert!(world.despawn(old).is_none());
        assert!(world.contains(new));
    }

    #[test]
    fn clear_group_only_touches_that_group() {
        let mut world = World::new();
        let links = world.group("links");
        let gauges = world.group("gauges");
        let l = world.spawn(links, dot());
        let g = world.spawn(gauges, dot());
        assert_eq!(world.clear_group(links), 1);
        assert!(!world.contains(l));
        assert!(world.contains(g));
        assert!(world.members(links).is_empty());
        assert_eq!(world.len(), 1);
    }
}
