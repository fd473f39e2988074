use foundation::handles::Handle;

/// Stable identity of a scene element. Survives attribute patches; a despawned
/// element's id never matches the element later spawned into its slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub Handle);

impl ElementId {
    pub fn index(&self) -> u32 {
        self.0.index()
    }

    pub fn generation(&self) -> u32 {
        self.0.generation()
    }
}

/// A named, ordered bucket of elements (an SVG `<g>`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub u32);
