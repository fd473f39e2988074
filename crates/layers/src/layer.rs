use scene::GroupId;

/// A map layer drawing into one scene group.
pub trait Layer {
    fn name(&self) -> &'static str;

    fn group(&self) -> GroupId;

    /// Whether pointer events are hit-tested against this layer.
    fn pickable(&self) -> bool {
        false
    }
}
