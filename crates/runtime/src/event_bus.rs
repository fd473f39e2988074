/// Severity of a user-visible notice.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A user-visible event: fetch failures, discarded stale responses, renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Position in emission order, starting at 0.
    pub sequence: u64,
    pub level: NoticeLevel,
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct EventBus {
    next: u64,
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            next: 0,
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, level: NoticeLevel, kind: &'static str, message: impl Into<String>) {
        self.events.push(Event {
            sequence: self.next,
            level,
            kind,
            message: message.into(),
        });
        self.next += 1;
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// The banner to show: the most recent error, if any.
    pub fn banner(&self) -> Option<&Event> {
        self.events
            .iter()
            .rev()
            .find(|e| e.level == NoticeLevel::Error)
    }

    pub fn count(&self, kind: &str) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::{EventBus, NoticeLevel};

    #[test]
    fn records_events_in_order() {
        let mut bus = EventBus::new();
        bus.emit(NoticeLevel::Info, "render", "map");
        bus.emit(NoticeLevel::Warning, "stale-response", "dropped #1");
        assert_eq!(bus.events().len(), 2);
        assert_eq!(bus.events()[1].sequence, 1);
        assert_eq!(bus.count("stale-response"), 1);
    }

    #[test]
    fn banner_is_latest_error() {
        let mut bus = EventBus::new();
        assert!(bus.banner().is_none());
        bus.emit(NoticeLevel::Error, "fetch-error", "first");
        bus.emit(NoticeLevel::Error, "fetch-error", "second");
        bus.emit(NoticeLevel::Info, "render", "ok");
        assert_eq!(bus.banner().unwrap().message, "second");
    }

    #[test]
    fn drain_clears_events_but_keeps_numbering() {
        let mut bus = EventBus::new();
        bus.emit(NoticeLevel::Info, "k", "m");
        let drained = bus.drain();
        assert_eq!(drained.len(), 1);
        assert!(bus.events().is_empty());
        bus.emit(NoticeLevel::Info, "k", "n");
        assert_eq!(bus.events()[0].sequence, 1);
    }
}
