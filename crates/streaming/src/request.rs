use std::collections::BTreeMap;

/// Identifies a backend request in issue order.
///
/// A small copyable handle; comparing two of them tells which was issued later.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Request(pub u64);

/// Independent request streams. A newer request only supersedes older
/// requests on the same channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Channel {
    BoundingBox,
    UiParameters,
    MapData,
    GaugeLocations,
    Distribution,
    Hydrograph,
    HydrographInflation,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::BoundingBox => "bounding-box",
            Channel::UiParameters => "ui-parameters",
            Channel::MapData => "map-data",
            Channel::GaugeLocations => "gauge-locations",
            Channel::Distribution => "distribution",
            Channel::Hydrograph => "hydrograph",
            Channel::HydrographInflation => "hydrograph-inflation",
        }
    }
}

/// A response arrived for a request that a newer one on the same channel
/// has superseded. The response is dropped.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StaleResponseWarning {
    pub channel: Channel,
    pub request: Request,
    pub latest: Request,
}

impl std::fmt::Display for StaleResponseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "stale {} response #{} discarded (latest is #{})",
            self.channel.as_str(),
            self.request.0,
            self.latest.0
        )
    }
}

impl std::error::Error for StaleResponseWarning {}

/// Hands out monotonically increasing request numbers and decides whether
/// a response is still current.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    next: u64,
    latest: BTreeMap<Channel, Request>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, channel: Channel) -> Request {
        self.next += 1;
        let request = Request(self.next);
        self.latest.insert(channel, request);
        request
    }

    pub fn latest(&self, channel: Channel) -> Option<Request> {
        self.latest.get(&channel).copied()
    }

    /// `Ok` only when `request` is the latest issued on `channel`.
    pub fn accept(&self, channel: Channel, request: Request) -> Result<(), StaleResponseWarning> {
        match self.latest(channel) {
            Some(latest) if latest == request => Ok(()),
            Some(latest) => Err(StaleResponseWarning {
                channel,
                request,
                latest,
            }),
            // Never issued here: treat as superseded by nothing newer.
            None => Err(StaleResponseWarning {
                channel,
                request,
                latest: Request(0),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Channel, Request, RequestSequencer, StaleResponseWarning};

    #[test]
    fn latest_request_wins() {
        let mut seq = RequestSequencer::new();
        let first = seq.issue(Channel::MapData);
        let second = seq.issue(Channel::MapData);
        assert!(second > first);
        assert_eq!(seq.accept(Channel::MapData, second), Ok(()));
        assert_eq!(
            seq.accept(Channel::MapData, first),
            Err(StaleResponseWarning {
                channel: Channel::MapData,
                request: first,
                latest: second,
            })
        );
    }

    #[test]
    fn channels_are_independent() {
        let mut seq = RequestSequencer::new();
        let map = seq.issue(Channel::MapData);
        let _gauges = seq.issue(Channel::GaugeLocations);
        assert!(seq.accept(Channel::MapData, map).is_ok());
    }

    #[test]
    fn unknown_channel_is_stale() {
        let seq = RequestSequencer::new();
        let err = seq.accept(Channel::Distribution, Request(4)).unwrap_err();
        assert_eq!(err.latest, Request(0));
        assert!(err.to_string().contains("distribution"));
    }
}
