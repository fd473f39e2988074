use formats::MalformedTopologyError;
use foundation::math::ProjectionFitError;
use streaming::DataFetchError;

/// Everything the controller can report. None of these are fatal: the
/// affected view keeps what it showed before.
#[derive(Debug)]
pub enum DashboardError {
    Topology(MalformedTopologyError),
    Projection(ProjectionFitError),
    Fetch(DataFetchError),
    /// The backend listed no state variables or no timestamps.
    NoParameters,
    /// A map operation ran before the projection was fitted.
    NotInitialized,
}

impl std::fmt::Display for DashboardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DashboardError::Topology(e) => write!(f, "malformed topology: {e}"),
            DashboardError::Projection(e) => write!(f, "projection fit failed: {e}"),
            DashboardError::Fetch(e) => write!(f, "{e}"),
            DashboardError::NoParameters => {
                write!(f, "backend offered no state variables or timestamps")
            }
            DashboardError::NotInitialized => write!(f, "dashboard is not initialized"),
        }
    }
}

impl std::error::Error for DashboardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DashboardError::Topology(e) => Some(e),
            DashboardError::Projection(e) => Some(e),
            DashboardError::Fetch(e) => Some(e),
            DashboardError::NoParameters | DashboardError::NotInitialized => None,
        }
    }
}

impl From<MalformedTopologyError> for DashboardError {
    fn from(e: MalformedTopologyError) -> Self {
        DashboardError::Topology(e)
    }
}

impl From<ProjectionFitError> for DashboardError {
    fn from(e: ProjectionFitError) -> Self {
        DashboardError::Projection(e)
    }
}

impl From<DataFetchError> for DashboardError {
    fn from(e: DataFetchError) -> Self {
        DashboardError::Fetch(e)
    }
}
