use std::env;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use dashboard::{Dashboard, DashboardConfig, Snapshot, SnapshotBackend};
use formats::{MeshSelection, Topology};
use foundation::{LinkId, Timestamp};
use runtime::ParamAction;
use serde_json::json;
use streaming::{Aggregation, Backend, DaStage, HttpBackend, Inflation};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "HydroVis ensemble hydrology map renderer")]
struct Args {
    /// JSON config file; missing fields keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the current dataset and render the map to SVG
    Render {
        /// Backend base URL (default: $HYDROVIS_BACKEND, then http://127.0.0.1:8000)
        #[arg(long)]
        backend: Option<String>,

        /// Serve responses from a recorded snapshot instead of the backend
        #[arg(long, conflicts_with = "backend")]
        snapshot: Option<PathBuf>,

        /// Use the /getStateData and /getEnsembleData endpoint names
        #[arg(long)]
        legacy_endpoints: bool,

        /// Output SVG path
        #[arg(long, default_value = "map.svg")]
        out: PathBuf,

        /// TopoJSON with a `states` object drawn under the links
        #[arg(long)]
        topology: Option<PathBuf>,

        /// Map width in pixels
        #[arg(long)]
        width: Option<f64>,

        /// Map height in pixels
        #[arg(long)]
        height: Option<f64>,

        /// Padding around the dataset bounding box, in percent
        #[arg(long)]
        padding: Option<f64>,

        /// Widest link stroke, in pixels
        #[arg(long)]
        size_max: Option<f64>,

        /// Draw gauge locations
        #[arg(long)]
        gauges: bool,

        /// State variable (default: the first the backend offers)
        #[arg(long)]
        state_variable: Option<String>,

        /// Model timestamp, YYYYMMDDHH (default: the first the backend offers)
        #[arg(long, value_parser = Timestamp::parse)]
        timestamp: Option<Timestamp>,

        /// mean, sd or a member number
        #[arg(long, value_parser = Aggregation::parse)]
        aggregation: Option<Aggregation>,

        /// preassim or analysis
        #[arg(long, value_parser = DaStage::parse)]
        da_stage: Option<DaStage>,

        /// none, priorinf or postinf
        #[arg(long, value_parser = Inflation::parse)]
        inflation: Option<Inflation>,

        /// Select a link and also write its distribution and hydrograph plots
        #[arg(long)]
        select: Option<i64>,
    },

    /// Decode a topology file and print arc and ring counts as JSON
    DecodeTopology {
        /// TopoJSON file
        file: PathBuf,
    },
}

/// `map.svg` + `distribution` -> `map-distribution.svg`, next to the map.
fn sibling(out: &Path, suffix: &str) -> PathBuf {
    let stem = out
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "map".to_string());
    out.with_file_name(format!("{stem}-{suffix}.svg"))
}

async fn load_config(path: Option<&Path>) -> Result<DashboardConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let text = tokio::fs::read_to_string(path).await?;
            Ok(DashboardConfig::from_json_str(&text)?)
        }
        None => Ok(DashboardConfig::default()),
    }
}

struct RenderJob {
    out: PathBuf,
    topology: Option<PathBuf>,
    actions: Vec<ParamAction>,
    select: Option<LinkId>,
}

async fn render<B: Backend>(
    backend: B,
    config: DashboardConfig,
    job: RenderJob,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut dash = Dashboard::new(backend, config);

    // Installed before the projection exists; the first frame draws it.
    if let Some(path) = &job.topology {
        let text = tokio::fs::read_to_string(path).await?;
        match Topology::from_json_str(&text) {
            Ok(topology) => {
                if let Err(e) = dash.set_topology(topology) {
                    warn!(error = %e, "state borders skipped");
                }
            }
            Err(e) => warn!(path = %path.display(), error = %e, "unreadable topology; state borders skipped"),
        }
    }

    if let Err(e) = dash.initialize().await {
        warn!(error = %e, "initial render incomplete");
    }
    if dash.params().is_some() {
        for action in job.actions {
            if let Err(e) = dash.dispatch(action).await {
                warn!(error = %e, "view left unchanged");
            }
        }
    }
    if let Some(link) = job.select {
        match dash.links().click(link) {
            Some(action) => {
                if let Err(e) = dash.dispatch(action).await {
                    warn!(error = %e, "selection plots incomplete");
                }
            }
            None => warn!(%link, "selected link is not on the map"),
        }
    }

    tokio::fs::write(&job.out, dash.map_svg()).await?;
    info!(out = %job.out.display(), links = dash.links().len(), "map written");

    let plots = [
        ("distribution", dash.distribution_svg()),
        ("hydrograph", dash.hydrograph_svg()),
        ("inflation", dash.hydrograph_inflation_svg()),
    ];
    for (suffix, svg) in plots {
        if let Some(svg) = svg {
            let path = sibling(&job.out, suffix);
            tokio::fs::write(&path, svg).await?;
            info!(out = %path.display(), "plot written");
        }
    }

    for event in dash.events().events() {
        info!(kind = event.kind, level = ?event.level, "{}", event.message);
    }
    Ok(())
}

async fn decode_topology(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let text = tokio::fs::read_to_string(file).await?;
    let topology = Topology::from_json_str(&text)?;
    let arcs = topology.decode_arcs()?;

    let mut objects = serde_json::Map::new();
    for name in topology.objects.keys() {
        let summary = match topology.feature_rings(name) {
            Ok(features) => {
                let polygons: usize = features.iter().map(|f| f.polygons.len()).sum();
                let rings: usize = features
                    .iter()
                    .flat_map(|f| f.polygons.iter())
                    .map(|p| p.len())
                    .sum();
                let exterior = topology.mesh(name, MeshSelection::Exterior)?.len();
                let interior = topology.mesh(name, MeshSelection::Interior)?.len();
                json!({
                    "features": features.len(),
                    "polygons": polygons,
                    "rings": rings,
                    "exteriorArcs": exterior,
                    "interiorArcs": interior,
                })
            }
            Err(e) => json!({ "error": e.to_string() }),
        };
        objects.insert(name.clone(), summary);
    }

    let summary = json!({
        "arcs": arcs.len(),
        "points": arcs.iter().map(|a| a.len()).sum::<usize>(),
        "quantized": topology.transform.is_some(),
        "objects": objects,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = load_config(args.config.as_deref()).await?;

    match args.command {
        Command::Render {
            backend,
            snapshot,
            legacy_endpoints,
            out,
            topology,
            width,
            height,
            padding,
            size_max,
            gauges,
            state_variable,
            timestamp,
            aggregation,
            da_stage,
            inflation,
            select,
        } => {
            if let Some(url) = backend.or_else(|| env::var("HYDROVIS_BACKEND").ok()) {
                config.client.base_url = url;
            }
            config.client.legacy_endpoints |= legacy_endpoints;
            if let Some(w) = width {
                config.map.width = w;
            }
            if let Some(h) = height {
                config.map.height = h;
            }
            if let Some(p) = padding {
                config.map.projection.padding_percent = p;
            }
            if let Some(s) = size_max {
                config.map.links.size_range[1] = s;
            }

            let mut actions = Vec::new();
            actions.extend(state_variable.map(ParamAction::SetStateVariable));
            actions.extend(timestamp.map(ParamAction::SetTimestamp));
            actions.extend(aggregation.map(ParamAction::SetAggregation));
            actions.extend(da_stage.map(ParamAction::SetDaStage));
            actions.extend(inflation.map(ParamAction::SetInflation));
            if gauges {
                actions.push(ParamAction::SetShowGaugeLocations(true));
            }
            let job = RenderJob {
                out,
                topology,
                actions,
                select: select.map(LinkId),
            };

            match snapshot {
                Some(path) => {
                    let text = tokio::fs::read_to_string(&path).await?;
                    let snapshot = Snapshot::from_json_str(&text)?;
                    render(SnapshotBackend::new(snapshot), config, job).await?;
                }
                None => {
                    info!(backend = %config.client.base_url, "rendering");
                    let backend = HttpBackend::new(config.client.clone())?;
                    render(backend, config, job).await?;
                }
            }
        }
        Command::DecodeTopology { file } => decode_topology(&file).await?,
    }
    Ok(())
}
