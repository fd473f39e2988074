//! Event-driven dashboard controller.
//!
//! Owns the map scene with its layers and the side-plot scenes, and turns
//! backend responses and pointer input into scene updates:
//! - every backend call carries a sequence number; a response renders only
//!   if no newer request went out on its channel
//! - a parameter change re-renders just the views whose inputs changed
//! - wheel and drag zoom and pan the map layers and resync the axes
//! - hovering a link or gauge shows its tooltip; clicking selects it

use compute::{DistributionModel, HydrographModel, HydrographSample};
use formats::{Topology, state_variable};
use foundation::LinkId;
use foundation::math::{FittedProjection, Vec2, ZoomBehavior, ZoomTransform, build_projection};
use layers::Layer;
use layers::axes::AxisSynchronizer;
use layers::basemap::{Basemap, retain_configured_states};
use layers::gauges::GaugeLayer;
use layers::legend::{Legend, LegendContent, legend_title};
use layers::links::LinkLayer;
use layers::plots::{render_distribution, render_hydrograph};
use layers::tooltip::Tooltip;
use runtime::{EventBus, NoticeLevel, ParamAction, RenderTrigger, UiParameters};
use scene::picking::{PickOptions, pick_point};
use scene::svg::to_svg;
use scene::{GroupId, World};
use streaming::{
    Backend, BoundingBoxResponse, Channel, DataFetchError, EnsembleSample, GaugeRecord,
    HydrographResponse, LinkRecord, Request, RequestSequencer, UiParametersResponse,
};
use tracing::{debug, error, info, trace, warn};

use crate::config::DashboardConfig;
use crate::error::DashboardError;

/// What became of one backend response.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Applied {
    Rendered,
    /// A newer request on the same channel superseded it.
    Discarded,
    /// Nothing to show (no selection, gauges hidden, no inflation); the view
    /// was emptied without a request.
    Cleared,
}

/// The element under the pointer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Hovered {
    Link(LinkId),
    Gauge(LinkId),
}

pub struct Dashboard<B: Backend> {
    backend: B,
    config: DashboardConfig,
    sequencer: RequestSequencer,
    events: EventBus,

    world: World,
    basemap: Basemap,
    gauges: GaugeLayer,
    links: LinkLayer,
    axes: AxisSynchronizer,
    legend: Legend,
    tooltip: Tooltip,
    tooltip_group: GroupId,

    zoom: ZoomBehavior,
    transform: ZoomTransform,
    drag_from: Option<Vec2>,
    hovered: Option<Hovered>,

    fitted: Option<FittedProjection>,
    topology: Option<Topology>,
    ui: Option<UiParametersResponse>,
    params: Option<UiParameters>,

    distribution: Option<DistributionModel>,
    distribution_world: World,
    hydrograph: Option<HydrographModel>,
    hydrograph_world: World,
    hydrograph_inflation: Option<HydrographModel>,
    hydrograph_inflation_world: World,
}

fn hydrograph_samples(response: &HydrographResponse) -> Vec<HydrographSample> {
    response
        .data
        .iter()
        .map(|p| HydrographSample {
            timestamp: p.timestamp,
            forecast: p.forecast,
            analysis: p.analysis,
            observation: p.observation,
            forecast_band: p.forecast_sd_min.zip(p.forecast_sd_max),
            analysis_band: p.analysis_sd_min.zip(p.analysis_sd_max),
        })
        .collect()
}

/// Analysis and forecast member values of `variable`.
fn ensemble_values(samples: &[EnsembleSample], variable: &str) -> (Vec<f64>, Vec<f64>) {
    samples
        .iter()
        .filter_map(|s| s.values.get(variable))
        .map(|v| (v.analysis, v.forecast))
        .unzip()
}

fn keep_first(slot: &mut Option<DashboardError>, result: Result<Applied, DashboardError>) {
    if let Err(e) = result
        && slot.is_none()
    {
        *slot = Some(e);
    }
}

impl<B: Backend> Dashboard<B> {
    pub fn new(backend: B, config: DashboardConfig) -> Self {
        let mut world = World::new();
        let map = &config.map;
        let plot = map.plot_rect();

        // Creation order is paint order.
        let basemap = Basemap::new(&mut world, map.basemap.clone(), plot);
        let gauges = GaugeLayer::new(&mut world, map.gauges.clone());
        let links = LinkLayer::new(&mut world, map.links);
        let axes = AxisSynchronizer::new(&mut world, plot, map.viewport(), map.axes.clone());
        let legend = Legend::new(&mut world, map.legend, plot);
        let tooltip_group = world.group("tooltip");
        let zoom = ZoomBehavior::new(plot, map.max_zoom);

        Self {
            backend,
            config,
            sequencer: RequestSequencer::new(),
            events: EventBus::new(),
            world,
            basemap,
            gauges,
            links,
            axes,
            legend,
            tooltip: Tooltip::new(),
            tooltip_group,
            zoom,
            transform: ZoomTransform::IDENTITY,
            drag_from: None,
            hovered: None,
            fitted: None,
            topology: None,
            ui: None,
            params: None,
            distribution: None,
            distribution_world: World::new(),
            hydrograph: None,
            hydrograph_world: World::new(),
            hydrograph_inflation: None,
            hydrograph_inflation_world: World::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn params(&self) -> Option<&UiParameters> {
        self.params.as_ref()
    }

    /// State variables and timestamps the backend offers.
    pub fn ui_parameters(&self) -> Option<&UiParametersResponse> {
        self.ui.as_ref()
    }

    pub fn projection(&self) -> Option<&FittedProjection> {
        self.fitted.as_ref()
    }

    pub fn transform(&self) -> ZoomTransform {
        self.transform
    }

    pub fn links(&self) -> &LinkLayer {
        &self.links
    }

    pub fn gauges(&self) -> &GaugeLayer {
        &self.gauges
    }

    pub fn axes(&self) -> &AxisSynchronizer {
        &self.axes
    }

    pub fn legend(&self) -> &Legend {
        &self.legend
    }

    pub fn tooltip(&self) -> &Tooltip {
        &self.tooltip
    }

    pub fn hovered(&self) -> Option<Hovered> {
        self.hovered
    }

    pub fn distribution(&self) -> Option<&DistributionModel> {
        self.distribution.as_ref()
    }

    pub fn hydrograph(&self) -> Option<&HydrographModel> {
        self.hydrograph.as_ref()
    }

    pub fn hydrograph_inflation(&self) -> Option<&HydrographModel> {
        self.hydrograph_inflation.as_ref()
    }

    /// Numbers a request on `channel`, superseding any still in flight there.
    pub fn issue(&mut self, channel: Channel) -> Request {
        self.sequencer.issue(channel)
    }

    fn is_current(&mut self, channel: Channel, request: Request) -> bool {
        match self.sequencer.accept(channel, request) {
            Ok(()) => true,
            Err(stale) => {
                warn!(%stale, "discarding response");
                self.events
                    .emit(NoticeLevel::Warning, "stale-response", stale.to_string());
                false
            }
        }
    }

    /// Logs `err` and raises it on the event bus.
    fn fail(&mut self, err: DashboardError) -> DashboardError {
        let kind = match &err {
            DashboardError::Topology(_) => "topology-error",
            DashboardError::Projection(_) => "projection-error",
            DashboardError::Fetch(_) => "fetch-error",
            DashboardError::NoParameters | DashboardError::NotInitialized => "dashboard-error",
        };
        error!(kind, error = %err, "view left unchanged");
        self.events.emit(NoticeLevel::Error, kind, err.to_string());
        err
    }

    fn selection_title(&self) -> String {
        self.params
            .as_ref()
            .and_then(|p| p.selection)
            .map(|s| format!("FeatureID: {}", s.label()))
            .unwrap_or_default()
    }

    /// Fetches the dataset extent and UI parameters, fits the projection and
    /// draws the first map.
    pub async fn initialize(&mut self) -> Result<RenderTrigger, DashboardError> {
        let request = self.issue(Channel::BoundingBox);
        let result = self.backend.bounding_box().await;
        self.apply_bounding_box(request, result)?;

        let request = self.issue(Channel::UiParameters);
        let result = self.backend.ui_parameters().await;
        self.apply_ui_parameters(request, result)?;

        let trigger = RenderTrigger {
            map: true,
            ..RenderTrigger::NONE
        };
        self.refresh(trigger).await?;
        Ok(trigger)
    }

    pub fn apply_bounding_box(
        &mut self,
        request: Request,
        result: Result<BoundingBoxResponse, DataFetchError>,
    ) -> Result<Applied, DashboardError> {
        if !self.is_current(Channel::BoundingBox, request) {
            return Ok(Applied::Discarded);
        }
        let response = result.map_err(|e| self.fail(e.into()))?;
        let map = &self.config.map;
        let fitted = build_projection(
            response.bbox,
            Some(response.centroid),
            map.plot_rect(),
            &map.projection,
        )
        .map_err(|e| self.fail(e.into()))?;
        info!(
            rotate = fitted.projection.rotate_lon_deg,
            scale = fitted.projection.scale,
            "projection fitted"
        );
        // Data already on the map follows the new projection.
        let links = self.links.reproject(&mut self.world, &fitted.projection);
        let gauges = self.gauges.reproject(&mut self.world, &fitted.projection);
        debug!(links, gauges, "reprojected");
        self.fitted = Some(fitted);
        self.transform = ZoomTransform::IDENTITY;
        self.draw_frame().map_err(|e| self.fail(e))?;
        Ok(Applied::Rendered)
    }

    pub fn apply_ui_parameters(
        &mut self,
        request: Request,
        result: Result<UiParametersResponse, DataFetchError>,
    ) -> Result<Applied, DashboardError> {
        if !self.is_current(Channel::UiParameters, request) {
            return Ok(Applied::Discarded);
        }
        let response = result.map_err(|e| self.fail(e.into()))?;
        let (Some(variable), Some(timestamp)) =
            (response.state_variables.first(), response.timestamps.first())
        else {
            return Err(self.fail(DashboardError::NoParameters));
        };
        info!(
            state_variables = response.state_variables.len(),
            timestamps = response.timestamps.len(),
            "ui parameters loaded"
        );
        self.params = Some(UiParameters::initial(variable.clone(), *timestamp));
        self.ui = Some(response);
        Ok(Applied::Rendered)
    }

    /// Base map, axes and zoom transforms for the current projection.
    fn draw_frame(&mut self) -> Result<(), DashboardError> {
        let Some(fitted) = &self.fitted else {
            return Err(DashboardError::NotInitialized);
        };
        let plot = self.config.map.plot_rect();
        self.basemap.render(
            &mut self.world,
            &fitted.projection,
            plot,
            self.topology.as_ref(),
        )?;
        self.zoom_to(self.transform);
        Ok(())
    }

    /// Installs the state borders drawn under the data layers. Configured
    /// states are dropped first. A topology that cannot be meshed leaves the
    /// previous base map.
    pub fn set_topology(&mut self, mut topology: Topology) -> Result<(), DashboardError> {
        retain_configured_states(&mut topology, &self.config.map.basemap)
            .map_err(|e| self.fail(e.into()))?;
        if let Some(fitted) = &self.fitted {
            let plot = self.config.map.plot_rect();
            if let Err(e) =
                self.basemap
                    .render(&mut self.world, &fitted.projection, plot, Some(&topology))
            {
                return Err(self.fail(e.into()));
            }
        }
        self.topology = Some(topology);
        Ok(())
    }

    /// Applies a parameter change and refreshes the views it affects.
    pub async fn dispatch(&mut self, action: ParamAction) -> Result<RenderTrigger, DashboardError> {
        let params = self.params.as_ref().ok_or(DashboardError::NotInitialized)?;
        let (next, trigger) = params.apply(action);
        debug!(?trigger, "parameters changed");
        self.params = Some(next);
        self.refresh(trigger).await?;
        Ok(trigger)
    }

    /// Re-renders the views named by `trigger`. Every view is attempted;
    /// the first failure is returned.
    pub async fn refresh(&mut self, trigger: RenderTrigger) -> Result<(), DashboardError> {
        let mut first_error = None;
        if trigger.map {
            keep_first(&mut first_error, self.refresh_map().await);
        }
        if trigger.gauges {
            keep_first(&mut first_error, self.refresh_gauges().await);
        }
        if trigger.distribution {
            keep_first(&mut first_error, self.refresh_distribution().await);
        }
        if trigger.hydrograph {
            keep_first(&mut first_error, self.refresh_hydrograph().await);
        }
        if trigger.hydrograph_inflation {
            keep_first(&mut first_error, self.refresh_hydrograph_inflation().await);
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn refresh_map(&mut self) -> Result<Applied, DashboardError> {
        let request = self
            .params
            .as_ref()
            .ok_or(DashboardError::NotInitialized)?
            .map_request();
        let ticket = self.issue(Channel::MapData);
        let result = self.backend.map_data(request).await;
        self.apply_map_data(ticket, result)
    }

    /// Joins link records into the map and regenerates the legend.
    pub fn apply_map_data(
        &mut self,
        request: Request,
        result: Result<Vec<LinkRecord>, DataFetchError>,
    ) -> Result<Applied, DashboardError> {
        if !self.is_current(Channel::MapData, request) {
            return Ok(Applied::Discarded);
        }
        let records = result.map_err(|e| self.fail(e.into()))?;
        let (Some(fitted), Some(params)) = (&self.fitted, &self.params) else {
            return Err(DashboardError::NotInitialized);
        };

        let stats = self.links.join(
            &mut self.world,
            &records,
            &params.state_variable,
            &fitted.projection,
        );
        match self.links.encodings() {
            Some(encodings) => {
                let content = LegendContent {
                    extent: encodings.extent,
                    aggregation: params.aggregation,
                    da_stage: params.da_stage,
                    inflation: params.inflation,
                    variable: state_variable(&params.state_variable),
                };
                self.legend.render(&mut self.world, &content);
            }
            None => self.legend.clear(&mut self.world),
        }
        info!(
            entered = stats.entered,
            updated = stats.updated,
            exited = stats.exited,
            skipped = stats.skipped,
            "map data rendered"
        );
        self.events.emit(
            NoticeLevel::Info,
            "map-rendered",
            format!("{} links", self.links.len()),
        );
        self.drop_vanished_hover();
        Ok(Applied::Rendered)
    }

    async fn refresh_gauges(&mut self) -> Result<Applied, DashboardError> {
        let show = self
            .params
            .as_ref()
            .ok_or(DashboardError::NotInitialized)?
            .show_gauge_locations;
        let ticket = self.issue(Channel::GaugeLocations);
        if !show {
            // The issued ticket supersedes any gauge response still on its way.
            let removed = self.gauges.clear(&mut self.world);
            debug!(removed, "gauges hidden");
            self.drop_vanished_hover();
            return Ok(Applied::Cleared);
        }
        let result = self.backend.gauge_locations().await;
        self.apply_gauge_locations(ticket, result)
    }

    pub fn apply_gauge_locations(
        &mut self,
        request: Request,
        result: Result<Vec<GaugeRecord>, DataFetchError>,
    ) -> Result<Applied, DashboardError> {
        if !self.is_current(Channel::GaugeLocations, request) {
            return Ok(Applied::Discarded);
        }
        let records = result.map_err(|e| self.fail(e.into()))?;
        let Some(fitted) = &self.fitted else {
            return Err(DashboardError::NotInitialized);
        };
        let stats = self
            .gauges
            .join(&mut self.world, &records, &fitted.projection);
        info!(gauges = self.gauges.len(), skipped = stats.skipped, "gauges rendered");
        self.drop_vanished_hover();
        Ok(Applied::Rendered)
    }

    async fn refresh_distribution(&mut self) -> Result<Applied, DashboardError> {
        let request = self
            .params
            .as_ref()
            .ok_or(DashboardError::NotInitialized)?
            .distribution_request();
        let ticket = self.issue(Channel::Distribution);
        let Some(request) = request else {
            self.distribution = None;
            self.distribution_world = World::new();
            return Ok(Applied::Cleared);
        };
        let result = self.backend.distribution_data(request).await;
        self.apply_distribution_data(ticket, result)
    }

    /// Bins the ensemble members of the selected link.
    pub fn apply_distribution_data(
        &mut self,
        request: Request,
        result: Result<Vec<EnsembleSample>, DataFetchError>,
    ) -> Result<Applied, DashboardError> {
        if !self.is_current(Channel::Distribution, request) {
            return Ok(Applied::Discarded);
        }
        let samples = result.map_err(|e| self.fail(e.into()))?;
        let params = self.params.as_ref().ok_or(DashboardError::NotInitialized)?;
        let (analysis, forecast) = ensemble_values(&samples, &params.state_variable);

        match DistributionModel::build(&analysis, &forecast, &self.config.distribution) {
            Some(model) => {
                let title = self.selection_title();
                let mut world = World::new();
                render_distribution(&mut world, &model, &self.config.distribution_plot, &title);
                debug!(members = samples.len(), "distribution rendered");
                self.distribution_world = world;
                self.distribution = Some(model);
                Ok(Applied::Rendered)
            }
            None => {
                warn!(
                    members = samples.len(),
                    state_variable = %params.state_variable,
                    "no finite ensemble values; distribution cleared"
                );
                self.distribution = None;
                self.distribution_world = World::new();
                Ok(Applied::Cleared)
            }
        }
    }

    async fn refresh_hydrograph(&mut self) -> Result<Applied, DashboardError> {
        let request = self
            .params
            .as_ref()
            .ok_or(DashboardError::NotInitialized)?
            .hydrograph_request();
        let ticket = self.issue(Channel::Hydrograph);
        let Some(request) = request else {
            self.hydrograph = None;
            self.hydrograph_world = World::new();
            return Ok(Applied::Cleared);
        };
        let result = self.backend.hydrograph_state_variable(request).await;
        self.apply_hydrograph(ticket, result)
    }

    pub fn apply_hydrograph(
        &mut self,
        request: Request,
        result: Result<HydrographResponse, DataFetchError>,
    ) -> Result<Applied, DashboardError> {
        if !self.is_current(Channel::Hydrograph, request) {
            return Ok(Applied::Discarded);
        }
        let response = result.map_err(|e| self.fail(e.into()))?;
        let title = self.selection_title();
        let (model, world) = self.build_hydrograph(&response, &title);
        let applied = if model.is_some() {
            Applied::Rendered
        } else {
            Applied::Cleared
        };
        self.hydrograph = model;
        self.hydrograph_world = world;
        Ok(applied)
    }

    async fn refresh_hydrograph_inflation(&mut self) -> Result<Applied, DashboardError> {
        let request = self
            .params
            .as_ref()
            .ok_or(DashboardError::NotInitialized)?
            .hydrograph_inflation_request();
        let ticket = self.issue(Channel::HydrographInflation);
        let Some(request) = request else {
            self.hydrograph_inflation = None;
            self.hydrograph_inflation_world = World::new();
            return Ok(Applied::Cleared);
        };
        let result = self.backend.hydrograph_inflation(request).await;
        self.apply_hydrograph_inflation(ticket, result)
    }

    pub fn apply_hydrograph_inflation(
        &mut self,
        request: Request,
        result: Result<HydrographResponse, DataFetchError>,
    ) -> Result<Applied, DashboardError> {
        if !self.is_current(Channel::HydrographInflation, request) {
            return Ok(Applied::Discarded);
        }
        let response = result.map_err(|e| self.fail(e.into()))?;
        let title = format!("Inflation {}", self.selection_title());
        let (model, world) = self.build_hydrograph(&response, &title);
        let applied = if model.is_some() {
            Applied::Rendered
        } else {
            Applied::Cleared
        };
        self.hydrograph_inflation = model;
        self.hydrograph_inflation_world = world;
        Ok(applied)
    }

    fn build_hydrograph(
        &self,
        response: &HydrographResponse,
        title: &str,
    ) -> (Option<HydrographModel>, World) {
        let mut world = World::new();
        let Some(model) = HydrographModel::build(hydrograph_samples(response)) else {
            warn!(link = %response.link_id, "hydrograph without finite values; cleared");
            return (None, world);
        };
        render_hydrograph(&mut world, &model, &self.config.hydrograph_plot, title);
        debug!(
            link = %response.link_id,
            points = model.samples.len(),
            observations = model.has_observations,
            "hydrograph rendered"
        );
        (Some(model), world)
    }

    /// Sets the map zoom, clamped to the scale extent and constrained to the
    /// plot, and resyncs the axes.
    pub fn zoom_to(&mut self, transform: ZoomTransform) {
        let [lo, hi] = self.zoom.scale_extent;
        let k = if transform.k.is_finite() {
            transform.k.clamp(lo, hi)
        } else {
            lo
        };
        self.transform = self
            .zoom
            .constrain(ZoomTransform::new(k, transform.x, transform.y));
        for group in [self.basemap.group(), self.gauges.group(), self.links.group()] {
            self.world.set_group_transform(group, self.transform);
        }
        if let Some(fitted) = &self.fitted {
            self.axes.sync(&fitted.projection, self.transform);
            self.axes.render(&mut self.world);
        }
        trace!(
            k = self.transform.k,
            x = self.transform.x,
            y = self.transform.y,
            "zoomed"
        );
    }

    /// Wheel zoom about the pointer; positive `delta_y` zooms out.
    pub fn on_wheel(&mut self, delta_y: f64, pointer: Vec2) {
        let factor = 2f64.powf(-delta_y * self.config.wheel_sensitivity);
        let t = self.zoom.scale_by(self.transform, factor, pointer);
        self.zoom_to(t);
    }

    pub fn on_pointer_down(&mut self, pointer: Vec2) {
        self.drag_from = Some(pointer);
    }

    /// Pans while dragging, otherwise tracks hover and moves the tooltip.
    pub fn on_pointer_move(&mut self, pointer: Vec2) {
        if let Some(from) = self.drag_from {
            self.drag_from = Some(pointer);
            let t = self.zoom.pan_by(self.transform, pointer - from);
            self.zoom_to(t);
            return;
        }

        let target = self.pick(pointer);
        if target != self.hovered {
            self.leave_hovered();
            let content = match target {
                Some(Hovered::Link(id)) => self.links.pointer_enter(&mut self.world, id),
                Some(Hovered::Gauge(id)) => self.gauges.pointer_enter(&mut self.world, id),
                None => None,
            };
            if let Some(content) = content {
                self.tooltip.display(content);
                self.hovered = target;
            }
        }
        self.tooltip.move_to(pointer);
        self.tooltip.render(&mut self.world, self.tooltip_group);
    }

    pub fn on_pointer_up(&mut self) {
        self.drag_from = None;
    }

    /// The pointer left the map.
    pub fn on_pointer_leave(&mut self) {
        self.drag_from = None;
        self.leave_hovered();
        self.tooltip.render(&mut self.world, self.tooltip_group);
    }

    /// The selection a click at `pointer` makes, if it lands on a link or gauge.
    pub fn on_click(&self, pointer: Vec2) -> Option<ParamAction> {
        match self.pick(pointer)? {
            Hovered::Link(id) => self.links.click(id),
            Hovered::Gauge(id) => self.gauges.click(id),
        }
    }

    /// Selects whatever is under `pointer` and refreshes the side plots.
    pub async fn click(&mut self, pointer: Vec2) -> Result<Option<RenderTrigger>, DashboardError> {
        match self.on_click(pointer) {
            Some(action) => self.dispatch(action).await.map(Some),
            None => Ok(None),
        }
    }

    fn pick(&self, pointer: Vec2) -> Option<Hovered> {
        let opts = PickOptions {
            max_distance_px: self.config.pick_radius_px,
        };
        let groups = [self.links.group(), self.gauges.group()];
        let hit = pick_point(&self.world, &groups, pointer, opts)?;
        match self.links.link_at(hit.element) {
            Some(link) => Some(Hovered::Link(link)),
            None => self.gauges.link_at(hit.element).map(Hovered::Gauge),
        }
    }

    fn leave_hovered(&mut self) {
        match self.hovered.take() {
            Some(Hovered::Link(id)) => self.links.pointer_leave(&mut self.world, id),
            Some(Hovered::Gauge(id)) => self.gauges.pointer_leave(&mut self.world, id),
            None => {}
        }
        self.tooltip.hide();
    }

    /// Hides the tooltip when the hovered element left in a join.
    fn drop_vanished_hover(&mut self) {
        let gone = match self.hovered {
            Some(Hovered::Link(id)) => self.links.element(id).is_none(),
            Some(Hovered::Gauge(id)) => self.gauges.element(id).is_none(),
            None => false,
        };
        if gone {
            self.hovered = None;
            self.tooltip.hide();
            self.tooltip.render(&mut self.world, self.tooltip_group);
        }
    }

    /// The map as a standalone SVG document.
    pub fn map_svg(&self) -> String {
        let map = &self.config.map;
        let title = self.params.as_ref().map(|p| {
            format!(
                "{} at {}",
                legend_title(
                    p.aggregation,
                    p.da_stage,
                    p.inflation,
                    &state_variable(&p.state_variable),
                ),
                p.timestamp.display_label()
            )
        });
        to_svg(&self.world, map.width, map.height, title.as_deref())
    }

    pub fn distribution_svg(&self) -> Option<String> {
        self.distribution.as_ref()?;
        let c = &self.config.distribution_plot;
        Some(to_svg(&self.distribution_world, c.width, c.height, None))
    }

    pub fn hydrograph_svg(&self) -> Option<String> {
        self.hydrograph.as_ref()?;
        let c = &self.config.hydrograph_plot;
        Some(to_svg(&self.hydrograph_world, c.width, c.height, None))
    }

    pub fn hydrograph_inflation_svg(&self) -> Option<String> {
        self.hydrograph_inflation.as_ref()?;
        let c = &self.config.hydrograph_plot;
        Some(to_svg(&self.hydrograph_inflation_world, c.width, c.height, None))
    }
}
