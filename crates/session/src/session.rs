//! One interactive map session.
//!
//! [`MapSession`] owns the navigation tracker, the selection and the current
//! lead dataset, and turns host input (viewport changes, clicks, hovers) into
//! load-queue work, [`SessionEvent`]s and a per-frame [`RenderState`].

use std::collections::HashSet;
use std::sync::Arc;

use foundation::{BoundingBox, RegionId, Viewport};
use runtime::EventBus;
use scene::{
    Grouping, LeadStats, NavigationState, PostalDirectory, RegionHierarchy, RegionTracker,
    SelectionStore, SubRegionEntry, Transition, group_by_sub_region,
};
use streaming::{
    BoundaryCache, BoundarySource, LeadQuery, LeadSource, LoadProgress, LoadQueue, SourceError,
};
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::config::SessionConfig;
use crate::events::SessionEvent;
use crate::render::{ActiveRegion, RenderState, SubRegionView};
use crate::surface::MapSurface;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("unknown region {0}")]
    UnknownRegion(RegionId),
    #[error("lead data unavailable: {0}")]
    Leads(#[from] SourceError),
    #[error("no lead query has been issued yet")]
    NothingToReload,
}

/// External services a session talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub boundaries: Arc<dyn BoundarySource>,
    pub leads: Arc<dyn LeadSource>,
    pub surface: Arc<dyn MapSurface>,
    pub cache: Arc<BoundaryCache>,
}

pub struct MapSession {
    config: SessionConfig,
    tracker: RegionTracker,
    selection: SelectionStore,
    events: EventBus<SessionEvent>,
    directory: PostalDirectory,
    leads: Arc<dyn LeadSource>,
    surface: Arc<dyn MapSurface>,
    grouping: Grouping,
    last_query: Option<LeadQuery>,
    error: Option<String>,
}

impl MapSession {
    pub fn new(
        config: SessionConfig,
        hierarchy: Arc<RegionHierarchy>,
        directory: PostalDirectory,
        collaborators: Collaborators,
    ) -> Self {
        let queue = LoadQueue::new(
            collaborators.cache,
            collaborators.boundaries,
            config.load.clone(),
        );
        let tracker = RegionTracker::new(hierarchy, queue, config.tracker);
        Self {
            config,
            tracker,
            selection: SelectionStore::new(),
            events: EventBus::new(),
            directory,
            leads: collaborators.leads,
            surface: collaborators.surface,
            grouping: Grouping::default(),
            last_query: None,
            error: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn navigation(&self) -> &NavigationState {
        self.tracker.state()
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    pub fn sub_regions(&self) -> &[SubRegionEntry] {
        self.tracker.sub_regions()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Notifications since the last call, oldest first.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.events.drain()
    }

    pub fn progress(&self) -> LoadProgress {
        self.tracker.queue().progress()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<LoadProgress> {
        self.tracker.queue().subscribe()
    }

    /// Resolves once no boundary drain is running.
    pub async fn wait_idle(&self) {
        self.tracker.queue().wait_idle().await;
    }

    /// Bounding box of every postal point in the current dataset.
    pub fn data_extent(&self) -> Option<BoundingBox> {
        self.grouping.extent()
    }

    /// Fetches lead data for `query` and rebuilds the sub-region set.
    ///
    /// On failure the previous dataset stays in place, the error is kept for
    /// [`RenderState::error`] and an [`SessionEvent::Error`] is emitted.
    pub async fn load_leads(&mut self, query: LeadQuery) -> Result<(), SessionError> {
        self.last_query = Some(query.clone());
        let records = match self.leads.fetch_leads(&query).await {
            Ok(records) => records,
            Err(err) => {
                error!("lead data load for {} failed: {err}", query.campaign);
                let message = err.to_string();
                self.error = Some(message.clone());
                self.events.emit(SessionEvent::Error { message });
                return Err(err.into());
            }
        };

        self.grouping = group_by_sub_region(&records, &self.directory);
        self.error = None;
        self.tracker
            .set_sub_regions(Arc::from(self.grouping.sub_regions.clone()));
        info!(
            "loaded {} lead records into {} sub-regions ({} unplaced)",
            records.len(),
            self.grouping.sub_regions.len(),
            self.grouping.unplaced.len()
        );
        self.events.emit(SessionEvent::DataLoaded {
            records: records.len(),
            sub_regions: self.grouping.sub_regions.len(),
        });

        if self.tracker.state().child_regions_visible() {
            self.tracker.load_children(None);
        }
        Ok(())
    }

    /// Re-issues the last lead query.
    pub async fn reload(&mut self) -> Result<(), SessionError> {
        let query = self.last_query.clone().ok_or(SessionError::NothingToReload)?;
        self.load_leads(query).await
    }

    pub fn handle_viewport_change(&mut self, viewport: &Viewport) -> Option<Transition> {
        let transition = self.tracker.handle_viewport_change(viewport);
        if transition.is_some() {
            self.emit_navigation();
        }
        transition
    }

    /// Click on a top-level region.
    ///
    /// Zooms out to the data extent first when already drilled in, then
    /// focuses `id`, zooms into it and loads its children. Each camera move
    /// is awaited and followed by its settle delay. Clicking the active
    /// region does nothing.
    pub async fn select_region(&mut self, id: &RegionId) -> Result<(), SessionError> {
        if self.tracker.state().active_region() == Some(id) {
            return Ok(());
        }
        let bounds = self
            .tracker
            .hierarchy()
            .get(id)
            .ok_or_else(|| SessionError::UnknownRegion(id.clone()))?
            .bounding_box();

        if self.tracker.state().is_drilled_in() {
            self.tracker.queue().cancel();
            self.surface.fly_to_bounds(self.overview_bounds()).await;
            tokio::time::sleep(self.config.settle_after_zoom_out()).await;
        }

        if self.tracker.focus(id).is_some() {
            self.emit_navigation();
        }

        let viewport = match bounds {
            Some(bounds) => {
                self.surface.fly_to_bounds(bounds).await;
                tokio::time::sleep(self.config.settle_after_zoom_in()).await;
                Some(Viewport::new(
                    bounds.center(),
                    self.config.tracker.enter_zoom,
                    bounds,
                ))
            }
            None => None,
        };
        self.tracker.load_children(viewport.as_ref());
        Ok(())
    }

    /// Back to the overview. Selection is kept.
    pub async fn reset(&mut self) {
        if self.tracker.reset().is_some() {
            self.emit_navigation();
        }
        self.surface.fly_to_bounds(self.overview_bounds()).await;
    }

    /// Emits [`SessionEvent::MarkerActivated`] for a loaded postal code.
    pub fn activate_marker(&mut self, postal_code: &str) -> bool {
        let Some(placed) = self
            .grouping
            .placed
            .iter()
            .find(|p| p.record.postal_code == postal_code)
        else {
            debug!("no marker for postal code {postal_code}");
            return false;
        };
        self.events.emit(SessionEvent::MarkerActivated {
            record: placed.record.clone(),
        });
        true
    }

    /// Returns `true` if `name` is selected afterwards.
    pub fn toggle_selection(&mut self, name: &str) -> bool {
        let selected = self.selection.toggle(name);
        self.emit_selection();
        selected
    }

    pub fn set_hovered(&mut self, name: Option<&str>) {
        if self.selection.set_hovered(name) {
            self.events.emit(SessionEvent::HoverChanged {
                name: name.map(str::to_string),
            });
        }
    }

    pub fn clear_selection(&mut self) {
        let had_hover = self.selection.hovered().is_some();
        self.selection.clear_all();
        self.emit_selection();
        if had_hover {
            self.events.emit(SessionEvent::HoverChanged { name: None });
        }
    }

    pub fn aggregate_stats(&self) -> Option<LeadStats> {
        self.selection.aggregate_stats(self.tracker.sub_regions())
    }

    pub fn render_state(&self) -> RenderState {
        let active_region = self.tracker.active_region().map(|r| ActiveRegion {
            id: r.id().clone(),
            name: r.name().to_string(),
            bounds: r.bounding_box(),
            centroid: r.centroid(),
        });

        let visible = self.tracker.visible_sub_regions();
        let boundaries = self
            .tracker
            .queue()
            .cache()
            .resolved_for(visible.iter().map(|s| &s.key));
        let loaded: HashSet<_> = boundaries.iter().map(|b| &b.key).collect();

        let sub_regions = visible
            .iter()
            .map(|entry| SubRegionView {
                entry: (*entry).clone(),
                selected: self.selection.is_selected(entry.name()),
                hovered: self.selection.hovered() == Some(entry.name()),
                has_boundary: loaded.contains(&entry.key),
            })
            .collect();

        let visible_codes: HashSet<&str> = visible
            .iter()
            .flat_map(|s| s.postal_codes.iter().map(String::as_str))
            .collect();
        let markers = self
            .grouping
            .placed
            .iter()
            .filter(|p| visible_codes.contains(p.record.postal_code.as_str()))
            .cloned()
            .collect();

        RenderState {
            navigation: self.tracker.state().clone(),
            active_region,
            sub_regions,
            boundaries: boundaries.iter().map(|b| (**b).clone()).collect(),
            markers,
            progress: self.progress(),
            error: self.error.clone(),
        }
    }

    /// Lead data extent, else the topology extent, else the configured view.
    fn overview_bounds(&self) -> BoundingBox {
        self.data_extent()
            .or_else(|| self.tracker.hierarchy().extent())
            .unwrap_or(self.config.default_view)
    }

    fn emit_navigation(&mut self) {
        self.events.emit(SessionEvent::NavigationChanged {
            state: self.tracker.state().clone(),
        });
    }

    fn emit_selection(&mut self) {
        self.events.emit(SessionEvent::SubRegionsSelected {
            names: self.selection.selected().to_vec(),
        });
    }
}
