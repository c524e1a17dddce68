//! Viewport-driven drill-down between top-level regions.

use std::sync::Arc;

use foundation::{LonLat, RegionId, Viewport};
use serde::{Deserialize, Serialize};
use streaming::{LoadJob, LoadQueue};
use tracing::{debug, info};

use crate::aggregate::SubRegionEntry;
use crate::hierarchy::{Region, RegionHierarchy};

/// Drill-down state of one map session.
///
/// `Overview` is the national view. `Unanchored` is zoomed in past the enter
/// threshold but over no known region. Only `Focused` has an active region and
/// visible child regions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum NavigationState {
    #[default]
    Overview,
    Unanchored,
    Focused { region: RegionId },
}

impl NavigationState {
    pub fn active_region(&self) -> Option<&RegionId> {
        match self {
            Self::Focused { region } => Some(region),
            _ => None,
        }
    }

    pub fn is_drilled_in(&self) -> bool {
        !matches!(self, Self::Overview)
    }

    pub fn child_regions_visible(&self) -> bool {
        matches!(self, Self::Focused { .. })
    }
}

/// What a single viewport change or command did to the navigation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Entered(RegionId),
    Switched { from: RegionId, to: RegionId },
    /// Panned off every region while still zoomed in.
    Left(RegionId),
    /// Zoomed out (or reset) to the overview.
    Exited,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Zoom at or above which the center region is discovered.
    pub enter_zoom: f64,
    /// Zoom below which a drilled-in view resets to the overview.
    pub exit_zoom: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            enter_zoom: 8.0,
            exit_zoom: 6.0,
        }
    }
}

/// Owns the navigation state and drives the boundary load queue from it.
pub struct RegionTracker {
    hierarchy: Arc<RegionHierarchy>,
    queue: LoadQueue,
    config: TrackerConfig,
    state: NavigationState,
    sub_regions: Arc<[SubRegionEntry]>,
}

impl RegionTracker {
    pub fn new(hierarchy: Arc<RegionHierarchy>, queue: LoadQueue, config: TrackerConfig) -> Self {
        Self {
            hierarchy,
            queue,
            config,
            state: NavigationState::Overview,
            sub_regions: Arc::from(Vec::new()),
        }
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn hierarchy(&self) -> &Arc<RegionHierarchy> {
        &self.hierarchy
    }

    pub fn queue(&self) -> &LoadQueue {
        &self.queue
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn active_region(&self) -> Option<&Region> {
        self.state
            .active_region()
            .and_then(|id| self.hierarchy.get(id))
    }

    /// Replaces the working set of sub-regions. Loads already queued are
    /// left alone.
    pub fn set_sub_regions(&mut self, sub_regions: Arc<[SubRegionEntry]>) {
        self.sub_regions = sub_regions;
    }

    pub fn sub_regions(&self) -> &Arc<[SubRegionEntry]> {
        &self.sub_regions
    }

    /// Sub-regions of the active region; empty unless focused.
    pub fn visible_sub_regions(&self) -> Vec<&SubRegionEntry> {
        match self.active_region() {
            Some(region) => self.hierarchy.children_of(region, &self.sub_regions),
            None => Vec::new(),
        }
    }

    /// Applies one pan/zoom update. Every call also re-scores queued loads.
    pub fn handle_viewport_change(&mut self, viewport: &Viewport) -> Option<Transition> {
        let zoom = viewport.zoom;
        let transition = match self.state.clone() {
            NavigationState::Overview if zoom < self.config.enter_zoom => None,
            _ if self.state.is_drilled_in() && zoom < self.config.exit_zoom => self.reset(),
            NavigationState::Overview | NavigationState::Unanchored
                if zoom >= self.config.enter_zoom =>
            {
                match self.locate(viewport.center) {
                    Some(found) => {
                        self.focus_on(found.clone(), Some(viewport));
                        Some(Transition::Entered(found))
                    }
                    None => None,
                }
            }
            NavigationState::Focused { region } if zoom >= self.config.enter_zoom => {
                match self.locate(viewport.center) {
                    Some(found) if found == region => None,
                    Some(found) => {
                        self.queue.cancel();
                        self.focus_on(found.clone(), Some(viewport));
                        Some(Transition::Switched {
                            from: region,
                            to: found,
                        })
                    }
                    None => {
                        self.queue.cancel();
                        self.state = NavigationState::Unanchored;
                        Some(Transition::Left(region))
                    }
                }
            }
            // Between the exit and enter thresholds nothing is re-evaluated.
            _ => None,
        };
        self.queue.update_priorities(viewport);
        if let Some(t) = &transition {
            info!("navigation: {t:?}");
        }
        transition
    }

    /// Makes `id` active without loading its children, cancelling loads for
    /// any other region. Unknown ids are ignored.
    pub fn focus(&mut self, id: &RegionId) -> Option<Transition> {
        self.hierarchy.get(id)?;
        let transition = match self.state.clone() {
            NavigationState::Focused { region } if &region == id => return None,
            NavigationState::Focused { region } => {
                self.queue.cancel();
                Transition::Switched {
                    from: region,
                    to: id.clone(),
                }
            }
            _ => Transition::Entered(id.clone()),
        };
        self.state = NavigationState::Focused { region: id.clone() };
        info!("navigation: {transition:?}");
        Some(transition)
    }

    /// Queues boundary loads for every child of the active region.
    pub fn load_children(&self, viewport: Option<&Viewport>) -> usize {
        let jobs = self.child_jobs();
        if jobs.is_empty() {
            return 0;
        }
        let submitted = self.queue.submit(jobs, viewport);
        debug!("queued {submitted} sub-region boundaries");
        submitted
    }

    /// Back to the overview. Returns `None` if already there.
    pub fn reset(&mut self) -> Option<Transition> {
        self.queue.cancel();
        if self.state == NavigationState::Overview {
            return None;
        }
        self.state = NavigationState::Overview;
        Some(Transition::Exited)
    }

    fn locate(&self, center: LonLat) -> Option<RegionId> {
        self.hierarchy
            .find_containing(center)
            .map(|r| r.id().clone())
    }

    fn focus_on(&mut self, id: RegionId, viewport: Option<&Viewport>) {
        self.state = NavigationState::Focused { region: id };
        self.load_children(viewport);
    }

    fn child_jobs(&self) -> Vec<LoadJob> {
        self.visible_sub_regions()
            .into_iter()
            .map(SubRegionEntry::load_job)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::future::pending;
    use std::sync::Arc;

    use foundation::{LonLat, RegionId, RegionKey, Viewport};
    use pretty_assertions::assert_eq;
    use streaming::{
        BoundaryCache, BoundaryRecord, BoundarySource, BoxFuture, LoadConfig, LoadQueue,
        SourceError,
    };

    use super::{NavigationState, RegionTracker, TrackerConfig, Transition};
    use crate::aggregate::SubRegionEntry;
    use crate::aggregate::tests::entry;
    use crate::hierarchy::tests::markets;

    /// A geocoder that never answers, so queued jobs stay observable.
    struct StalledSource;

    impl BoundarySource for StalledSource {
        fn fetch_boundary<'a>(
            &'a self,
            _key: &'a RegionKey,
        ) -> BoxFuture<'a, Result<Option<BoundaryRecord>, SourceError>> {
            Box::pin(pending())
        }
    }

    fn sub_regions() -> Arc<[SubRegionEntry]> {
        Arc::from(vec![
            entry("A1", -97.5, 30.0, 10, 1.0),
            entry("A2", -96.5, 30.5, 10, 1.0),
            entry("B1", -95.0, 30.0, 10, 1.0),
            entry("Far", -80.0, 40.0, 10, 1.0),
        ])
    }

    fn tracker() -> RegionTracker {
        let queue = LoadQueue::new(
            Arc::new(BoundaryCache::new()),
            Arc::new(StalledSource),
            LoadConfig::default(),
        );
        let mut t = RegionTracker::new(Arc::new(markets()), queue, TrackerConfig::default());
        t.set_sub_regions(sub_regions());
        t
    }

    fn at(lon: f64, lat: f64, zoom: f64) -> Viewport {
        Viewport::around(LonLat::new(lon, lat), zoom, 0.5)
    }

    fn queued_names(t: &RegionTracker) -> Vec<String> {
        let mut names: Vec<String> = t.queue().jobs().into_iter().map(|j| j.key.name).collect();
        names.sort();
        names
    }

    fn focused(id: &str) -> NavigationState {
        NavigationState::Focused {
            region: RegionId::new(id),
        }
    }

    #[test]
    fn flags_follow_the_state() {
        let flags = |s: &NavigationState| {
            (
                s.active_region().cloned(),
                s.is_drilled_in(),
                s.child_regions_visible(),
            )
        };
        assert_eq!(flags(&NavigationState::Overview), (None, false, false));
        assert_eq!(flags(&NavigationState::Unanchored), (None, true, false));
        let f = focused("Market-A");
        assert_eq!(f.active_region(), Some(&RegionId::new("Market-A")));
        assert!(f.is_drilled_in() && f.child_regions_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn zoom_in_discovers_the_center_region() {
        let mut t = tracker();
        assert_eq!(t.handle_viewport_change(&at(-97.0, 30.0, 7.0)), None);
        assert_eq!(t.state(), &NavigationState::Overview);

        let transition = t.handle_viewport_change(&at(-97.0, 30.0, 9.0));
        assert_eq!(transition, Some(Transition::Entered(RegionId::new("Market-A"))));
        assert_eq!(t.state(), &focused("Market-A"));
        assert_eq!(queued_names(&t), vec!["A1", "A2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn zoom_in_over_nothing_stays_in_overview() {
        let mut t = tracker();
        assert_eq!(t.handle_viewport_change(&at(-80.0, 45.0, 9.0)), None);
        assert_eq!(t.state(), &NavigationState::Overview);
        assert!(t.queue().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn pan_across_boundary_switches_region() {
        let mut t = tracker();
        t.handle_viewport_change(&at(-97.0, 30.0, 9.0));
        assert_eq!(t.handle_viewport_change(&at(-96.8, 30.2, 9.0)), None);

        let transition = t.handle_viewport_change(&at(-95.0, 30.0, 9.0));
        assert_eq!(
            transition,
            Some(Transition::Switched {
                from: RegionId::new("Market-A"),
                to: RegionId::new("Market-B"),
            })
        );
        assert_eq!(t.state(), &focused("Market-B"));
        assert_eq!(queued_names(&t), vec!["B1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn pan_into_the_void_keeps_drill_in() {
        let mut t = tracker();
        t.handle_viewport_change(&at(-97.0, 30.0, 9.0));

        let transition = t.handle_viewport_change(&at(-90.0, 30.0, 9.0));
        assert_eq!(transition, Some(Transition::Left(RegionId::new("Market-A"))));
        assert_eq!(t.state(), &NavigationState::Unanchored);
        assert!(t.queue().is_empty());

        let transition = t.handle_viewport_change(&at(-95.0, 30.0, 9.0));
        assert_eq!(transition, Some(Transition::Entered(RegionId::new("Market-B"))));
    }

    #[tokio::test(start_paused = true)]
    async fn zoom_out_exits_and_cancels() {
        let mut t = tracker();
        t.handle_viewport_change(&at(-97.0, 30.0, 9.0));
        assert!(!t.queue().is_empty());

        // Inside the hysteresis band nothing changes.
        assert_eq!(t.handle_viewport_change(&at(-95.0, 30.0, 7.0)), None);
        assert_eq!(t.state(), &focused("Market-A"));

        assert_eq!(t.handle_viewport_change(&at(-97.0, 30.0, 5.0)), Some(Transition::Exited));
        assert_eq!(t.state(), &NavigationState::Overview);
        assert!(t.queue().is_empty());
        assert!(!t.queue().progress().is_loading);
    }

    #[tokio::test(start_paused = true)]
    async fn viewport_changes_rescore_queued_jobs() {
        let mut t = tracker();
        t.handle_viewport_change(&at(-97.5, 30.0, 9.0));
        let a2 = |t: &RegionTracker| {
            t.queue()
                .jobs()
                .into_iter()
                .find(|j| j.key.name == "A2")
                .and_then(|j| j.distance)
                .unwrap()
        };
        let before = a2(&t);
        t.handle_viewport_change(&at(-96.5, 30.5, 9.0));
        assert!(a2(&t) < before);
    }

    #[tokio::test(start_paused = true)]
    async fn focus_and_load_children_separately() {
        let mut t = tracker();
        let id = RegionId::new("Market-B");
        assert_eq!(t.focus(&id), Some(Transition::Entered(id.clone())));
        assert!(t.queue().is_empty());
        assert_eq!(t.focus(&id), None);
        assert_eq!(t.focus(&RegionId::new("nope")), None);

        assert_eq!(t.load_children(None), 1);
        assert_eq!(t.visible_sub_regions().len(), 1);

        assert_eq!(t.reset(), Some(Transition::Exited));
        assert!(t.queue().is_empty());
        assert_eq!(t.reset(), None);
        assert!(t.visible_sub_regions().is_empty());
    }
}
