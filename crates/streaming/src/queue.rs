use std::sync::Arc;

use foundation::{LonLat, RegionKey, Viewport};
use parking_lot::Mutex;
use runtime::cancel::CancelSignal;
use runtime::work_queue::{Upsert, WorkQueue};
use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use crate::cache::BoundaryCache;
use crate::pipeline;
use crate::priority::{LoadConfig, PriorityClass};
use crate::request::LoadJob;
use crate::source::BoundarySource;

/// Live progress of the current drain.
///
/// `total_count` is the most jobs ever known to the current drain (completed
/// plus queued), not a remaining count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadProgress {
    pub is_loading: bool,
    pub loaded_count: usize,
    pub total_count: usize,
    pub current_class: Option<PriorityClass>,
}

/// A queued job as seen by observers.
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedJob {
    pub key: RegionKey,
    pub class: PriorityClass,
    pub distance: Option<f64>,
    pub dispatched: bool,
}

pub(crate) struct QueueState {
    pub(crate) jobs: WorkQueue<RegionKey, PriorityClass, LonLat>,
    pub(crate) signal: CancelSignal,
    pub(crate) draining: bool,
    pub(crate) progress: LoadProgress,
}

pub(crate) struct Shared {
    pub(crate) cache: Arc<BoundaryCache>,
    pub(crate) source: Arc<dyn BoundarySource>,
    pub(crate) config: LoadConfig,
    pub(crate) state: Mutex<QueueState>,
    progress_tx: watch::Sender<LoadProgress>,
}

impl Shared {
    /// Publishes `st.progress`. Call with the state lock held so observers see
    /// transitions in order.
    pub(crate) fn publish(&self, st: &QueueState) {
        self.progress_tx.send_replace(st.progress);
    }
}

/// Priority-ordered, throttled boundary loader.
///
/// Jobs are de-duplicated by key and drained by a single background task per
/// run: the best priority class present is dispatched first, in batches sized
/// and paced by [`LoadConfig`]. Each batch is awaited as a whole before the
/// next one starts.
///
/// Cloning yields another handle to the same queue. [`LoadQueue::submit`] spawns
/// onto the ambient tokio runtime.
#[derive(Clone)]
pub struct LoadQueue {
    shared: Arc<Shared>,
}

impl LoadQueue {
    pub fn new(
        cache: Arc<BoundaryCache>,
        source: Arc<dyn BoundarySource>,
        config: LoadConfig,
    ) -> Self {
        let (progress_tx, _) = watch::channel(LoadProgress::default());
        Self {
            shared: Arc::new(Shared {
                cache,
                source,
                config,
                state: Mutex::new(QueueState {
                    jobs: WorkQueue::new(),
                    signal: CancelSignal::new(),
                    draining: false,
                    progress: LoadProgress::default(),
                }),
                progress_tx,
            }),
        }
    }

    pub fn cache(&self) -> &Arc<BoundaryCache> {
        &self.shared.cache
    }

    pub fn config(&self) -> &LoadConfig {
        &self.shared.config
    }

    /// Queue boundaries for loading and start a drain if none is running.
    ///
    /// Keys already pending or resolved in the cache are dropped. Keys already
    /// queued keep their position; with a viewport their priority and distance
    /// are refreshed. Returns the number of newly queued jobs.
    pub fn submit<I>(&self, jobs: I, viewport: Option<&Viewport>) -> usize
    where
        I: IntoIterator<Item = LoadJob>,
    {
        let shared = &self.shared;
        let mut st = shared.state.lock();

        let mut added = 0usize;
        for job in jobs {
            if !shared.cache.state(&job.key).is_fetchable() {
                continue;
            }
            let (class, distance) = shared.config.classify(job.point, viewport);
            if st.jobs.contains(&job.key) && viewport.is_none() {
                continue;
            }
            if st.jobs.upsert(job.key, class, distance, job.point) == Upsert::Inserted {
                added += 1;
            }
        }

        if st.jobs.pending_len() == 0 {
            return added;
        }

        if st.draining {
            let known = st.progress.loaded_count + st.jobs.len();
            st.progress.total_count = st.progress.total_count.max(known);
        } else {
            st.draining = true;
            st.progress = LoadProgress {
                is_loading: true,
                loaded_count: 0,
                total_count: st.jobs.len(),
                current_class: None,
            };
            debug!("starting boundary drain with {} jobs", st.jobs.len());
            tokio::spawn(pipeline::drain(shared.clone(), st.signal.clone()));
        }
        shared.publish(&st);
        added
    }

    /// Re-score every queued, undispatched job against `viewport`.
    pub fn update_priorities(&self, viewport: &Viewport) {
        let config = &self.shared.config;
        let mut st = self.shared.state.lock();
        st.jobs
            .reprioritize(|_, point| config.classify(*point, Some(viewport)));
    }

    /// Stop the current drain at its next batch boundary and forget every
    /// queued job. Safe to call when idle.
    pub fn cancel(&self) {
        let mut st = self.shared.state.lock();
        if st.draining {
            debug!("cancelling boundary drain ({} jobs queued)", st.jobs.len());
        }
        st.signal.cancel();
        st.signal = CancelSignal::new();
        st.jobs.clear();
        st.draining = false;
        st.progress = LoadProgress::default();
        self.shared.publish(&st);
    }

    pub fn progress(&self) -> LoadProgress {
        self.shared.state.lock().progress
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadProgress> {
        self.shared.progress_tx.subscribe()
    }

    /// Resolves once no drain is running.
    pub async fn wait_idle(&self) {
        let mut rx = self.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|p| !p.is_loading).await;
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn jobs(&self) -> Vec<QueuedJob> {
        self.shared
            .state
            .lock()
            .jobs
            .entries()
            .map(|(key, class, distance, dispatched)| QueuedJob {
                key: key.clone(),
                class,
                distance,
                dispatched,
            })
            .collect()
    }
}
