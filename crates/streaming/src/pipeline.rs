//! The drain task behind [`crate::LoadQueue`].
//!
//! One drain runs per queue at a time. It repeatedly takes a batch from the
//! best priority class still queued, fetches the whole batch concurrently,
//! records the outcomes and then pauses for the class's delay. The cancel
//! signal is checked at every batch boundary; fetches already in flight are
//! never aborted.

use std::sync::Arc;

use foundation::RegionKey;
use futures_util::future::join_all;
use runtime::cancel::CancelSignal;
use tracing::{debug, warn};

use crate::cache::BoundaryCache;
use crate::protocol::BoundaryRecord;
use crate::queue::Shared;
use crate::source::SourceError;

pub(crate) async fn drain(shared: Arc<Shared>, signal: CancelSignal) {
    loop {
        let (class, batch) = {
            let mut st = shared.state.lock();
            if signal.is_cancelled() {
                return;
            }
            let Some((class, batch)) = st
                .jobs
                .take_batch(|c| shared.config.policy(c).concurrency)
            else {
                st.draining = false;
                st.progress.is_loading = false;
                st.progress.current_class = None;
                shared.publish(&st);
                debug!(
                    "boundary drain finished ({} loaded)",
                    st.progress.loaded_count
                );
                return;
            };
            st.progress.current_class = Some(class);
            shared.publish(&st);
            (class, batch)
        };

        let mut skipped: Vec<RegionKey> = Vec::new();
        let mut fetches = Vec::with_capacity(batch.len());
        for (key, _point) in batch {
            // Another path may have claimed or resolved the key since it was queued.
            if !shared.cache.begin_fetch(&key) {
                skipped.push(key);
                continue;
            }
            let source = shared.source.clone();
            fetches.push(async move {
                let result = source.fetch_boundary(&key).await;
                (key, result)
            });
        }
        let results = join_all(fetches).await;

        let more = {
            let mut st = shared.state.lock();
            let cancelled = signal.is_cancelled();
            for (key, result) in results {
                settle(&shared.cache, &key, result);
                if !cancelled {
                    st.jobs.remove(&key);
                    st.progress.loaded_count += 1;
                }
            }
            if cancelled {
                debug!("boundary drain cancelled; batch results dropped");
                return;
            }
            for key in &skipped {
                st.jobs.remove(key);
                st.progress.loaded_count += 1;
            }
            shared.publish(&st);
            st.jobs.pending_len() > 0
        };

        if more {
            tokio::time::sleep(shared.config.policy(class).delay()).await;
        }
    }
}

/// Moves a fetched key out of `Pending`.
fn settle(
    cache: &BoundaryCache,
    key: &RegionKey,
    result: Result<Option<BoundaryRecord>, SourceError>,
) {
    let outcome = match result {
        Ok(Some(record)) => cache.resolve(key, record),
        Ok(None) => {
            debug!("no boundary found for {key}");
            cache.fail(key)
        }
        Err(err) => {
            warn!("boundary fetch for {key} failed: {err}");
            cache.fail(key)
        }
    };
    if let Err(err) = outcome {
        warn!("boundary cache out of step: {err}");
    }
}
