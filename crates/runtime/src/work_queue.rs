//! Keyed, de-duplicating work queue for batched dispatch.
//!
//! Key properties:
//! - At most one item per key; re-submitting a key keeps its queue position.
//! - Batches are drawn from the best (smallest) priority class present, ordered
//!   by ascending rank, items without a rank last, then insertion order.
//! - Dispatched items stay in the queue until explicitly removed, so a key in
//!   flight is never queued twice, but they are never dispatched again and are
//!   not reprioritized.

use core::cmp::Ordering;

use foundation::precision::cmp_optional_rank;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Refreshed,
    /// The key is already dispatched; nothing changed.
    InFlight,
}

#[derive(Debug, Clone)]
struct Item<K, P, T> {
    key: K,
    seq: u64,
    priority: P,
    rank: Option<f64>,
    payload: T,
    dispatched: bool,
}

#[derive(Debug, Clone)]
pub struct WorkQueue<K, P, T> {
    next_seq: u64,
    items: Vec<Item<K, P, T>>,
}

impl<K, P, T> Default for WorkQueue<K, P, T> {
    fn default() -> Self {
        Self {
            next_seq: 0,
            items: Vec::new(),
        }
    }
}

impl<K, P, T> WorkQueue<K, P, T>
where
    K: Eq + Clone,
    P: Ord + Copy,
    T: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// All items, including dispatched ones awaiting removal.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items not yet handed out by [`WorkQueue::take_batch`].
    pub fn pending_len(&self) -> usize {
        self.items.iter().filter(|i| !i.dispatched).count()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.items.iter().any(|i| &i.key == key)
    }

    /// `(key, priority, rank, dispatched)` in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&K, P, Option<f64>, bool)> + '_ {
        self.items
            .iter()
            .map(|i| (&i.key, i.priority, i.rank, i.dispatched))
    }

    pub fn priority_of(&self, key: &K) -> Option<P> {
        self.items.iter().find(|i| &i.key == key).map(|i| i.priority)
    }

    /// Insert a new item or refresh the priority and rank of a queued one.
    pub fn upsert(&mut self, key: K, priority: P, rank: Option<f64>, payload: T) -> Upsert {
        if let Some(item) = self.items.iter_mut().find(|i| i.key == key) {
            if item.dispatched {
                return Upsert::InFlight;
            }
            item.priority = priority;
            item.rank = rank;
            item.payload = payload;
            return Upsert::Refreshed;
        }

        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.items.push(Item {
            key,
            seq,
            priority,
            rank,
            payload,
            dispatched: false,
        });
        Upsert::Inserted
    }

    /// Re-score every undispatched item.
    pub fn reprioritize<F>(&mut self, mut score: F)
    where
        F: FnMut(&K, &T) -> (P, Option<f64>),
    {
        for item in self.items.iter_mut().filter(|i| !i.dispatched) {
            let (priority, rank) = score(&item.key, &item.payload);
            item.priority = priority;
            item.rank = rank;
        }
    }

    /// Marks up to `max_for(priority)` items of the best pending priority as
    /// dispatched and returns them.
    pub fn take_batch<F>(&mut self, max_for: F) -> Option<(P, Vec<(K, T)>)>
    where
        F: FnOnce(P) -> usize,
    {
        let priority = self
            .items
            .iter()
            .filter(|i| !i.dispatched)
            .map(|i| i.priority)
            .min()?;
        let max = max_for(priority).max(1);

        let mut idxs: Vec<usize> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, i)| !i.dispatched && i.priority == priority)
            .map(|(idx, _)| idx)
            .collect();
        idxs.sort_by(|&a, &b| self.order(a, b));
        idxs.truncate(max);

        let batch = idxs
            .into_iter()
            .map(|idx| {
                let item = &mut self.items[idx];
                item.dispatched = true;
                (item.key.clone(), item.payload.clone())
            })
            .collect();
        Some((priority, batch))
    }

    pub fn remove(&mut self, key: &K) -> bool {
        let before = self.items.len();
        self.items.retain(|i| &i.key != key);
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn order(&self, a: usize, b: usize) -> Ordering {
        let (a, b) = (&self.items[a], &self.items[b]);
        cmp_optional_rank(a.rank, b.rank).then_with(|| a.seq.cmp(&b.seq))
    }
}

#[cfg(test)]
mod tests {
    use super::{Upsert, WorkQueue};

    fn all(_: u8) -> usize {
        usize::MAX
    }

    #[test]
    fn same_priority_without_rank_is_insertion_order() {
        let mut q: WorkQueue<&str, u8, ()> = WorkQueue::new();
        q.upsert("a", 0, None, ());
        q.upsert("b", 0, None, ());
        q.upsert("c", 0, None, ());

        let (_, batch) = q.take_batch(all).unwrap();
        let keys: Vec<_> = batch.into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn ranked_items_precede_unranked() {
        let mut q: WorkQueue<&str, u8, ()> = WorkQueue::new();
        q.upsert("none", 0, None, ());
        q.upsert("far", 0, Some(3.0), ());
        q.upsert("near", 0, Some(0.5), ());

        let (_, batch) = q.take_batch(all).unwrap();
        let keys: Vec<_> = batch.into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["near", "far", "none"]);
    }

    #[test]
    fn lower_priority_value_dispatches_first_in_sized_batches() {
        let mut q: WorkQueue<&str, u8, ()> = WorkQueue::new();
        q.upsert("late", 2, None, ());
        q.upsert("early1", 0, None, ());
        q.upsert("early2", 0, None, ());

        let (p, batch) = q.take_batch(|_| 1).unwrap();
        assert_eq!((p, batch[0].0), (0, "early1"));
        let (p, batch) = q.take_batch(|_| 1).unwrap();
        assert_eq!((p, batch[0].0), (0, "early2"));
        let (p, batch) = q.take_batch(|_| 1).unwrap();
        assert_eq!((p, batch[0].0), (2, "late"));
        assert!(q.take_batch(|_| 1).is_none());
        assert_eq!(q.len(), 3);
        assert_eq!(q.pending_len(), 0);
    }

    #[test]
    fn upsert_deduplicates_and_keeps_position() {
        let mut q: WorkQueue<&str, u8, u32> = WorkQueue::new();
        assert_eq!(q.upsert("a", 1, None, 1), Upsert::Inserted);
        assert_eq!(q.upsert("b", 1, None, 2), Upsert::Inserted);
        assert_eq!(q.upsert("a", 1, None, 3), Upsert::Refreshed);
        assert_eq!(q.len(), 2);

        let (_, batch) = q.take_batch(|_| 1).unwrap();
        assert_eq!(batch, vec![("a", 3)]);
        assert_eq!(q.upsert("a", 0, None, 4), Upsert::InFlight);
        assert_eq!(q.priority_of(&"a"), Some(1));
    }

    #[test]
    fn reprioritize_skips_dispatched() {
        let mut q: WorkQueue<&str, u8, ()> = WorkQueue::new();
        q.upsert("a", 1, None, ());
        q.upsert("b", 1, None, ());
        q.take_batch(|_| 1);

        q.reprioritize(|_, _| (0, Some(1.0)));
        assert_eq!(q.priority_of(&"a"), Some(1));
        assert_eq!(q.priority_of(&"b"), Some(0));
    }

    #[test]
    fn remove_and_clear() {
        let mut q: WorkQueue<&str, u8, ()> = WorkQueue::new();
        q.upsert("a", 0, None, ());
        q.upsert("b", 0, None, ());
        assert!(q.remove(&"a"));
        assert!(!q.remove(&"a"));
        assert!(q.contains(&"b"));
        q.clear();
        assert!(q.is_empty());
    }
}
