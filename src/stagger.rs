use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingStart<T> {
    due_at: Instant,
    target: T,
}

/// Delayed starts that fire on `tick` once their deadline passes.
///
/// Nothing here runs on its own: the owner calls [`StaggeredStarts::tick`]
/// from its loop and acts on whatever comes back.
#[derive(Debug, Clone)]
pub struct StaggeredStarts<T> {
    pending: Vec<PendingStart<T>>,
}

impl<T> Default for StaggeredStarts<T> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<T> StaggeredStarts<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `targets` so the n-th one becomes due `n * delay` after `now`.
    pub fn schedule(&mut self, targets: impl IntoIterator<Item = T>, delay: Duration, now: Instant) {
        let mut due_at = now;
        for target in targets {
            self.pending.push(PendingStart { due_at, target });
            due_at += delay;
        }
        self.pending.sort_by_key(|start| start.due_at);
    }

    /// Removes and returns every start whose deadline is at or before `now`,
    /// earliest first.
    pub fn tick(&mut self, now: Instant) -> Vec<T> {
        let split = self
            .pending
            .iter()
            .position(|start| start.due_at > now)
            .unwrap_or(self.pending.len());
        self.pending
            .drain(..split)
            .map(|start| start.target)
            .collect()
    }

    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.pending.len();
        self.pending.clear();
        cancelled
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.first().map(|start| start.due_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: Duration = Duration::from_millis(200);

    #[test]
    fn starts_fire_in_deadline_order() {
        let now = Instant::now();
        let mut starts = StaggeredStarts::new();
        starts.schedule([0, 1, 2], STEP, now);

        assert_eq!(starts.tick(now), vec![0]);
        assert!(starts.tick(now + STEP / 2).is_empty());
        assert_eq!(starts.tick(now + STEP), vec![1]);
        assert_eq!(starts.tick(now + STEP * 5), vec![2]);
        assert!(starts.is_empty());
    }

    #[test]
    fn cancel_all_drops_pending_starts() {
        let now = Instant::now();
        let mut starts = StaggeredStarts::new();
        starts.schedule(["a", "b", "c"], STEP, now);
        assert_eq!(starts.tick(now), vec!["a"]);

        assert_eq!(starts.cancel_all(), 2);
        assert!(starts.tick(now + STEP * 10).is_empty());
        assert_eq!(starts.next_deadline(), None);
    }

    #[test]
    fn later_batches_interleave_by_deadline() {
        let now = Instant::now();
        let mut starts = StaggeredStarts::new();
        starts.schedule([1, 2], STEP * 2, now);
        starts.schedule([10], STEP, now + STEP);

        assert_eq!(starts.len(), 3);
        assert_eq!(starts.tick(now + STEP * 2), vec![1, 10, 2]);
    }
}
