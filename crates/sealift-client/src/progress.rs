use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Observer for overall upload progress, called with a percentage in 0..=100.
pub type ProgressFn = Arc<dyn Fn(f64) + Send + Sync>;

/// Folds per-part progress into one overall percentage:
/// `(part index + part fraction) / total parts * 100`, held below 100 until
/// the session actually finalizes. The observable value only moves forward;
/// late reports from slower parts are clamped away.
#[derive(Clone)]
pub struct ProgressTracker {
    total_parts: usize,
    // hundredths of a percent, so fetch_max works on an integer
    reported: Arc<AtomicU64>,
    callback: Option<ProgressFn>,
}

impl ProgressTracker {
    pub fn new(total_parts: usize, callback: Option<ProgressFn>) -> Self {
        Self {
            total_parts,
            reported: Arc::new(AtomicU64::new(0)),
            callback,
        }
    }

    /// Reports that `fraction` (0..=1) of the part at `index` has been sent.
    pub fn part_progress(&self, index: usize, fraction: f64) {
        if self.total_parts == 0 {
            return;
        }
        let overall =
            (index as f64 + fraction.clamp(0.0, 1.0)) / self.total_parts as f64 * 100.0;
        self.report(overall.min(99.0));
    }

    /// Reports completion; the only path that may reach 100.
    pub fn finished(&self) {
        self.report(100.0);
    }

    pub fn current(&self) -> f64 {
        self.reported.load(Ordering::Relaxed) as f64 / 100.0
    }

    fn report(&self, percent: f64) {
        let hundredths = (percent * 100.0).round() as u64;
        let previous = self.reported.fetch_max(hundredths, Ordering::Relaxed);
        if hundredths > previous
            && let Some(callback) = &self.callback
        {
            callback(hundredths as f64 / 100.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::ProgressTracker;

    fn recording_tracker(total_parts: usize) -> (ProgressTracker, Arc<Mutex<Vec<f64>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let tracker = ProgressTracker::new(
            total_parts,
            Some(Arc::new(move |percent| sink.lock().unwrap().push(percent))),
        );
        (tracker, seen)
    }

    #[test]
    fn overall_progress_is_capped_below_one_hundred_until_finished() {
        let (tracker, seen) = recording_tracker(3);
        tracker.part_progress(2, 1.0);
        assert_eq!(tracker.current(), 99.0);
        tracker.finished();
        assert_eq!(*seen.lock().unwrap().last().unwrap(), 100.0);
    }

    #[test]
    fn observable_progress_never_moves_backwards() {
        let (tracker, seen) = recording_tracker(4);
        tracker.part_progress(2, 0.5); // 62.5
        tracker.part_progress(0, 1.0); // 25, late report from an earlier part
        tracker.part_progress(3, 0.0); // 75
        let seen = seen.lock().unwrap();
        assert!(seen.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(*seen.last().unwrap(), 75.0);
    }

    #[test]
    fn part_fraction_maps_to_the_part_share() {
        let (tracker, _) = recording_tracker(2);
        tracker.part_progress(0, 0.5);
        assert_eq!(tracker.current(), 25.0);
        tracker.part_progress(1, 0.5);
        assert_eq!(tracker.current(), 75.0);
    }
}
