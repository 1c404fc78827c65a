use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::color::FColor;
use crate::error::Error;
use crate::histogram::HistItem;
use crate::progress::Phase;

/// A box of the median cut
pub(crate) struct Cluster {
    pub entries: Vec<HistItem>,
    pub mean: FColor,
    pub weight: f64,
    /// Weighted sum of squared distances to the mean
    pub error: f64,
    priority: f32,
    widest_chan: usize,
}

impl Ord for Cluster {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.total_cmp(&other.priority)
    }
}

impl PartialOrd for Cluster {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for Cluster {}

impl PartialEq for Cluster {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Cluster {
    pub(crate) fn new(entries: Vec<HistItem>) -> Self {
        let mut weight = 0f64;
        let mut sum = [0f64; 4];

        for e in entries.iter() {
            let w = e.weight as f64;
            for ch in 0..4 {
                sum[ch] += e.color[ch] as f64 * w;
            }
            weight += w;
        }

        let mean = if weight > 0.0 {
            sum.map(|s| (s / weight) as f32)
        } else {
            [0.0; 4]
        };

        let mut variance = [0f64; 4];
        for e in entries.iter() {
            let w = e.weight as f64;
            for ch in 0..4 {
                let d = (e.color[ch] - mean[ch]) as f64;
                variance[ch] += d * d * w;
            }
        }

        let mut widest_chan = 0;
        for ch in 1..4 {
            if variance[ch] > variance[widest_chan] {
                widest_chan = ch;
            }
        }

        let error: f64 = variance.iter().sum();

        let priority = if entries.len() < 2 || error <= 0.0 {
            -1.0
        } else {
            (variance[widest_chan] / weight * weight.sqrt()) as f32
        };

        Self {
            entries,
            mean,
            weight,
            error,
            priority,
            widest_chan,
        }
    }

    fn can_split(&self) -> bool {
        self.priority >= 0.0
    }

    /// Splits at the weighted median of the widest channel. Both halves
    /// are non-empty.
    fn split(self) -> (Cluster, Cluster) {
        let chan = self.widest_chan;
        let mut entries = self.entries;

        entries.sort_unstable_by(|a, b| a.color[chan].total_cmp(&b.color[chan]));

        let half = self.weight / 2.0;
        let mut acc = 0f64;
        let mut split_pos = entries.len() - 1;

        for (i, e) in entries.iter().enumerate() {
            acc += e.weight as f64;
            if acc >= half {
                split_pos = i + 1;
                break;
            }
        }

        let split_pos = split_pos.clamp(1, entries.len() - 1);
        let rest = entries.split_off(split_pos);

        (Self::new(entries), Self::new(rest))
    }
}

/// Splits the items into at most `target` clusters.
///
/// Stops early once the mean error per unit of weight drops to
/// `target_mse`, or when nothing can be split any more.
pub(crate) fn median_cut(items: &[HistItem], target: usize, target_mse: f64, phase: &mut Phase) -> Result<Vec<Cluster>, Error> {
    if items.is_empty() || target == 0 {
        return Ok(vec![]);
    }

    let mut entries = Vec::new();
    entries.try_reserve_exact(items.len())?;
    entries.extend_from_slice(items);

    let root = Cluster::new(entries);
    let total_weight = root.weight.max(f64::MIN_POSITIVE);
    let mut total_error = root.error;

    let mut heap = BinaryHeap::new();
    heap.try_reserve(target)?;
    heap.push(root);

    while heap.len() < target {
        if total_error / total_weight <= target_mse {
            break;
        }

        match heap.peek() {
            Some(c) if c.can_split() => {},
            _ => break,
        }

        let Some(cluster) = heap.pop() else {
            break;
        };

        total_error -= cluster.error;

        let (a, b) = cluster.split();
        total_error += a.error + b.error;

        heap.push(a);
        heap.push(b);

        phase.step(heap.len(), target)?;
    }

    Ok(heap.into_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(v: f32, weight: f32) -> HistItem {
        HistItem { color: [v, v * 0.5, 0.0, 0.625], weight }
    }

    #[test]
    fn test_mean_is_weighted() {
        let c = Cluster::new(vec![item(0.0, 3.0), item(0.4, 1.0)]);

        assert!((c.mean[0] - 0.1).abs() < 1e-6);
        assert_eq!(4.0, c.weight);
        assert_eq!(0, c.widest_chan);
    }

    #[test]
    fn test_split_keeps_both_sides() {
        // Almost all weight on one side
        let c = Cluster::new(vec![item(0.0, 1000.0), item(0.1, 1.0), item(0.2, 1.0)]);
        let (a, b) = c.split();

        assert!(!a.entries.is_empty());
        assert!(!b.entries.is_empty());
        assert_eq!(3, a.entries.len() + b.entries.len());
    }

    #[test]
    fn test_cut_reaches_target() {
        let items: Vec<HistItem> = (0..100).map(|i| item(i as f32 / 100.0, 1.0)).collect();
        let clusters = median_cut(&items, 10, 0.0, &mut Phase::new(None, 0.0, 0.0)).unwrap();

        assert_eq!(10, clusters.len());
        assert_eq!(100, clusters.iter().map(|c| c.entries.len()).sum::<usize>());
    }

    #[test]
    fn test_cut_stops_when_unsplittable() {
        let items = vec![item(0.5, 1.0), item(0.5, 2.0)];
        let clusters = median_cut(&items, 10, 0.0, &mut Phase::new(None, 0.0, 0.0)).unwrap();

        assert_eq!(1, clusters.len());
    }

    #[test]
    fn test_cut_stops_at_target_mse() {
        let items: Vec<HistItem> = (0..100).map(|i| item(i as f32 / 100.0, 1.0)).collect();
        let clusters = median_cut(&items, 100, 1.0, &mut Phase::new(None, 0.0, 0.0)).unwrap();

        assert_eq!(1, clusters.len());
    }
}
