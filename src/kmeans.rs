use crate::attr::Attr;
use crate::color::FColor;
use crate::error::Error;
use crate::histogram::{FixedColor, HistItem};
use crate::progress::Phase;
use crate::vpsearch::SearchTree;

/// Palette color being refined
#[derive(Clone, Copy, Debug)]
pub(crate) struct Centroid {
    pub color: FColor,
    /// Total weight of the items nearest to this centroid
    pub popularity: f64,
    /// Fixed centroids never move
    pub fixed: Option<FixedColor>,
}

impl Centroid {
    pub(crate) fn new(color: FColor, popularity: f64) -> Self {
        Self { color, popularity, fixed: None }
    }

    pub(crate) fn fixed(fixed: FixedColor) -> Self {
        Self { color: fixed.f, popularity: 0.0, fixed: Some(fixed) }
    }
}

struct Pass {
    mse: f64,
    movement: f64,
}

/// Assigns every item to its nearest centroid. With `adjust` the movable
/// centroids are then moved to the weighted mean of their items.
fn iterate(items: &[HistItem], centroids: &mut [Centroid], adjust: bool) -> Result<Pass, Error> {
    let weights: Vec<f32> = centroids.iter().map(|c| c.popularity as f32).collect();
    let tree = SearchTree::new(centroids.iter().map(|c| c.color).collect(), &weights);

    let mut sums = Vec::new();
    sums.try_reserve_exact(centroids.len())?;
    sums.resize(centroids.len(), ([0f64; 4], 0f64));

    let mut total_error = 0f64;
    let mut total_weight = 0f64;

    for item in items {
        let (ind, distance_sq) = tree.find_nearest(&item.color);
        let w = item.weight as f64;

        let (sum, weight) = &mut sums[ind];
        for ch in 0..4 {
            sum[ch] += item.color[ch] as f64 * w;
        }
        *weight += w;

        total_error += distance_sq as f64 * w;
        total_weight += w;
    }

    let mut movement = 0f64;

    for (c, (sum, weight)) in centroids.iter_mut().zip(sums.iter()) {
        c.popularity = *weight;

        // Empty clusters keep their old color
        if !adjust || c.fixed.is_some() || *weight <= 0.0 {
            continue;
        }

        let new = sum.map(|s| (s / weight) as f32);
        movement += crate::color::dist(&c.color, &new) as f64 * weight;
        c.color = new;
    }

    if total_weight <= 0.0 {
        return Ok(Pass { mse: 0.0, movement: 0.0 });
    }

    Ok(Pass {
        mse: total_error / total_weight,
        movement: movement / total_weight,
    })
}

/// Refines centroids in place, returns the final mean squared error.
pub(crate) fn refine(items: &[HistItem], centroids: &mut [Centroid], attr: &Attr, phase: &mut Phase) -> Result<f64, Error> {
    let iterations = attr.kmeans_iterations();
    let limit = attr.kmeans_iteration_limit();

    for i in 0..iterations {
        let pass = iterate(items, centroids, true)?;

        log::trace!("k-means iteration {}: mse {:.6}, movement {:.9}", i, pass.mse, pass.movement);

        phase.step(i + 1, iterations)?;

        if pass.movement < limit {
            break;
        }
    }

    let pass = iterate(items, centroids, false)?;
    phase.finish()?;

    Ok(pass.mse)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::color::Color;

    fn item(v: f32, weight: f32) -> HistItem {
        HistItem { color: [v, v, v, 0.625], weight }
    }

    #[test]
    fn test_centroids_move_to_mean() {
        let mut attr = Attr::new();
        attr.set_speed(1).unwrap();

        let items = [item(0.0, 1.0), item(0.2, 1.0), item(0.8, 1.0), item(1.0, 1.0)];
        let mut centroids = [Centroid::new([0.3; 4], 1.0), Centroid::new([0.6; 4], 1.0)];
        centroids[0].color[3] = 0.625;
        centroids[1].color[3] = 0.625;

        let mse = refine(&items, &mut centroids, &attr, &mut Phase::new(None, 0.0, 0.0)).unwrap();

        assert_relative_eq!(0.1, centroids[0].color[0], epsilon = 1e-6);
        assert_relative_eq!(0.9, centroids[1].color[0], epsilon = 1e-6);
        assert_relative_eq!(2.0, centroids[0].popularity);
        // Each item is 0.1 away on three channels
        assert_relative_eq!(0.03, mse, epsilon = 1e-6);
    }

    #[test]
    fn test_fixed_centroid_stays() {
        let mut attr = Attr::new();
        attr.set_speed(1).unwrap();

        let fixed = FixedColor { color: Color::new(0, 0, 0, 255), gamma: 0.45455, f: [0.0, 0.0, 0.0, 0.625] };
        let items = [item(0.1, 1.0), item(0.2, 1.0)];
        let mut centroids = [Centroid::fixed(fixed)];

        refine(&items, &mut centroids, &attr, &mut Phase::new(None, 0.0, 0.0)).unwrap();

        assert_eq!([0.0, 0.0, 0.0, 0.625], centroids[0].color);
        assert_relative_eq!(2.0, centroids[0].popularity);
    }

    #[test]
    fn test_no_items() {
        let attr = Attr::new();
        let mut centroids = [Centroid::new([0.0; 4], 0.0)];

        let mse = refine(&[], &mut centroids, &attr, &mut Phase::new(None, 0.0, 0.0)).unwrap();

        assert_eq!(0.0, mse);
    }
}
