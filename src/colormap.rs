use crate::color::{dist, FColor};
use crate::vpsearch::SearchTree;

/// Nearest palette color search.
///
/// Every entry has a radius (squared) within which it is certainly the
/// nearest color, which lets runs of similar pixels skip the tree.
pub(crate) struct Colormap {
    tree: SearchTree,
    radius: Vec<f32>,
}

impl Colormap {
    pub(crate) fn new(colors: Vec<FColor>, popularity: &[f32]) -> Self {
        let radius = colors.iter().enumerate().map(|(i, c)| {
            let nearest = colors.iter().enumerate()
                .filter(|&(j, _)| i != j)
                .map(|(_, other)| dist(c, other))
                .fold(f32::MAX, f32::min);

            // Half the distance, squared
            nearest / 4.0
        }).collect();

        Self {
            tree: SearchTree::new(colors, popularity),
            radius,
        }
    }

    /// Returns the index of the nearest color and the squared distance.
    ///
    /// `likely` is checked first, the previous pixel's index is a good guess.
    pub(crate) fn nearest(&self, px: &FColor, likely: usize) -> (usize, f32) {
        if let Some(color) = self.tree.data().get(likely) {
            let distance_sq = dist(color, px);
            if distance_sq < self.radius[likely] {
                return (likely, distance_sq);
            }
        }

        self.tree.find_nearest(px)
    }

    pub(crate) fn color(&self, ind: usize) -> &FColor {
        &self.tree.data()[ind]
    }

    pub(crate) fn len(&self) -> usize {
        self.radius.len()
    }
}
