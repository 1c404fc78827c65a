use std::cmp::Ordering;

use crate::color::{dist, FColor};

#[derive(Clone, Copy)]
struct SearchIdx {
    ind: usize,
    distance_sq: f32,
    weight: f32,
}

struct SearchVisitor {
    ind: usize,
    distance: f32,
    distance_sq: f32,
}

impl SearchVisitor {
    fn new() -> Self {
        Self {
            ind: 0,
            distance: f32::MAX,
            distance_sq: f32::MAX,
        }
    }

    fn visit(&mut self, ind: usize, distance_sq: f32) {
        if self.distance_sq > distance_sq {
            self.ind = ind;
            self.distance = distance_sq.sqrt();
            self.distance_sq = distance_sq;
        }
    }
}

struct SearchNode {
    ind: usize,
    near: Option<Box<Self>>,
    far: Option<Box<Self>>,
    rest: Box<[usize]>,
    radius: f32,
    radius_sq: f32,
}

impl SearchNode {
    fn new(indexes: &mut [SearchIdx], data: &[FColor]) -> Option<Box<Self>> {
        if indexes.is_empty() {
            return None;
        }

        // The most popular color is the most likely answer, so it's checked first
        let vp_pos = indexes.iter().enumerate()
            .max_by(|&(_, a), &(_, b)| a.weight.total_cmp(&b.weight))
            .map(|(i, _)| i)
            .unwrap_or(0);

        indexes.swap(0, vp_pos);

        let vp_ind = indexes[0].ind;
        let vp_data = &data[vp_ind];

        let indexes = &mut indexes[1..];

        for i in indexes.iter_mut() {
            i.distance_sq = dist(vp_data, &data[i.ind]);
        }

        indexes.sort_unstable_by(|a, b| {
            a.distance_sq.partial_cmp(&b.distance_sq).unwrap_or(Ordering::Equal)
        });

        let (near, far, rest, radius_sq) = if indexes.len() < 7 {
            let rest: Box<[usize]> = indexes.iter().map(|i| i.ind).collect();
            (None, None, rest, f32::MAX)
        } else {
            let half_idx = indexes.len() / 2;
            let (near_indexes, far_indexes) = indexes.split_at_mut(half_idx);
            let radius_sq = far_indexes[0].distance_sq;

            (
                Self::new(near_indexes, data),
                Self::new(far_indexes, data),
                Box::default(),
                radius_sq,
            )
        };

        Some(Box::new(Self {
            ind: vp_ind,
            near,
            far,
            rest,
            radius: radius_sq.sqrt(),
            radius_sq,
        }))
    }

    fn visit(&self, pin: &FColor, data: &[FColor], nearest: &mut SearchVisitor) {
        let distance_sq = dist(&data[self.ind], pin);

        nearest.visit(self.ind, distance_sq);

        if !self.rest.is_empty() {
            for &r in self.rest.iter() {
                nearest.visit(r, dist(&data[r], pin));
            }

            return;
        }

        if distance_sq < self.radius_sq {
            if let Some(near) = &self.near {
                near.visit(pin, data, nearest);
            }
            if distance_sq.sqrt() >= self.radius - nearest.distance {
                if let Some(far) = &self.far {
                    far.visit(pin, data, nearest);
                }
            }
        } else {
            if let Some(far) = &self.far {
                far.visit(pin, data, nearest);
            }
            if distance_sq.sqrt() <= self.radius + nearest.distance {
                if let Some(near) = &self.near {
                    near.visit(pin, data, nearest);
                }
            }
        }
    }
}

/// Vantage-point tree for nearest color lookups.
///
/// Read-only once built, so lookups may run from several threads.
pub(crate) struct SearchTree {
    root: Option<Box<SearchNode>>,
    data: Vec<FColor>,
}

impl SearchTree {
    /// `weights` are popularities used to pick vantage points
    pub(crate) fn new(data: Vec<FColor>, weights: &[f32]) -> Self {
        let mut indexes = (0..data.len()).map(|i| {
            SearchIdx { ind: i, distance_sq: 0.0, weight: weights.get(i).copied().unwrap_or(0.0) }
        }).collect::<Vec<SearchIdx>>();

        let root = SearchNode::new(indexes.as_mut_slice(), &data);

        Self { root, data }
    }

    /// Returns the index of the nearest color and the squared distance to it
    pub(crate) fn find_nearest(&self, pin: &FColor) -> (usize, f32) {
        if let Some(vantage_point) = &self.root {
            let mut nearest = SearchVisitor::new();
            vantage_point.visit(pin, &self.data, &mut nearest);
            (nearest.ind, nearest.distance_sq)
        } else {
            (0, f32::MAX)
        }
    }

    pub(crate) fn data(&self) -> &[FColor] {
        &self.data
    }
}
