//! Level-wise split search.
//!
//! For one level of a tree, every live leaf is scored against every dense
//! field (two directional sweeps over the value-sorted column) and every
//! sparse field (one pass over the instances that have the feature). The
//! score of a split is `sl²/nl + sr²/nr`, the reduction in squared residual
//! error; a split is recorded only when it strictly beats the best seen so
//! far, which starts at the leaf's unsplit score `s²/n`.
//!
//! Defender buffers are laid out field-major (`j * nr_leaf + f`) so each
//! field's task owns one contiguous chunk and no two tasks write the same
//! slot.

use crate::core::constants::{ROOT_NODE, SPARSE_THRESHOLD};
use crate::core::types::{Hist, NodeIndex, Score};
use crate::dataset::Dataset;

use rayon::prelude::*;

/// Per-instance routing state during one tree fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    /// Heap index of the node currently owning the instance
    pub tnode_idx: NodeIndex,
    /// Residual the tree is fit against
    pub r: Score,
    /// Set once the instance reached a node that refused to split
    pub shrinked: bool,
}

impl Location {
    /// An instance at the root with residual `r`.
    pub fn new(r: Score) -> Self {
        Location {
            tnode_idx: ROOT_NODE,
            r,
            shrinked: false,
        }
    }
}

/// Running statistics of one leaf during a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Meta {
    /// Residual sum routed left so far
    pub sl: Hist,
    /// Residual sum of the whole leaf
    pub s: Hist,
    /// Count routed left so far
    pub nl: u32,
    /// Count of the whole leaf
    pub n: u32,
    /// Last value seen in this leaf; NaN before the first
    pub v: f32,
}

impl Default for Meta {
    fn default() -> Self {
        Meta {
            sl: 0.0,
            s: 0.0,
            nl: 0,
            n: 0,
            v: f32::NAN,
        }
    }
}

impl Meta {
    /// Score of leaving the leaf unsplit, `s²/n`.
    pub fn baseline(&self) -> Option<f64> {
        (self.n > 0).then(|| self.s * self.s / self.n as f64)
    }

    /// Score of splitting at the current left/right partition.
    ///
    /// `None` when either side is empty.
    pub fn split_score(&self) -> Option<f64> {
        let nr = self.n - self.nl;
        if self.nl == 0 || nr == 0 {
            return None;
        }
        let sr = self.s - self.sl;
        Some(ese(self.sl, self.nl, sr, nr))
    }
}

/// Sum-of-squares reduction of a binary partition.
pub fn ese(sl: Hist, nl: u32, sr: Hist, nr: u32) -> f64 {
    sl * sl / nl as f64 + sr * sr / nr as f64
}

/// Best split seen for one (leaf, field) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Defender {
    /// Best score so far
    pub ese: f64,
    /// Threshold achieving it
    pub threshold: f32,
}

impl Defender {
    fn with_baseline(ese: f64) -> Self {
        Defender { ese, threshold: 0.0 }
    }

    fn challenge(&mut self, ese: f64, threshold: f32) {
        if ese > self.ese {
            self.ese = ese;
            self.threshold = threshold;
        }
    }
}

/// Sweep order over a value-sorted dense column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ascending values; threshold is the larger value at a boundary
    Forward,
    /// Descending values; threshold is the value seen before the boundary
    Backward,
}

/// Slot of heap index `tnode_idx` among the leaves `[offset, offset + nr_leaf)`.
#[inline]
fn leaf_slot(tnode_idx: NodeIndex, offset: NodeIndex, nr_leaf: usize) -> Option<usize> {
    let f = tnode_idx.checked_sub(offset)? as usize;
    (f < nr_leaf).then_some(f)
}

/// Total residual sum and count of every live leaf.
pub fn leaf_totals(locations: &[Location], offset: NodeIndex, nr_leaf: usize) -> Vec<Meta> {
    let mut metas = vec![Meta::default(); nr_leaf];
    for location in locations.iter().filter(|l| !l.shrinked) {
        if let Some(f) = leaf_slot(location.tnode_idx, offset, nr_leaf) {
            let meta = &mut metas[f];
            meta.s += location.r as Hist;
            meta.n += 1;
        }
    }
    metas
}

/// Defender buffers for one level, each seeded with the leaf baselines.
#[derive(Debug, Clone)]
pub struct LevelDefenders {
    nr_leaf: usize,
    /// Dense defenders from the ascending sweep
    pub forward: Vec<Defender>,
    /// Dense defenders from the descending sweep
    pub backward: Vec<Defender>,
    /// Sparse defenders
    pub sparse: Vec<Defender>,
}

impl LevelDefenders {
    /// Seed every (leaf, field) defender with the leaf's unsplit score.
    pub fn new(metas: &[Meta], nr_field: usize, nr_sparse_field: usize) -> Self {
        let nr_leaf = metas.len();
        let baselines: Vec<Defender> = metas
            .iter()
            .map(|m| Defender::with_baseline(m.baseline().unwrap_or(f64::INFINITY)))
            .collect();
        let seeded = |nr: usize| -> Vec<Defender> {
            (0..nr).flat_map(|_| baselines.iter().copied()).collect()
        };

        LevelDefenders {
            nr_leaf,
            forward: seeded(nr_field),
            backward: seeded(nr_field),
            sparse: seeded(nr_sparse_field),
        }
    }

    /// Number of leaves covered.
    pub fn nr_leaf(&self) -> usize {
        self.nr_leaf
    }

    /// Forward defender of leaf `f`, dense field `j`.
    pub fn forward(&self, f: usize, j: usize) -> Defender {
        self.forward[j * self.nr_leaf + f]
    }

    /// Backward defender of leaf `f`, dense field `j`.
    pub fn backward(&self, f: usize, j: usize) -> Defender {
        self.backward[j * self.nr_leaf + f]
    }

    /// Defender of leaf `f`, sparse field `j`.
    pub fn sparse(&self, f: usize, j: usize) -> Defender {
        self.sparse[j * self.nr_leaf + f]
    }
}

/// Run the full split search for the leaves `[offset, offset + metas.len())`.
///
/// The forward sweep, the backward sweep and the sparse pass run as three
/// concurrent tasks; each of them fans out one task per field.
pub fn search_level(
    dataset: &Dataset,
    locations: &[Location],
    metas: &[Meta],
    offset: NodeIndex,
) -> LevelDefenders {
    let mut defenders = LevelDefenders::new(metas, dataset.nr_field(), dataset.nr_sparse_field());
    {
        let LevelDefenders {
            forward,
            backward,
            sparse,
            ..
        } = &mut defenders;

        rayon::join(
            || {
                rayon::join(
                    || scan(dataset, locations, metas, forward, offset, Direction::Forward),
                    || scan(dataset, locations, metas, backward, offset, Direction::Backward),
                )
            },
            || scan_sparse(dataset, locations, metas, sparse, offset),
        );
    }
    defenders
}

/// Scan every dense field in one direction.
///
/// `defenders` is field-major with `metas.len()` slots per field.
pub fn scan(
    dataset: &Dataset,
    locations: &[Location],
    metas: &[Meta],
    defenders: &mut [Defender],
    offset: NodeIndex,
    direction: Direction,
) {
    let nr_leaf = metas.len();
    if nr_leaf == 0 {
        return;
    }
    debug_assert_eq!(defenders.len(), nr_leaf * dataset.nr_field());

    defenders
        .par_chunks_mut(nr_leaf)
        .enumerate()
        .for_each(|(j, field_defenders)| {
            scan_field(dataset, j, locations, metas, field_defenders, offset, direction)
        });
}

fn scan_field(
    dataset: &Dataset,
    j: usize,
    locations: &[Location],
    metas0: &[Meta],
    defenders: &mut [Defender],
    offset: NodeIndex,
    direction: Direction,
) {
    let column = dataset.sorted_field(j);
    let nr_instance = column.len();
    let nr_leaf = metas0.len();
    let mut metas = metas0.to_vec();

    for i_bar in 0..nr_instance {
        let entry = match direction {
            Direction::Forward => column[i_bar],
            Direction::Backward => column[nr_instance - i_bar - 1],
        };

        let location = &locations[entry.instance as usize];
        if location.shrinked {
            continue;
        }
        let Some(f) = leaf_slot(location.tnode_idx, offset, nr_leaf) else {
            continue;
        };
        let meta = &mut metas[f];

        if entry.value != meta.v {
            if let Some(score) = meta.split_score() {
                let threshold = match direction {
                    Direction::Forward => entry.value,
                    Direction::Backward => meta.v,
                };
                defenders[f].challenge(score, threshold);
            }
            // Past the midpoint the other direction has seen the rest.
            if i_bar > nr_instance / 2 {
                break;
            }
        }

        meta.sl += location.r as Hist;
        meta.nl += 1;
        meta.v = entry.value;
    }
}

/// Score the presence/absence split of every sparse field.
///
/// `defenders` is field-major with `metas.len()` slots per field.
pub fn scan_sparse(
    dataset: &Dataset,
    locations: &[Location],
    metas: &[Meta],
    defenders: &mut [Defender],
    offset: NodeIndex,
) {
    let nr_leaf = metas.len();
    if nr_leaf == 0 {
        return;
    }
    debug_assert_eq!(defenders.len(), nr_leaf * dataset.nr_sparse_field());

    defenders
        .par_chunks_mut(nr_leaf)
        .enumerate()
        .for_each(|(j, field_defenders)| {
            let mut metas = metas.to_vec();
            for &i in dataset.sparse_column(j) {
                let location = &locations[i as usize];
                if location.shrinked {
                    continue;
                }
                if let Some(f) = leaf_slot(location.tnode_idx, offset, nr_leaf) {
                    let meta = &mut metas[f];
                    meta.sl += location.r as Hist;
                    meta.nl += 1;
                }
            }

            for (meta, defender) in metas.iter().zip(field_defenders.iter_mut()) {
                if let Some(score) = meta.split_score() {
                    defender.challenge(score, SPARSE_THRESHOLD);
                }
            }
        });
}
