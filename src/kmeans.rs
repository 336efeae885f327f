//! Lloyd's k-means over 8-bit RGB samples.
//!
//! Samples are folded into a histogram of distinct colors first; every step is
//! weighted by how many samples share a color, which yields the same
//! partition as clustering the raw samples one by one while making the result
//! independent of sample order.
//!
//! Seeding is k-means++ driven by a [`ChaCha8Rng`] seeded from
//! [`KMeansConfig::seed`], so identical input always produces identical
//! centroids.

use std::collections::BTreeMap;

use palette::Srgb;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use crate::error::{PaletteError, Result};

pub const DEFAULT_MAX_ITERATIONS: usize = 300;
pub const DEFAULT_SEED: u64 = 0;

/// Knobs for a clustering run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KMeansConfig {
    /// Upper bound on assignment passes. Reaching it is not an error.
    pub max_iterations: usize,
    /// Seed for centroid initialization.
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            seed: DEFAULT_SEED,
        }
    }
}

impl KMeansConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Result of a clustering run.
///
/// All vectors are indexed by cluster, in the order the centroids were
/// initialized.
#[derive(Clone, Debug, PartialEq)]
pub struct Clustering {
    /// Unrounded centroid coordinates in 0-255 RGB space.
    pub centroids: Vec<[f64; 3]>,
    /// Number of samples nearest to each final centroid.
    pub populations: Vec<u64>,
    /// Sum of squared distances from every sample to its nearest centroid.
    pub inertia: f64,
    /// Assignment passes performed.
    pub iterations: usize,
    /// `false` when the iteration cap stopped the run.
    pub converged: bool,
}

impl Clustering {
    /// Centroids rounded to the nearest 8-bit color.
    pub fn rounded_centroids(&self) -> Vec<Srgb<u8>> {
        self.centroids
            .iter()
            .map(|c| Srgb::new(round_channel(c[0]), round_channel(c[1]), round_channel(c[2])))
            .collect()
    }
}

#[inline]
fn round_channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// A distinct color and the number of samples carrying it.
#[derive(Clone, Copy, Debug)]
struct Bin {
    color: [f64; 3],
    count: u64,
}

fn histogram(samples: &[Srgb<u8>]) -> Vec<Bin> {
    let mut counts: BTreeMap<(u8, u8, u8), u64> = BTreeMap::new();
    for s in samples {
        *counts.entry((s.red, s.green, s.blue)).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|((r, g, b), count)| Bin {
            color: [r as f64, g as f64, b as f64],
            count,
        })
        .collect()
}

#[inline(always)]
fn distance_squared(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr * dr + dg * dg + db * db
}

/// Index of and squared distance to the closest centroid. Ties go to the lower
/// index.
fn nearest(color: &[f64; 3], centroids: &[[f64; 3]]) -> (usize, f64) {
    let mut best_idx = 0;
    let mut best_dist = f64::INFINITY;
    for (idx, c) in centroids.iter().enumerate() {
        let dist = distance_squared(color, c);
        if dist < best_dist {
            best_dist = dist;
            best_idx = idx;
        }
    }
    (best_idx, best_dist)
}

/// Partition `samples` into `k` clusters.
///
/// Fails with [`PaletteError::EmptyInput`] when `samples` is empty and with
/// [`PaletteError::InvalidArgument`] when `k` is zero, when `k` exceeds the
/// number of samples, or when the config allows no iterations. Fewer distinct
/// colors than `k` is fine: the surplus centroids end up duplicating existing
/// ones.
pub fn run_kmeans(samples: &[Srgb<u8>], k: usize, config: &KMeansConfig) -> Result<Clustering> {
    if samples.is_empty() {
        return Err(PaletteError::EmptyInput);
    }
    if k == 0 {
        return Err(PaletteError::invalid_argument("k must be at least 1"));
    }
    if k > samples.len() {
        return Err(PaletteError::invalid_argument(format!(
            "k = {k} exceeds the number of samples ({})",
            samples.len()
        )));
    }
    if config.max_iterations == 0 {
        return Err(PaletteError::invalid_argument("max_iterations must be at least 1"));
    }

    let bins = histogram(samples);
    debug!(
        k,
        samples = samples.len(),
        distinct = bins.len(),
        seed = config.seed,
        "Running k-means"
    );

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut centroids = init_plus_plus(&bins, k, &mut rng);

    let mut assignments = vec![usize::MAX; bins.len()];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iterations {
        iterations += 1;
        let changed = assign(&bins, &centroids, &mut assignments);
        trace!(iteration = iterations, changed, "Assignment pass");
        if changed == 0 {
            converged = true;
            break;
        }
        update(&bins, &assignments, &mut centroids);
    }

    let mut populations = vec![0u64; k];
    let mut inertia = 0.0;
    for bin in &bins {
        let (idx, dist) = nearest(&bin.color, &centroids);
        populations[idx] += bin.count;
        inertia += dist * bin.count as f64;
    }

    debug!(iterations, converged, inertia, "k-means finished");

    Ok(Clustering {
        centroids,
        populations,
        inertia,
        iterations,
        converged,
    })
}

/// k-means++ seeding: the first centroid is drawn proportionally to sample
/// count, each following one proportionally to count × squared distance from
/// the closest centroid chosen so far.
fn init_plus_plus(bins: &[Bin], k: usize, rng: &mut impl Rng) -> Vec<[f64; 3]> {
    let mut centroids = Vec::with_capacity(k);

    let weights: Vec<f64> = bins.iter().map(|b| b.count as f64).collect();
    let first = bins[pick_weighted(rng, &weights).unwrap_or(0)].color;
    centroids.push(first);

    let mut closest: Vec<f64> = bins.iter().map(|b| distance_squared(&b.color, &first)).collect();

    while centroids.len() < k {
        let weights: Vec<f64> = bins
            .iter()
            .zip(&closest)
            .map(|(b, d)| b.count as f64 * d)
            .collect();
        // Every distinct color already has a centroid: duplicate the first bin.
        let chosen = bins[pick_weighted(rng, &weights).unwrap_or(0)].color;
        centroids.push(chosen);

        for (d, bin) in closest.iter_mut().zip(bins) {
            *d = d.min(distance_squared(&bin.color, &chosen));
        }
    }

    centroids
}

/// Draw an index with probability proportional to its weight. `None` when all
/// weights are zero.
fn pick_weighted(rng: &mut impl Rng, weights: &[f64]) -> Option<usize> {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return None;
    }

    let mut target = rng.random::<f64>() * total;
    let mut last = None;
    for (idx, &w) in weights.iter().enumerate() {
        if w <= 0.0 {
            continue;
        }
        if target < w {
            return Some(idx);
        }
        target -= w;
        last = Some(idx);
    }
    // Accumulated rounding can leave `target` just past the final weight.
    last
}

/// Assign every bin to its nearest centroid. Returns how many bins moved.
fn assign(bins: &[Bin], centroids: &[[f64; 3]], assignments: &mut [usize]) -> usize {
    let mut changed = 0;
    for (bin, slot) in bins.iter().zip(assignments.iter_mut()) {
        let (idx, _) = nearest(&bin.color, centroids);
        if *slot != idx {
            *slot = idx;
            changed += 1;
        }
    }
    changed
}

/// Move each centroid to the weighted mean of its bins. Empty clusters are
/// re-seeded, in index order, onto the bin farthest from every placed
/// centroid.
fn update(bins: &[Bin], assignments: &[usize], centroids: &mut [[f64; 3]]) {
    let k = centroids.len();
    let mut sums = vec![[0.0f64; 3]; k];
    let mut counts = vec![0u64; k];

    for (bin, &cluster) in bins.iter().zip(assignments) {
        let w = bin.count as f64;
        counts[cluster] += bin.count;
        for ch in 0..3 {
            sums[cluster][ch] += bin.color[ch] * w;
        }
    }

    let mut placed: Vec<bool> = counts.iter().map(|&n| n > 0).collect();
    for cluster in 0..k {
        if counts[cluster] > 0 {
            let n = counts[cluster] as f64;
            centroids[cluster] = [sums[cluster][0] / n, sums[cluster][1] / n, sums[cluster][2] / n];
        }
    }

    for cluster in 0..k {
        if placed[cluster] {
            continue;
        }
        if let Some(idx) = farthest_bin(bins, centroids, &placed) {
            debug!(cluster, color = ?bins[idx].color, "Re-seeding empty cluster");
            centroids[cluster] = bins[idx].color;
        }
        placed[cluster] = true;
    }
}

/// Bin with the largest distance to its closest placed centroid, or `None` if
/// every bin sits exactly on one.
fn farthest_bin(bins: &[Bin], centroids: &[[f64; 3]], placed: &[bool]) -> Option<usize> {
    let mut best = None;
    let mut best_dist = 0.0;
    for (idx, bin) in bins.iter().enumerate() {
        let dist = centroids
            .iter()
            .zip(placed)
            .filter(|(_, p)| **p)
            .map(|(c, _)| distance_squared(&bin.color, c))
            .fold(f64::INFINITY, f64::min);
        if dist > best_dist {
            best_dist = dist;
            best = Some(idx);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repeat(color: Srgb<u8>, n: usize) -> Vec<Srgb<u8>> {
        vec![color; n]
    }

    fn black_and_white() -> Vec<Srgb<u8>> {
        let mut samples = repeat(Srgb::new(0, 0, 0), 100);
        samples.extend(repeat(Srgb::new(255, 255, 255), 100));
        samples
    }

    #[test]
    fn test_rejects_invalid_input() {
        let config = KMeansConfig::default();
        assert!(matches!(run_kmeans(&[], 1, &config), Err(PaletteError::EmptyInput)));

        let samples = repeat(Srgb::new(1, 2, 3), 4);
        assert!(matches!(
            run_kmeans(&samples, 0, &config),
            Err(PaletteError::InvalidArgument { .. })
        ));
        assert!(matches!(
            run_kmeans(&samples, 5, &config),
            Err(PaletteError::InvalidArgument { .. })
        ));
        assert!(matches!(
            run_kmeans(&samples, 2, &config.with_max_iterations(0)),
            Err(PaletteError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_black_and_white_split() {
        let result = run_kmeans(&black_and_white(), 2, &KMeansConfig::default()).unwrap();
        assert!(result.converged);
        assert_eq!(result.inertia, 0.0);
        assert_eq!(result.populations, vec![100, 100]);

        let mut rounded: Vec<_> = result.rounded_centroids().into_iter().map(|c| c.into_components()).collect();
        rounded.sort();
        assert_eq!(rounded, vec![(0, 0, 0), (255, 255, 255)]);
    }

    #[test]
    fn test_deterministic_for_same_seed() {
        let samples: Vec<Srgb<u8>> = (0..600u32)
            .map(|i| Srgb::new((i * 37 % 256) as u8, (i * 91 % 256) as u8, (i * 13 % 256) as u8))
            .collect();
        let config = KMeansConfig::default().with_seed(7);
        let a = run_kmeans(&samples, 6, &config).unwrap();
        let b = run_kmeans(&samples, 6, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sample_order_does_not_matter() {
        let mut samples: Vec<Srgb<u8>> = (0..300u32)
            .map(|i| Srgb::new((i % 256) as u8, (i * 7 % 256) as u8, 40))
            .collect();
        let config = KMeansConfig::default();
        let forward = run_kmeans(&samples, 4, &config).unwrap();
        samples.reverse();
        let backward = run_kmeans(&samples, 4, &config).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_single_color() {
        let samples = repeat(Srgb::new(10, 20, 30), 50);
        let one = run_kmeans(&samples, 1, &KMeansConfig::default()).unwrap();
        assert_eq!(one.rounded_centroids(), vec![Srgb::new(10, 20, 30)]);

        let three = run_kmeans(&samples, 3, &KMeansConfig::default()).unwrap();
        assert_eq!(three.centroids.len(), 3);
        assert!(three.rounded_centroids().iter().all(|&c| c == Srgb::new(10, 20, 30)));
        assert_eq!(three.populations.iter().sum::<u64>(), 50);
    }

    #[test]
    fn test_k_equal_to_sample_count() {
        let samples = vec![
            Srgb::new(0, 0, 0),
            Srgb::new(40, 0, 0),
            Srgb::new(0, 90, 0),
            Srgb::new(0, 0, 200),
            Srgb::new(250, 250, 250),
        ];
        let result = run_kmeans(&samples, samples.len(), &KMeansConfig::default()).unwrap();
        assert_eq!(result.inertia, 0.0);
        assert!(result.populations.iter().all(|&n| n == 1));

        let mut got: Vec<_> = result.rounded_centroids().into_iter().map(|c| c.into_components()).collect();
        let mut want: Vec<_> = samples.iter().map(|c| c.into_components()).collect();
        got.sort();
        want.sort();
        assert_eq!(got, want);
    }

    #[test]
    fn test_iteration_cap_is_not_an_error() {
        let samples: Vec<Srgb<u8>> = (0..=255u8).map(|v| Srgb::new(v, v / 2, 255 - v)).collect();
        let result = run_kmeans(&samples, 5, &KMeansConfig::default().with_max_iterations(1)).unwrap();
        assert_eq!(result.iterations, 1);
        assert!(!result.converged);
        assert_eq!(result.centroids.len(), 5);
    }

    #[test]
    fn test_centroids_stay_in_range() {
        let samples: Vec<Srgb<u8>> = (0..1000u32)
            .map(|i| Srgb::new((i * 53 % 256) as u8, (i * 29 % 256) as u8, (i * 71 % 256) as u8))
            .collect();
        let result = run_kmeans(&samples, 8, &KMeansConfig::default()).unwrap();
        for c in &result.centroids {
            assert!(c.iter().all(|&v| (0.0..=255.0).contains(&v)));
        }
    }

    #[test]
    fn test_nearest_prefers_lower_index_on_tie() {
        let centroids = [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0]];
        assert_eq!(nearest(&[1.0, 0.0, 0.0], &centroids), (0, 1.0));
    }

    #[test]
    fn test_update_reseeds_empty_cluster() {
        let bins = [
            Bin { color: [0.0, 0.0, 0.0], count: 1 },
            Bin { color: [10.0, 0.0, 0.0], count: 1 },
            Bin { color: [200.0, 0.0, 0.0], count: 1 },
        ];
        let mut centroids = [[0.0, 0.0, 0.0], [250.0, 250.0, 250.0]];
        update(&bins, &[0, 0, 0], &mut centroids);
        assert_eq!(centroids[0], [70.0, 0.0, 0.0]);
        assert_eq!(centroids[1], [200.0, 0.0, 0.0]);
    }

    #[test]
    fn test_update_weights_by_count() {
        let bins = [
            Bin { color: [0.0, 0.0, 0.0], count: 3 },
            Bin { color: [100.0, 0.0, 0.0], count: 1 },
        ];
        let mut centroids = [[50.0, 0.0, 0.0]];
        update(&bins, &[0, 0], &mut centroids);
        assert_eq!(centroids[0], [25.0, 0.0, 0.0]);
    }

    #[test]
    fn test_pick_weighted_skips_zero_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..100 {
            assert_eq!(pick_weighted(&mut rng, &[0.0, 0.0, 5.0, 0.0]), Some(2));
        }
        assert_eq!(pick_weighted(&mut rng, &[0.0, 0.0]), None);
    }
}
