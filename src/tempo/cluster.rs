// Tempo clusterer - BPM estimation from onset timestamps
// 1-D k-means over inter-onset intervals; the most populated cluster wins

use crate::config::ClustererConfig;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the number of clusters is chosen
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KSelection {
    /// k with the strictly lowest inertia; ties keep the smaller k.
    /// Inertia rarely grows with k, so this tends to pick the largest k.
    #[default]
    LowestInertia,
    /// Grow k while each step still removes more than `min_gain` of the
    /// k=1 inertia
    Elbow { min_gain: f64 },
}

/// Result of one k-means run
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    pub centroids: Vec<f64>,
    /// Cluster index of every input value
    pub assignments: Vec<usize>,
    /// Sum of squared distances to the assigned centroid
    pub inertia: f64,
}

impl Clustering {
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centroids.len()];
        for &cluster in &self.assignments {
            sizes[cluster] += 1;
        }
        sizes
    }

    /// Index of the cluster with the most points (first one on ties)
    pub fn dominant(&self) -> Option<usize> {
        let sizes = self.cluster_sizes();
        let mut best: Option<(usize, usize)> = None;
        for (index, &size) in sizes.iter().enumerate() {
            if best.is_none_or(|(_, best_size)| size > best_size) {
                best = Some((index, size));
            }
        }
        best.map(|(index, _)| index)
    }
}

/// k-means on scalar values
///
/// Centroids start on `k` distinct positions of the shuffled data and are
/// refined for exactly `iterations` rounds. A cluster that loses all its
/// points keeps its previous centroid.
pub fn kmeans_1d<R: Rng + ?Sized>(
    values: &[f64],
    k: usize,
    iterations: usize,
    rng: &mut R,
) -> Clustering {
    let k = k.clamp(1, values.len().max(1));
    let mut shuffled = values.to_vec();
    shuffled.shuffle(rng);
    let mut centroids: Vec<f64> = shuffled.into_iter().take(k).collect();
    if centroids.is_empty() {
        return Clustering {
            centroids,
            assignments: Vec::new(),
            inertia: 0.0,
        };
    }

    let mut assignments = assign(values, &centroids);
    for _ in 0..iterations {
        let mut sums = vec![0.0; k];
        let mut counts = vec![0usize; k];
        for (&value, &cluster) in values.iter().zip(&assignments) {
            sums[cluster] += value;
            counts[cluster] += 1;
        }
        for cluster in 0..k {
            if counts[cluster] > 0 {
                centroids[cluster] = sums[cluster] / counts[cluster] as f64;
            }
        }
        assignments = assign(values, &centroids);
    }

    let inertia = values
        .iter()
        .zip(&assignments)
        .map(|(&value, &cluster)| (value - centroids[cluster]).powi(2))
        .sum();

    Clustering {
        centroids,
        assignments,
        inertia,
    }
}

fn assign(values: &[f64], centroids: &[f64]) -> Vec<usize> {
    values
        .iter()
        .map(|&value| {
            let mut best = 0;
            let mut best_distance = f64::INFINITY;
            for (index, &centroid) in centroids.iter().enumerate() {
                let distance = (value - centroid).abs();
                if distance < best_distance {
                    best = index;
                    best_distance = distance;
                }
            }
            best
        })
        .collect()
}

/// Inter-onset intervals inside the configured window
pub fn filtered_intervals(onsets: &[f64], config: &ClustererConfig) -> Vec<f64> {
    onsets
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .filter(|interval| (config.min_interval..=config.max_interval).contains(interval))
        .collect()
}

fn select(runs: &[Clustering], selection: KSelection) -> usize {
    match selection {
        KSelection::LowestInertia => {
            let mut best = 0;
            for (index, run) in runs.iter().enumerate().skip(1) {
                if run.inertia < runs[best].inertia {
                    best = index;
                }
            }
            best
        }
        KSelection::Elbow { min_gain } => {
            let base = runs[0].inertia;
            if base <= f64::EPSILON {
                return 0;
            }
            let mut best = 0;
            for index in 1..runs.len() {
                let gain = (runs[index - 1].inertia - runs[index].inertia) / base;
                if gain <= min_gain {
                    break;
                }
                best = index;
            }
            best
        }
    }
}

/// Estimate BPM from onset timestamps (seconds)
///
/// Returns 0.0 when there are fewer than two onsets or fewer than two
/// intervals survive filtering; callers treat 0 as "unknown".
pub fn estimate_bpm<R: Rng + ?Sized>(
    onsets: &[f64],
    config: &ClustererConfig,
    rng: &mut R,
) -> f32 {
    if onsets.len() < 2 {
        return 0.0;
    }

    let intervals = filtered_intervals(onsets, config);
    if intervals.len() < 2 {
        return 0.0;
    }

    let max_k = config.max_k.min(intervals.len()).max(1);
    let runs: Vec<Clustering> = (1..=max_k)
        .map(|k| kmeans_1d(&intervals, k, config.iterations, &mut *rng))
        .collect();

    let chosen = &runs[select(&runs, config.selection)];
    let Some(dominant) = chosen.dominant() else {
        return 0.0;
    };
    let centroid = chosen.centroids[dominant];

    debug!(
        intervals = intervals.len(),
        k = chosen.k(),
        inertia = chosen.inertia,
        centroid,
        "Tempo clusters selected"
    );

    if centroid <= 0.0 {
        return 0.0;
    }
    (60.0 / centroid) as f32
}

struct Inner {
    onsets: Vec<f64>,
    rng: StdRng,
}

/// Onset buffer plus estimator
///
/// Shareable between the onset producer and the reader; a single mutex is
/// plenty at musical event rates.
pub struct TempoClusterer {
    config: ClustererConfig,
    inner: Mutex<Inner>,
}

impl TempoClusterer {
    pub fn new(config: ClustererConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic clusterer for tests and reproducible analysis
    pub fn with_seed(config: ClustererConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: ClustererConfig, rng: StdRng) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                onsets: Vec::new(),
                rng,
            }),
        }
    }

    pub fn config(&self) -> &ClustererConfig {
        &self.config
    }

    /// Append an onset (seconds). Non-finite timestamps are ignored.
    pub fn record_onset(&self, timestamp: f64) {
        if timestamp.is_finite() {
            self.inner.lock().onsets.push(timestamp);
        }
    }

    pub fn onsets(&self) -> Vec<f64> {
        self.inner.lock().onsets.clone()
    }

    pub fn onset_count(&self) -> usize {
        self.inner.lock().onsets.len()
    }

    /// Estimate from the recorded onsets
    pub fn estimate(&self) -> f32 {
        let mut inner = self.inner.lock();
        let Inner { onsets, rng } = &mut *inner;
        estimate_bpm(onsets.as_slice(), &self.config, rng)
    }

    /// Estimate from an explicit onset list, using this clusterer's RNG
    pub fn estimate_bpm(&self, onsets: &[f64]) -> f32 {
        let mut inner = self.inner.lock();
        estimate_bpm(onsets, &self.config, &mut inner.rng)
    }

    pub fn reset(&self) {
        self.inner.lock().onsets.clear();
    }
}

impl Default for TempoClusterer {
    fn default() -> Self {
        Self::new(ClustererConfig::default())
    }
}
