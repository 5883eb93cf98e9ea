// k-means clustering with k-means++ seeding
//
// Lloyd iterations run from `n_init` seeded starts and the lowest-inertia
// run is kept. One StdRng drives every start, so the same data, k and seed
// always produce the same centroids and assignments.
//
// Convergence: stop when the summed squared centroid shift falls to
// `tolerance * mean column variance` or after `max_iter` iterations.
// A cluster that loses all members is moved onto the point currently
// farthest from its own centroid.

use rand::{rngs::StdRng, Rng, SeedableRng};

use super::matrix::FeatureMatrix;

/// Run parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeansParams {
    pub k: usize,
    pub n_init: usize,
    pub max_iter: usize,
    pub tolerance: f64,
    pub seed: u64,
}

/// Outcome of the best run
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    pub centroids: Vec<Vec<f64>>,
    pub assignments: Vec<usize>,
    /// Sum of squared distances of rows to their centroid
    pub inertia: f64,
    /// Lloyd iterations used by the kept run
    pub iterations: usize,
}

/// Squared Euclidean distance
pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Index of and squared distance to the closest centroid (lowest index wins ties)
pub fn nearest_centroid(centroids: &[Vec<f64>], point: &[f64]) -> (usize, f64) {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (j, centroid) in centroids.iter().enumerate() {
        let dist = squared_distance(point, centroid);
        if dist < best_dist {
            best_dist = dist;
            best = j;
        }
    }
    (best, best_dist)
}

/// Cluster the rows of `data`
///
/// The caller guarantees `1 <= params.k <= data.n_rows()`.
pub fn fit(data: &FeatureMatrix, params: &KMeansParams) -> KMeansResult {
    let mut rng = StdRng::seed_from_u64(params.seed);
    let (_, column_std) = data.column_stats();
    let mean_variance =
        column_std.iter().map(|s| s * s).sum::<f64>() / column_std.len().max(1) as f64;
    let shift_tolerance = params.tolerance * mean_variance;

    let mut best: Option<KMeansResult> = None;
    for run in 0..params.n_init.max(1) {
        let initial = init_plus_plus(data, params.k, &mut rng);
        let result = lloyd(data, initial, params.max_iter, shift_tolerance);
        tracing::debug!(run, inertia = result.inertia, iterations = result.iterations, "k-means run");

        let better = match &best {
            Some(current) => result.inertia < current.inertia,
            None => true,
        };
        if better {
            best = Some(result);
        }
    }

    best.unwrap_or_else(|| KMeansResult {
        centroids: Vec::new(),
        assignments: Vec::new(),
        inertia: 0.0,
        iterations: 0,
    })
}

/// k-means++ seeding: each new centre is drawn with probability proportional
/// to its squared distance from the closest existing centre
fn init_plus_plus(data: &FeatureMatrix, k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = data.n_rows();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(data.row(rng.gen_range(0..n)).to_vec());

    let mut closest: Vec<f64> = data
        .rows()
        .map(|row| squared_distance(row, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = closest.iter().sum();
        let chosen = if total > 0.0 {
            let target = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;
            let mut pick = n - 1;
            for (i, d) in closest.iter().enumerate() {
                cumulative += d;
                if cumulative > target {
                    pick = i;
                    break;
                }
            }
            pick
        } else {
            rng.gen_range(0..n)
        };

        let centre = data.row(chosen).to_vec();
        for (d, row) in closest.iter_mut().zip(data.rows()) {
            *d = d.min(squared_distance(row, &centre));
        }
        centroids.push(centre);
    }

    centroids
}

fn lloyd(
    data: &FeatureMatrix,
    mut centroids: Vec<Vec<f64>>,
    max_iter: usize,
    shift_tolerance: f64,
) -> KMeansResult {
    let k = centroids.len();
    let dim = data.n_cols();
    let mut assignments = vec![0usize; data.n_rows()];
    let mut distances = vec![0.0; data.n_rows()];
    let mut iterations = 0;

    for _ in 0..max_iter.max(1) {
        iterations += 1;
        assign(data, &centroids, &mut assignments, &mut distances);

        let mut sums = vec![vec![0.0; dim]; k];
        let mut counts = vec![0usize; k];
        for (row, &c) in data.rows().zip(&assignments) {
            counts[c] += 1;
            for (s, v) in sums[c].iter_mut().zip(row) {
                *s += v;
            }
        }

        for j in 0..k {
            if counts[j] == 0 {
                let far = farthest_point(&distances);
                sums[j] = data.row(far).to_vec();
                counts[j] = 1;
                distances[far] = 0.0;
                tracing::debug!(cluster = j, row = far, "relocated empty cluster");
            } else {
                let count = counts[j] as f64;
                sums[j].iter_mut().for_each(|s| *s /= count);
            }
        }

        let shift: f64 = centroids
            .iter()
            .zip(&sums)
            .map(|(old, new)| squared_distance(old, new))
            .sum();
        centroids = sums;

        if shift <= shift_tolerance {
            break;
        }
    }

    assign(data, &centroids, &mut assignments, &mut distances);
    let inertia = distances.iter().sum();

    KMeansResult {
        centroids,
        assignments,
        inertia,
        iterations,
    }
}

fn assign(
    data: &FeatureMatrix,
    centroids: &[Vec<f64>],
    assignments: &mut [usize],
    distances: &mut [f64],
) {
    for (i, row) in data.rows().enumerate() {
        let (cluster, dist) = nearest_centroid(centroids, row);
        assignments[i] = cluster;
        distances[i] = dist;
    }
}

fn farthest_point(distances: &[f64]) -> usize {
    let mut far = 0;
    for (i, &d) in distances.iter().enumerate() {
        if d > distances[far] {
            far = i;
        }
    }
    far
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(k: usize) -> KMeansParams {
        KMeansParams {
            k,
            n_init: 5,
            max_iter: 100,
            tolerance: 1e-4,
            seed: 42,
        }
    }

    fn two_blobs() -> FeatureMatrix {
        let mut rows = Vec::new();
        for i in 0..10 {
            let jitter = i as f64 * 0.01;
            rows.push(vec![0.0 + jitter, 0.0 - jitter]);
            rows.push(vec![10.0 - jitter, 10.0 + jitter]);
        }
        FeatureMatrix::from_rows(&rows).unwrap()
    }

    #[test]
    fn test_separates_two_blobs() {
        let data = two_blobs();
        let result = fit(&data, &params(2));

        // rows alternate between blobs
        let first = result.assignments[0];
        let second = result.assignments[1];
        assert_ne!(first, second);
        for (i, &a) in result.assignments.iter().enumerate() {
            assert_eq!(a, if i % 2 == 0 { first } else { second });
        }
        assert!(result.inertia < 1.0);
    }

    #[test]
    fn test_same_seed_same_result() {
        let data = two_blobs();
        assert_eq!(fit(&data, &params(3)), fit(&data, &params(3)));
    }

    #[test]
    fn test_k_equals_rows() {
        let data = FeatureMatrix::from_rows(&[vec![0.0], vec![5.0], vec![9.0]]).unwrap();
        let result = fit(&data, &params(3));

        let mut seen = result.assignments.clone();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(result.inertia, 0.0);
    }

    #[test]
    fn test_duplicate_rows_do_not_panic() {
        let data = FeatureMatrix::from_rows(&vec![vec![1.0, 1.0]; 6]).unwrap();
        let result = fit(&data, &params(2));
        assert_eq!(result.assignments.len(), 6);
        assert_eq!(result.centroids.len(), 2);
        assert_eq!(result.inertia, 0.0);
    }

    #[test]
    fn test_nearest_centroid_prefers_lowest_index_on_tie() {
        let centroids = vec![vec![-1.0], vec![1.0]];
        assert_eq!(nearest_centroid(&centroids, &[0.0]).0, 0);
        assert_eq!(nearest_centroid(&centroids, &[0.9]).0, 1);
    }
}
