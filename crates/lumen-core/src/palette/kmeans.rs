//! Fixed-iteration k-means over RGB samples.

use crate::types::ColorRgba;

/// Output of a k-means run.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// One centroid per cluster, in initial-seed order
    pub centroids: Vec<ColorRgba>,
    /// Members assigned to each centroid in the final iteration
    pub counts: Vec<usize>,
}

/// k-means clusterer.
///
/// Seeds are evenly spaced samples (`i * n / k`), so runs are deterministic.
/// Distance uses RGB only; alpha is averaged along but never compared. A
/// cluster that loses all members keeps its previous centroid.
#[derive(Debug, Clone, Copy)]
pub struct KMeans {
    k: usize,
    iterations: usize,
}

impl KMeans {
    pub fn new(k: usize, iterations: usize) -> Self {
        Self { k, iterations }
    }

    /// Cluster `samples` into at most `k` groups.
    pub fn fit(&self, samples: &[ColorRgba]) -> Clustering {
        let n = samples.len();
        let k = self.k.min(n);
        if k == 0 {
            return Clustering {
                centroids: Vec::new(),
                counts: Vec::new(),
            };
        }

        let mut centroids: Vec<ColorRgba> = (0..k).map(|i| samples[i * n / k]).collect();
        let mut counts = vec![0usize; k];

        for _ in 0..self.iterations {
            let mut sums = vec![[0.0f64; 4]; k];
            counts.iter_mut().for_each(|c| *c = 0);

            for sample in samples {
                let j = nearest(sample, &centroids);
                sums[j][0] += sample.r;
                sums[j][1] += sample.g;
                sums[j][2] += sample.b;
                sums[j][3] += sample.a;
                counts[j] += 1;
            }

            for (j, centroid) in centroids.iter_mut().enumerate() {
                if counts[j] > 0 {
                    let n = counts[j] as f64;
                    *centroid = ColorRgba::new(
                        sums[j][0] / n,
                        sums[j][1] / n,
                        sums[j][2] / n,
                        sums[j][3] / n,
                    );
                }
            }
        }

        Clustering { centroids, counts }
    }
}

/// Index of the closest centroid; ties go to the lowest index.
fn nearest(sample: &ColorRgba, centroids: &[ColorRgba]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (j, c) in centroids.iter().enumerate() {
        let dr = sample.r - c.r;
        let dg = sample.g - c.g;
        let db = sample.b - c.b;
        let dist = dr * dr + dg * dg + db * db;
        if dist < best_dist {
            best_dist = dist;
            best = j;
        }
    }
    best
}
