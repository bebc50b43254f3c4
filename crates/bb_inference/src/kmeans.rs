use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct KMeansConfig {
    pub clusters: usize,
    pub seed: u64,
    pub n_init: usize,
    pub max_iter: usize,
    pub tolerance: f64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            clusters: 5,
            seed: 42,
            n_init: 10,
            max_iter: 300,
            tolerance: 1e-4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct KMeansResult {
    pub centroids: Vec<Vec<f64>>,
    /// Cluster index per input row.
    pub labels: Vec<usize>,
    pub inertia: f64,
}

/// Lloyd's k-means with k-means++ seeding. The best of `n_init` runs (by
/// inertia) is kept; a fixed seed makes the result reproducible.
#[derive(Debug, Clone)]
pub struct KMeans {
    config: KMeansConfig,
}

impl KMeans {
    pub fn new(config: KMeansConfig) -> Self {
        Self { config }
    }

    pub fn fit(&self, data: &[Vec<f64>]) -> KMeansResult {
        let k = self.config.clusters.min(distinct_rows(data));
        if k == 0 {
            return KMeansResult {
                centroids: Vec::new(),
                labels: Vec::new(),
                inertia: 0.0,
            };
        }

        let threshold = self.config.tolerance * mean_variance(data);
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut best: Option<KMeansResult> = None;

        for run in 0..self.config.n_init.max(1) {
            let result = self.run_once(data, k, threshold, &mut rng);
            tracing::trace!("k-means run {} inertia {:.6}", run, result.inertia);
            if best.as_ref().map_or(true, |b| result.inertia < b.inertia) {
                best = Some(result);
            }
        }

        best.unwrap_or(KMeansResult {
            centroids: Vec::new(),
            labels: Vec::new(),
            inertia: 0.0,
        })
    }

    fn run_once(&self, data: &[Vec<f64>], k: usize, threshold: f64, rng: &mut StdRng) -> KMeansResult {
        let mut centroids = init_plus_plus(data, k, rng);
        let mut labels = vec![0; data.len()];

        for _ in 0..self.config.max_iter {
            for (i, row) in data.iter().enumerate() {
                labels[i] = nearest(row, &centroids).0;
            }

            let updated = recompute_centroids(data, &labels, &centroids);
            let shift: f64 = centroids
                .iter()
                .zip(&updated)
                .map(|(a, b)| squared_distance(a, b))
                .sum();
            centroids = updated;
            if shift <= threshold {
                break;
            }
        }

        let mut inertia = 0.0;
        for (i, row) in data.iter().enumerate() {
            let (label, dist) = nearest(row, &centroids);
            labels[i] = label;
            inertia += dist;
        }

        KMeansResult {
            centroids,
            labels,
            inertia,
        }
    }
}

fn init_plus_plus(data: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let mut centroids = vec![data[rng.gen_range(0..data.len())].clone()];
    let mut closest: Vec<f64> = data.iter().map(|row| squared_distance(row, &centroids[0])).collect();

    while centroids.len() < k {
        let total: f64 = closest.iter().sum();
        let next = if total <= 0.0 {
            rng.gen_range(0..data.len())
        } else {
            let mut target = rng.gen::<f64>() * total;
            let mut chosen = data.len() - 1;
            for (i, d) in closest.iter().enumerate() {
                if target < *d {
                    chosen = i;
                    break;
                }
                target -= d;
            }
            chosen
        };

        let centroid = data[next].clone();
        for (i, row) in data.iter().enumerate() {
            closest[i] = closest[i].min(squared_distance(row, &centroid));
        }
        centroids.push(centroid);
    }
    centroids
}

fn recompute_centroids(data: &[Vec<f64>], labels: &[usize], previous: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let dims = data[0].len();
    let mut sums = vec![vec![0.0; dims]; previous.len()];
    let mut sizes = vec![0usize; previous.len()];

    for (row, &label) in data.iter().zip(labels) {
        sizes[label] += 1;
        for (s, v) in sums[label].iter_mut().zip(row) {
            *s += v;
        }
    }

    for (c, sum) in sums.iter_mut().enumerate() {
        if sizes[c] == 0 {
            // Empty cluster: move it onto the row farthest from its centre.
            let far = data
                .iter()
                .enumerate()
                .map(|(i, row)| (i, squared_distance(row, &previous[labels[i]])))
                .fold((0, f64::MIN), |acc, cur| if cur.1 > acc.1 { cur } else { acc });
            *sum = data[far.0].clone();
        } else {
            let n = sizes[c] as f64;
            sum.iter_mut().for_each(|v| *v /= n);
        }
    }
    sums
}

fn nearest(row: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (i, c) in centroids.iter().enumerate() {
        let d = squared_distance(row, c);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn distinct_rows(data: &[Vec<f64>]) -> usize {
    let mut distinct: Vec<&Vec<f64>> = Vec::new();
    for row in data {
        if !distinct.iter().any(|d| squared_distance(d, row) == 0.0) {
            distinct.push(row);
        }
    }
    distinct.len()
}

fn mean_variance(data: &[Vec<f64>]) -> f64 {
    let dims = data.first().map_or(0, Vec::len);
    if dims == 0 {
        return 0.0;
    }
    let n = data.len() as f64;
    let mut total = 0.0;
    for d in 0..dims {
        let mean = data.iter().map(|r| r[d]).sum::<f64>() / n;
        total += data.iter().map(|r| (r[d] - mean).powi(2)).sum::<f64>() / n;
    }
    total / dims as f64
}
