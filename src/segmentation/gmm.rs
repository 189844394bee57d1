//! Gaussian mixture colour model used by GrabCut.

pub type Color = [f64; 3];

/// Components per mixture.
pub(crate) const COMPONENTS: usize = 5;

const KMEANS_ITERATIONS: usize = 10;
const SINGULAR_DETERMINANT: f64 = 1e-6;
const REGULARIZATION: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
struct Component {
    weight: f64,
    mean: Color,
    inverse: [[f64; 3]; 3],
    determinant: f64,
}

impl Component {
    const EMPTY: Self = Self {
        weight: 0.0,
        mean: [0.0; 3],
        inverse: [[0.0; 3]; 3],
        determinant: 0.0,
    };

    fn density(&self, color: Color) -> f64 {
        if self.weight <= 0.0 {
            return 0.0;
        }
        let d = [
            color[0] - self.mean[0],
            color[1] - self.mean[1],
            color[2] - self.mean[2],
        ];
        let mut mahalanobis = 0.0;
        for (row, di) in self.inverse.iter().zip(d) {
            mahalanobis += di * (row[0] * d[0] + row[1] * d[1] + row[2] * d[2]);
        }
        (-0.5 * mahalanobis).exp() / self.determinant.sqrt()
    }
}

/// Running sums for one component while learning.
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    count: usize,
    sum: Color,
    products: [[f64; 3]; 3],
}

impl Accumulator {
    fn add(&mut self, color: Color) {
        self.count += 1;
        for i in 0..3 {
            self.sum[i] += color[i];
            for j in 0..3 {
                self.products[i][j] += color[i] * color[j];
            }
        }
    }

    fn finish(&self, total: usize) -> Component {
        if self.count == 0 {
            return Component::EMPTY;
        }
        let n = self.count as f64;
        let mean = [self.sum[0] / n, self.sum[1] / n, self.sum[2] / n];

        let mut covariance = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                covariance[i][j] = self.products[i][j] / n - mean[i] * mean[j];
            }
        }

        let mut determinant = det3(&covariance);
        if determinant <= SINGULAR_DETERMINANT {
            for (i, row) in covariance.iter_mut().enumerate() {
                row[i] += REGULARIZATION;
            }
            determinant = det3(&covariance);
        }

        Component {
            weight: n / total as f64,
            mean,
            inverse: invert3(&covariance, determinant),
            determinant,
        }
    }
}

fn det3(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

fn invert3(m: &[[f64; 3]; 3], det: f64) -> [[f64; 3]; 3] {
    [
        [
            (m[1][1] * m[2][2] - m[1][2] * m[2][1]) / det,
            (m[0][2] * m[2][1] - m[0][1] * m[2][2]) / det,
            (m[0][1] * m[1][2] - m[0][2] * m[1][1]) / det,
        ],
        [
            (m[1][2] * m[2][0] - m[1][0] * m[2][2]) / det,
            (m[0][0] * m[2][2] - m[0][2] * m[2][0]) / det,
            (m[0][2] * m[1][0] - m[0][0] * m[1][2]) / det,
        ],
        [
            (m[1][0] * m[2][1] - m[1][1] * m[2][0]) / det,
            (m[0][1] * m[2][0] - m[0][0] * m[2][1]) / det,
            (m[0][0] * m[1][1] - m[0][1] * m[1][0]) / det,
        ],
    ]
}

fn distance_sq(a: Color, b: Color) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)
}

fn nearest(color: Color, centers: &[Color]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (i, &center) in centers.iter().enumerate() {
        let d = distance_sq(color, center);
        if d < best_distance {
            best_distance = d;
            best = i;
        }
    }
    best
}

/// Cluster `samples` into `k` groups and return each sample's cluster index.
///
/// Seeding is deterministic: the middle sample first, then repeatedly the
/// sample farthest from every chosen centre.
pub fn kmeans(samples: &[Color], k: usize, iterations: usize) -> Vec<usize> {
    if samples.is_empty() || k == 0 {
        return vec![0; samples.len()];
    }

    let mut centers = Vec::with_capacity(k);
    centers.push(samples[samples.len() / 2]);
    while centers.len() < k {
        let mut farthest = 0;
        let mut farthest_distance = -1.0;
        for (i, &sample) in samples.iter().enumerate() {
            let d = distance_sq(sample, centers[nearest(sample, &centers)]);
            if d > farthest_distance {
                farthest_distance = d;
                farthest = i;
            }
        }
        centers.push(samples[farthest]);
    }

    let mut assignments = vec![0; samples.len()];
    for _ in 0..iterations {
        let mut sums = vec![[0.0; 3]; k];
        let mut counts = vec![0usize; k];
        for (slot, &sample) in assignments.iter_mut().zip(samples) {
            let c = nearest(sample, &centers);
            *slot = c;
            counts[c] += 1;
            for i in 0..3 {
                sums[c][i] += sample[i];
            }
        }
        for ((center, sum), count) in centers.iter_mut().zip(&sums).zip(&counts) {
            if *count > 0 {
                let n = *count as f64;
                *center = [sum[0] / n, sum[1] / n, sum[2] / n];
            }
        }
    }
    assignments
}

/// Weighted mixture of five full-covariance Gaussians over RGB.
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianMixture {
    components: [Component; COMPONENTS],
}

impl GaussianMixture {
    /// Learn every component from the samples assigned to it.
    ///
    /// `assignments[i]` is the component index of `samples[i]`; indices out of
    /// range are ignored.
    pub fn learn(samples: &[Color], assignments: &[usize]) -> Self {
        let mut accumulators = [Accumulator::default(); COMPONENTS];
        let mut total = 0;
        for (&sample, &component) in samples.iter().zip(assignments) {
            if let Some(acc) = accumulators.get_mut(component) {
                acc.add(sample);
                total += 1;
            }
        }
        Self {
            components: accumulators.map(|acc| acc.finish(total)),
        }
    }

    /// Initial fit: cluster the samples with k-means and learn from the clusters.
    pub fn from_samples(samples: &[Color]) -> Self {
        let assignments = kmeans(samples, COMPONENTS, KMEANS_ITERATIONS);
        Self::learn(samples, &assignments)
    }

    /// Mixture density at `color`.
    pub fn probability(&self, color: Color) -> f64 {
        self.components
            .iter()
            .map(|c| c.weight * c.density(color))
            .sum()
    }

    /// Index of the component with the highest density at `color`.
    pub fn most_likely_component(&self, color: Color) -> usize {
        let mut best = 0;
        let mut best_density = 0.0;
        for (i, component) in self.components.iter().enumerate() {
            let density = component.density(color);
            if density > best_density {
                best_density = density;
                best = i;
            }
        }
        best
    }
}
