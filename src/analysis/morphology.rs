// BlobMorphologyAnalyzer - bright-region shape statistics of a spectrogram
//
// Cells above (grid mean + k * grid std-dev) form a binary mask. Connected
// components of that mask (8-connectivity) are the regions. Each region is
// summarised by the ellipse with the same second central moments; the
// per-capture statistics aggregate those descriptors.
//
// A grid with no cell strictly above the threshold (for example a constant
// grid) has no regions, and every aggregate is then 0.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::analysis::spectral::SpectrogramFrame;
use crate::config::MorphologyConfig;

/// Eigenvalue ratio below which a region is treated as collinear
const COLLINEAR_RATIO: f64 = 1e-12;

const NEIGHBORS: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

/// Shape descriptors of one connected bright region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    /// Number of cells
    pub area: usize,
    pub major_axis_length: f64,
    pub minor_axis_length: f64,
    /// 0 for a circle, approaching 1 for a line
    pub eccentricity: f64,
    /// major / minor, or 0 when the minor axis is 0
    pub aspect_ratio: f64,
}

/// Capture-level aggregate of all regions
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MorphologyStats {
    pub total_area: f64,
    pub region_count: f64,
    pub max_area: f64,
    pub mean_aspect_ratio: f64,
    pub mean_eccentricity: f64,
}

/// Thresholds a spectrogram and measures its connected bright regions
#[derive(Debug, Clone)]
pub struct BlobMorphologyAnalyzer {
    threshold_sigma: f64,
}

impl BlobMorphologyAnalyzer {
    pub fn new(config: &MorphologyConfig) -> Self {
        Self {
            threshold_sigma: config.threshold_sigma,
        }
    }

    /// Grid mean + threshold_sigma * grid standard deviation
    pub fn threshold(&self, frame: &SpectrogramFrame) -> f64 {
        let values = frame.values();
        if values.is_empty() {
            return 0.0;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        mean + self.threshold_sigma * variance.sqrt()
    }

    /// Label connected regions of cells strictly above the threshold
    pub fn regions(&self, frame: &SpectrogramFrame) -> Vec<Region> {
        let rows = frame.n_freq();
        let cols = frame.n_time();
        let threshold = self.threshold(frame);
        let mask: Vec<bool> = frame.values().iter().map(|&v| v > threshold).collect();

        let mut visited = vec![false; mask.len()];
        let mut regions = Vec::new();
        let mut queue = VecDeque::new();
        let mut cells: Vec<(usize, usize)> = Vec::new();

        for start in 0..mask.len() {
            if !mask[start] || visited[start] {
                continue;
            }

            cells.clear();
            visited[start] = true;
            queue.push_back(start);

            while let Some(idx) = queue.pop_front() {
                let (r, c) = (idx / cols, idx % cols);
                cells.push((r, c));

                for &(dr, dc) in &NEIGHBORS {
                    let nr = r as isize + dr;
                    let nc = c as isize + dc;
                    if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                        continue;
                    }
                    let neighbor = nr as usize * cols + nc as usize;
                    if mask[neighbor] && !visited[neighbor] {
                        visited[neighbor] = true;
                        queue.push_back(neighbor);
                    }
                }
            }

            regions.push(describe_region(&cells));
        }

        regions
    }

    /// Aggregate region descriptors for one spectrogram
    pub fn analyze(&self, frame: &SpectrogramFrame) -> MorphologyStats {
        aggregate(&self.regions(frame))
    }
}

/// Sum, count, max and means over regions; all zero when there are none
pub fn aggregate(regions: &[Region]) -> MorphologyStats {
    if regions.is_empty() {
        return MorphologyStats::default();
    }

    let count = regions.len() as f64;
    MorphologyStats {
        total_area: regions.iter().map(|r| r.area as f64).sum(),
        region_count: count,
        max_area: regions.iter().map(|r| r.area).max().unwrap_or(0) as f64,
        mean_aspect_ratio: regions.iter().map(|r| r.aspect_ratio).sum::<f64>() / count,
        mean_eccentricity: regions.iter().map(|r| r.eccentricity).sum::<f64>() / count,
    }
}

fn describe_region(cells: &[(usize, usize)]) -> Region {
    let area = cells.len();
    let n = area as f64;
    let mean_r = cells.iter().map(|&(r, _)| r as f64).sum::<f64>() / n;
    let mean_c = cells.iter().map(|&(_, c)| c as f64).sum::<f64>() / n;

    let (mut mu_rr, mut mu_cc, mut mu_rc) = (0.0, 0.0, 0.0);
    for &(r, c) in cells {
        let dr = r as f64 - mean_r;
        let dc = c as f64 - mean_c;
        mu_rr += dr * dr;
        mu_cc += dc * dc;
        mu_rc += dr * dc;
    }
    mu_rr /= n;
    mu_cc /= n;
    mu_rc /= n;

    let half_sum = (mu_rr + mu_cc) / 2.0;
    let spread = (((mu_rr - mu_cc) / 2.0).powi(2) + mu_rc * mu_rc).sqrt();
    let l1 = (half_sum + spread).max(0.0);
    let mut l2 = (half_sum - spread).max(0.0);
    if l2 < l1 * COLLINEAR_RATIO {
        l2 = 0.0;
    }

    let major_axis_length = 4.0 * l1.sqrt();
    let minor_axis_length = 4.0 * l2.sqrt();
    let eccentricity = if l1 > 0.0 {
        (1.0 - l2 / l1).sqrt()
    } else {
        0.0
    };
    let aspect_ratio = if minor_axis_length > 0.0 {
        major_axis_length / minor_axis_length
    } else {
        0.0
    };

    Region {
        area,
        major_axis_length,
        minor_axis_length,
        eccentricity,
        aspect_ratio,
    }
}
