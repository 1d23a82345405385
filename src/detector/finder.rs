/// Finder pattern detection using 1:1:3:1:1 ratio scanning
use rayon::prelude::*;

use crate::models::{BitMatrix, Point};

/// Row hits closer than this many modules join the same cluster
const CLUSTER_RADIUS_MODULES: f32 = 2.0;

/// Candidates kept per row before moving on
const MAX_PATTERNS_PER_ROW: usize = 8;

/// A finder pattern centre, merged from one or more row hits
#[derive(Debug, Clone, PartialEq)]
pub struct FinderPattern {
    /// Centre in pixel coordinates
    pub center: Point,
    /// Estimated module size in pixels
    pub module_size: f32,
    /// Number of rows that confirmed this pattern
    pub hits: usize,
}

impl FinderPattern {
    fn hit(x: f32, y: f32, module_size: f32) -> Self {
        Self {
            center: Point::new(x, y),
            module_size,
            hits: 1,
        }
    }
}

/// Last five completed runs of a row, oldest first
#[derive(Default)]
struct RunWindow {
    runs: [usize; 5],
    colors: [bool; 5],
    completed: usize,
}

impl RunWindow {
    fn push(&mut self, len: usize, color: bool) {
        self.runs.rotate_left(1);
        self.colors.rotate_left(1);
        self.runs[4] = len;
        self.colors[4] = color;
        self.completed += 1;
    }

    /// Finder hit for the window ending at `end_x`, if it is dark-light-dark-light-dark in ratio
    fn check(&self, end_x: usize, y: usize) -> Option<FinderPattern> {
        if self.completed < 5 || self.colors != [true, false, true, false, true] {
            return None;
        }
        if !FinderDetector::quick_ratio_check(&self.runs) {
            return None;
        }
        FinderDetector::check_pattern(&self.runs, end_x, y)
    }
}

/// Row-scanning finder detector
pub struct FinderDetector;

impl FinderDetector {
    /// Find finder patterns, most-confirmed first
    pub fn detect(matrix: &BitMatrix) -> Vec<FinderPattern> {
        let width = matrix.width();
        let candidates: Vec<FinderPattern> = (0..matrix.height())
            .into_par_iter()
            .filter(|&y| Self::has_significant_edges(matrix, y, width))
            .flat_map_iter(|y| Self::scan_row(matrix, y, width))
            .collect();

        let mut merged = Self::cluster(candidates);
        merged.sort_by(|a, b| b.hits.cmp(&a.hits));
        merged
    }

    /// Cheap pre-check: sample every other pixel for colour changes
    fn has_significant_edges(matrix: &BitMatrix, y: usize, width: usize) -> bool {
        let mut transitions = 0;
        let mut prev = matrix.get(0, y);
        for x in (2..width).step_by(2) {
            let color = matrix.get(x, y);
            if color != prev {
                transitions += 1;
                if transitions >= 4 {
                    return true;
                }
                prev = color;
            }
        }
        false
    }

    fn scan_row(matrix: &BitMatrix, y: usize, width: usize) -> Vec<FinderPattern> {
        let mut candidates = Vec::new();
        let mut window = RunWindow::default();
        let mut run_start = 0usize;
        let mut current = matrix.get(0, y);

        for x in 1..width {
            let color = matrix.get(x, y);
            if color == current {
                continue;
            }

            window.push(x - run_start, current);
            run_start = x;
            current = color;

            if let Some(pattern) = window.check(x, y) {
                candidates.push(pattern);
                if candidates.len() >= MAX_PATTERNS_PER_ROW {
                    return candidates;
                }
            }
        }

        // The run still open at the right edge
        window.push(width - run_start, current);
        if let Some(pattern) = window.check(width, y) {
            candidates.push(pattern);
        }

        candidates
    }

    /// Integer-only rejection before the float ratio test
    fn quick_ratio_check(lengths: &[usize; 5]) -> bool {
        let [b1, w1, b2, w2, b3] = *lengths;
        let total = b1 + w1 + b2 + w2 + b3;

        // 7 modules of at least 3 pixels
        if total < 21 {
            return false;
        }

        let outer_min = b1.min(b3);
        if b2 < outer_min * 2 || b2 > outer_min * 5 {
            return false;
        }

        let outer_avg = (b1 + b3 + w1 + w2) / 4;
        (outer_avg / 2..=outer_avg * 2).contains(&w1) && (outer_avg / 2..=outer_avg * 2).contains(&w2)
    }

    fn check_pattern(lengths: &[usize; 5], end_x: usize, y: usize) -> Option<FinderPattern> {
        let total: usize = lengths.iter().sum();
        let unit = total as f32 / 7.0;

        const TOL: f32 = 0.5;
        const EXPECTED: [f32; 5] = [1.0, 1.0, 3.0, 1.0, 1.0];
        let within = lengths
            .iter()
            .zip(EXPECTED)
            .all(|(&len, want)| (len as f32 / unit - want).abs() <= TOL);
        if !within {
            return None;
        }

        let [_, _, b2, w2, b3] = *lengths;
        let center_x = end_x as f32 - b3 as f32 - w2 as f32 - b2 as f32 / 2.0;
        // Row hits sample the middle of the pixel row
        Some(FinderPattern::hit(center_x, y as f32 + 0.5, unit))
    }

    /// Merge row hits into patterns by running centroid
    fn cluster(candidates: Vec<FinderPattern>) -> Vec<FinderPattern> {
        // (sum_x, sum_y, sum_module, hits)
        let mut sums: Vec<(f32, f32, f32, usize)> = Vec::new();

        for c in candidates {
            let slot = sums.iter_mut().find(|(sx, sy, sm, n)| {
                let n = *n as f32;
                let centroid = Point::new(sx / n, sy / n);
                let radius = (sm / n).max(c.module_size) * CLUSTER_RADIUS_MODULES;
                centroid.distance_squared(&c.center) < radius * radius
            });
            match slot {
                Some(s) => {
                    s.0 += c.center.x;
                    s.1 += c.center.y;
                    s.2 += c.module_size;
                    s.3 += 1;
                }
                None => sums.push((c.center.x, c.center.y, c.module_size, 1)),
            }
        }

        sums.into_iter()
            .map(|(sx, sy, sm, n)| {
                let k = n as f32;
                FinderPattern {
                    center: Point::new(sx / k, sy / k),
                    module_size: sm / k,
                    hits: n,
                }
            })
            .collect()
    }
}
