// Statistical transforms: quantiles, binning, boxplot summaries

/// Number of bins used for histograms.
pub const HISTOGRAM_BINS: usize = 20;

/// Whisker reach in multiples of the interquartile range.
const WHISKER_IQR: f64 = 1.5;

/// Equal-width histogram of one series
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `counts.len() + 1` bin edges, ascending
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// (left, right, count) per bin
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64, usize)> + '_ {
        self.edges
            .windows(2)
            .zip(&self.counts)
            .map(|(edge, &count)| (edge[0], edge[1], count))
    }
}

/// Five-number summary plus outliers for a box plot
#[derive(Debug, Clone, PartialEq)]
pub struct BoxplotStats {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

/// Linear-interpolated percentile of pre-sorted data, `p` in 0..=1
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    let n = sorted_data.len();
    if n == 0 { return f64::NAN; }
    if n == 1 { return sorted_data[0]; }

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;

    if lower_idx == upper_idx {
        sorted_data[lower_idx]
    } else {
        let weight = rank - lower_idx as f64;
        sorted_data[lower_idx] * (1.0 - weight) + sorted_data[upper_idx] * weight
    }
}

/// Sorted copy with NaNs removed
pub fn sorted_values(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Bin `values` into `bin_count` equal-width bins spanning their own min..max.
/// The last bin is closed on the right. A flat range is widened by 0.5 either
/// side (5% of the value when 0.5 is lost to rounding) and an empty series
/// spans 0..1.
pub fn compute_histogram(values: &[f64], bin_count: usize) -> Histogram {
    let bin_count = bin_count.max(1);
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();

    let (min, max) = if finite.is_empty() {
        (0.0, 1.0)
    } else {
        let min = finite.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let max = finite.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        if min == max { widen_flat(min) } else { (min, max) }
    };

    // Dividing each bound first keeps the width finite near the f64 limits
    let n = bin_count as f64;
    let width = max / n - min / n;
    let edges: Vec<f64> = (0..=bin_count)
        .map(|i| if i == bin_count { max } else { min + i as f64 * width })
        .collect();

    let mut counts = vec![0usize; bin_count];
    for v in finite {
        let offset = v / width - min / width;
        let idx = if offset.is_finite() && offset > 0.0 {
            (offset.floor() as usize).min(bin_count - 1)
        } else {
            0
        };
        counts[idx] += 1;
    }

    Histogram { edges, counts }
}

fn widen_flat(value: f64) -> (f64, f64) {
    let pad = if value - 0.5 < value && value + 0.5 > value {
        0.5
    } else {
        value.abs() * 0.05
    };
    ((value - pad).max(f64::MIN), (value + pad).min(f64::MAX))
}

/// Quartiles, 1.5 IQR whiskers and outliers. `None` for an empty series.
pub fn compute_boxplot_stats(values: &[f64]) -> Option<BoxplotStats> {
    let ys = sorted_values(values);
    if ys.is_empty() {
        return None;
    }

    let q1 = percentile(&ys, 0.25);
    let median = percentile(&ys, 0.50);
    let q3 = percentile(&ys, 0.75);
    let iqr = q3 - q1;

    let lower_fence = q1 - WHISKER_IQR * iqr;
    let upper_fence = q3 + WHISKER_IQR * iqr;

    // Whiskers reach the furthest data points inside the fences
    let lower_whisker = ys.iter().copied().find(|&v| v >= lower_fence).unwrap_or(q1);
    let upper_whisker = ys.iter().rev().copied().find(|&v| v <= upper_fence).unwrap_or(q3);

    let outliers: Vec<f64> = ys
        .iter()
        .copied()
        .filter(|&v| v < lower_fence || v > upper_fence)
        .collect();

    Some(BoxplotStats {
        lower_whisker,
        q1,
        median,
        q3,
        upper_whisker,
        outliers,
    })
}
