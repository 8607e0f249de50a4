// Corpus cleanup: outlier removal by percentile and LaTeX preamble stripping.

use std::sync::OnceLock;

use regex_lite::Regex;
use tracing::debug;

use crate::error::{ChunkError, Result};

/// Value at quantile `q` of `values` with linear interpolation between the
/// two nearest ranks. `values` must be non-empty.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Split `rows` into `(kept, outliers)` around the `percentile` quantile of
/// `key`: rows at or below the cutoff are kept, rows above it are outliers.
/// Both halves keep input order.
pub fn remove_over_percentile<T, F>(rows: Vec<T>, key: F, percentile: f64) -> Result<(Vec<T>, Vec<T>)>
where
    F: Fn(&T) -> f64,
{
    if !(0.0..=1.0).contains(&percentile) {
        return Err(ChunkError::invalid(format!(
            "percentile must be between 0 and 1, got {percentile}"
        )));
    }
    if rows.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }

    let values: Vec<f64> = rows.iter().map(&key).collect();
    let cutoff = quantile(&values, percentile);

    let (kept, outliers): (Vec<T>, Vec<T>) = rows.into_iter().partition(|row| key(row) <= cutoff);

    debug!(
        cutoff,
        kept = kept.len(),
        outliers = outliers.len(),
        "Removed rows over percentile"
    );

    Ok((kept, outliers))
}

fn usepackage_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\\usepackage\{.*?\}").expect("valid regex"))
}

/// Remove every `\usepackage{...}` directive.
pub fn remove_latex_packages(text: &str) -> String {
    usepackage_pattern().replace_all(text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&values, 0.0), 1.0);
        assert_eq!(quantile(&values, 1.0), 4.0);
        assert!((quantile(&values, 0.5) - 2.5).abs() < 1e-12);
        assert!((quantile(&values, 0.9) - 3.7).abs() < 1e-12);
    }

    #[test]
    fn test_quantile_ignores_input_order() {
        assert!((quantile(&[4.0, 1.0, 3.0, 2.0], 0.5) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_remove_over_percentile_partitions_in_order() {
        let rows = vec![("a", 10.0), ("b", 500.0), ("c", 20.0), ("d", 30.0)];
        let (kept, outliers) = remove_over_percentile(rows, |r| r.1, 0.75).unwrap();
        // cutoff = 30 + (500 - 30) * 0.25 = 147.5
        assert_eq!(kept, vec![("a", 10.0), ("c", 20.0), ("d", 30.0)]);
        assert_eq!(outliers, vec![("b", 500.0)]);
    }

    #[test]
    fn test_full_percentile_keeps_everything() {
        let (kept, outliers) = remove_over_percentile(vec![1.0, 2.0, 3.0], |v| *v, 1.0).unwrap();
        assert_eq!(kept.len(), 3);
        assert!(outliers.is_empty());
    }

    #[test]
    fn test_percentile_out_of_range() {
        for p in [-0.1, 1.5] {
            assert!(matches!(
                remove_over_percentile(vec![1.0], |v| *v, p),
                Err(ChunkError::InputValidation(_))
            ));
        }
    }

    #[test]
    fn test_remove_latex_packages() {
        let text = "\\documentclass{article}\n\\usepackage{amsmath}\\usepackage[utf8]{inputenc}\nBody {text}";
        let cleaned = remove_latex_packages(text);
        assert_eq!(
            cleaned,
            "\\documentclass{article}\n\\usepackage[utf8]{inputenc}\nBody {text}"
        );
    }

    #[test]
    fn test_remove_latex_packages_is_non_greedy() {
        assert_eq!(remove_latex_packages("\\usepackage{a} keep {b}"), " keep {b}");
    }
}
