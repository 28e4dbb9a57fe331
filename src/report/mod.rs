// Cohort statistics over the cleaned table: terminal summary and PDF report

pub mod pdf;
pub mod summary;
pub mod text;

pub use pdf::render_pdf;
pub use summary::{CohortSummary, NumericSummary, Proportion, Stratum};
pub use text::{print_summary, summary_lines};

/// `num / den` as a percentage, `None` when the denominator is zero
pub fn percentage(num: usize, den: usize) -> Option<f64> {
    if den == 0 {
        return None;
    }
    Some(num as f64 / den as f64 * 100.0)
}

/// One decimal, `n/a` when undefined
pub fn format_pct(value: Option<f64>) -> String {
    match value {
        Some(pct) => format!("{:.1}%", pct),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_guards_zero_denominator() {
        assert_eq!(percentage(3, 0), None);
        assert_eq!(percentage(0, 0), None);
        assert_eq!(percentage(1, 4), Some(25.0));
        assert_eq!(format_pct(percentage(0, 0)), "n/a");
        assert_eq!(format_pct(percentage(1, 3)), "33.3%");
    }
}
