use serde::Serialize;

/// Share of units sold per format, as a whole percentage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatShare {
    pub format: String,
    pub percentage: i64,
}

/// Percentages are rounded independently, so they may not sum to exactly
/// 100. Every share is 0 when nothing was sold.
pub fn format_distribution(totals: &[(String, i64)]) -> Vec<FormatShare> {
    let total: i64 = totals.iter().map(|(_, units)| *units).sum();
    totals
        .iter()
        .map(|(format, units)| FormatShare {
            format: format.clone(),
            percentage: if total > 0 {
                (*units as f64 / total as f64 * 100.0).round() as i64
            } else {
                0
            },
        })
        .collect()
}
