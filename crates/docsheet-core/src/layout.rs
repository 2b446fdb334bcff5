use crate::model::{Row, TextFragment};
use std::collections::BTreeMap;

/// Default line-clustering tolerance: `y` is rounded to the nearest whole
/// unit, so fragments within ±0.5 units share a line.
pub const DEFAULT_ROW_TOLERANCE: f64 = 1.0;

/// Reconstruct rows from the unordered text fragments of one page.
///
/// Fragments are bucketed by `floor(y / tolerance + 0.5)`. Buckets are ordered
/// top to bottom by the raw `y` of their first member, fragments inside a
/// bucket left to right by `x`. Each fragment becomes its own cell, which is how
/// independent text runs turn into columns.
///
/// Two fragments whose `y` differ slightly but round to the same bucket end up
/// in the same row.
pub fn reconstruct_rows(fragments: &[TextFragment], tolerance: f64) -> Vec<Row> {
    let mut lines: BTreeMap<i64, Vec<&TextFragment>> = BTreeMap::new();
    for fragment in fragments {
        lines
            .entry(line_key(fragment.y, tolerance))
            .or_default()
            .push(fragment);
    }

    let mut lines: Vec<Vec<&TextFragment>> = lines.into_values().collect();

    // Each bucket is non-empty; `first()` is the member that opened it.
    lines.sort_by(|a, b| b[0].y.total_cmp(&a[0].y));

    lines
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| a.x.total_cmp(&b.x));
            line.into_iter().map(|f| f.text.clone()).collect()
        })
        .collect()
}

fn line_key(y: f64, tolerance: f64) -> i64 {
    let tolerance = if tolerance > 0.0 {
        tolerance
    } else {
        DEFAULT_ROW_TOLERANCE
    };
    // Halves round toward positive infinity, so -0.5 joins the 0 line.
    (y / tolerance + 0.5).floor() as i64
}
