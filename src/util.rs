//! Small SQL fragment builders shared by the database modules.
//!
//! Several listing queries assemble their tails at runtime (page bounds,
//! random sampling, `IN`-list placeholders). Everything produced here is
//! numeric or positional, so interpolation into a query string is safe.

use crate::constants::MAX_PAGE_SIZE;

/// Builds a ` LIMIT x OFFSET y` tail with the limit clamped to
/// `1..=MAX_PAGE_SIZE` and the offset floored at zero.
pub fn limit_offset(limit: i64, offset: i64) -> String {
    let limit = limit.clamp(1, MAX_PAGE_SIZE);
    let offset = offset.max(0);
    format!(" LIMIT {} OFFSET {}", limit, offset)
}

/// Builds an ` ORDER BY RANDOM() LIMIT n` tail for sampling rows.
pub fn random_limit(limit: i64) -> String {
    let limit = limit.clamp(1, MAX_PAGE_SIZE);
    format!(" ORDER BY RANDOM() LIMIT {}", limit)
}

/// Builds a `$start, $start+1, ...` placeholder list for binding a variable
/// number of parameters, e.g. `WHERE id IN (...)`.
pub fn in_placeholders(start: usize, count: usize) -> String {
    (start..start + count)
        .map(|n| format!("${}", n))
        .collect::<Vec<_>>()
        .join(", ")
}
