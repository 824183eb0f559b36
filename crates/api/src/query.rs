//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Generic pagination parameters (`?limit=&offset=`).
///
/// Values are clamped in the repository layer via `clamp_limit` /
/// `clamp_offset`.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Treat an absent, empty or `all` filter value as "no filter".
pub fn filter_value(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != "all")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_and_blank_mean_unfiltered() {
        assert_eq!(filter_value(None), None);
        assert_eq!(filter_value(Some("all".into())), None);
        assert_eq!(filter_value(Some("  ".into())), None);
        assert_eq!(filter_value(Some(" paid ".into())), Some("paid".into()));
    }
}
