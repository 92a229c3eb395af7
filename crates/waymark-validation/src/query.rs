//! Query string parsing.

use indexmap::IndexMap;
use tracing::warn;

/// Query keys mapped to every value in request order.
pub type QueryMap = IndexMap<String, Vec<String>>;

/// Parses a query string (with or without the leading `?`).
///
/// `tags[]=a&tags[]=b` is read as two values of `tags`.
///
/// ```rust
/// use waymark_validation::parse_query;
///
/// let query = parse_query("limit=2&tags=a&tags=b&name=caf%C3%A9");
/// assert_eq!(query["limit"], vec!["2"]);
/// assert_eq!(query["tags"], vec!["a", "b"]);
/// assert_eq!(query["name"], vec!["café"]);
/// ```
#[must_use]
pub fn parse_query(query: &str) -> QueryMap {
    let query = query.strip_prefix('?').unwrap_or(query);
    let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(query) {
        Ok(pairs) => pairs,
        Err(e) => {
            warn!(error = %e, "unparsable query string ignored");
            Vec::new()
        }
    };

    let mut map = QueryMap::new();
    for (key, value) in pairs {
        let key = key.strip_suffix("[]").map(str::to_string).unwrap_or(key);
        map.entry(key).or_default().push(value);
    }
    map
}
