// Query-string builder.
//
// Owns percent-encoding so callers never hand-join `&` pairs.

use std::fmt;

/// Ordered list of query parameters.
///
/// Keys and values are stored raw and encoded once by [`Query::encode`],
/// so `state=Assigned` travels as `state%3DAssigned` and spaces as `%20`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter. Repeated keys are kept in order.
    pub fn param(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Append a parameter only when `value` is `Some`.
    pub fn param_opt<V: fmt::Display>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.param(key, v),
            None => self,
        }
    }

    /// The suite's `filter=<expr>` parameter.
    pub fn filter(self, expr: impl fmt::Display) -> Self {
        self.param("filter", expr)
    }

    pub fn limit(self, limit: usize) -> Self {
        self.param("limit", limit)
    }

    pub fn offset(self, offset: usize) -> Self {
        self.param("offset", offset)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Percent-encoded `k=v&k=v` form, without a leading `?`.
    pub fn encode(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Boolean as the suite spells it on lookup endpoints: `0` is true,
/// `1` is false.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiFlag(pub bool);

impl fmt::Display for ApiFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0 { "0" } else { "1" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_spaces_and_separators() {
        let query = Query::new()
            .filter("name=New York")
            .param("rangeRef", "172.16.17.0/24");
        assert_eq!(
            query.encode(),
            "filter=name%3DNew%20York&rangeRef=172.16.17.0%2F24"
        );
    }

    #[test]
    fn ampersands_in_values_cannot_split_parameters() {
        let query = Query::new().filter("owner=R&D");
        assert_eq!(query.encode(), "filter=owner%3DR%26D");
    }

    #[test]
    fn preserves_insertion_order_and_skips_missing_options() {
        let query = Query::new()
            .limit(100)
            .param_opt("startAddress", None::<&str>)
            .offset(200)
            .param_opt("ping", Some(ApiFlag(true)));
        assert_eq!(query.encode(), "limit=100&offset=200&ping=0");
        assert_eq!(query.get("offset"), Some("200"));
    }

    #[test]
    fn empty_query_encodes_to_nothing() {
        assert!(Query::new().is_empty());
        assert_eq!(Query::new().encode(), "");
    }

    #[test]
    fn api_flag_is_inverted() {
        assert_eq!(ApiFlag(true).to_string(), "0");
        assert_eq!(ApiFlag(false).to_string(), "1");
    }
}
