//! Property path syntax.
//!
//! A path is a dot-separated list of property names, optionally ending in
//! one bracketed segment that descends into a collection-valued property:
//!
//! ```text
//! name
//! address.city
//! customer.orders[total]        // any order whose total matches
//! orders[lines[sku]]            // brackets nest
//! ```

use std::fmt;

/// A parsed property path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    raw: String,
    segments: Vec<String>,
    element: Option<String>,
}

impl PropertyPath {
    /// Parses a path, returning the reason on malformed input.
    pub fn parse(raw: &str) -> Result<Self, String> {
        if raw.is_empty() {
            return Err("path is empty".to_string());
        }

        let (outer, element) = match raw.find('[') {
            Some(open) => {
                if !raw.ends_with(']') {
                    return Err("a bracketed segment must close at the end of the path".to_string());
                }
                let inner = &raw[open + 1..raw.len() - 1];
                if inner.is_empty() {
                    return Err("bracketed segment is empty".to_string());
                }
                (&raw[..open], Some(inner.to_string()))
            }
            None => {
                if raw.contains(']') {
                    return Err("unbalanced ']'".to_string());
                }
                (raw, None)
            }
        };

        let mut segments = Vec::new();
        for segment in outer.split('.') {
            if segment.is_empty() {
                return Err("path contains an empty segment".to_string());
            }
            segments.push(segment.to_string());
        }

        Ok(PropertyPath {
            raw: raw.to_string(),
            segments,
            element,
        })
    }

    /// The path as written by the client.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Property names leading up to the value (or to the collection).
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Path applied to each element of the collection, if bracketed.
    pub fn element(&self) -> Option<&str> {
        self.element.as_deref()
    }

    pub fn is_collection(&self) -> bool {
        self.element.is_some()
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_and_dotted() {
        let p = PropertyPath::parse("name").unwrap();
        assert_eq!(p.segments(), ["name"]);
        assert!(!p.is_collection());

        let p = PropertyPath::parse("address.city").unwrap();
        assert_eq!(p.segments(), ["address", "city"]);
    }

    #[test]
    fn bracketed_collection() {
        let p = PropertyPath::parse("customer.orders[total]").unwrap();
        assert_eq!(p.segments(), ["customer", "orders"]);
        assert_eq!(p.element(), Some("total"));
    }

    #[test]
    fn nested_brackets_stay_in_element() {
        let p = PropertyPath::parse("orders[lines[sku]]").unwrap();
        assert_eq!(p.segments(), ["orders"]);
        assert_eq!(p.element(), Some("lines[sku]"));
    }

    #[test]
    fn malformed_paths() {
        assert!(PropertyPath::parse("").is_err());
        assert!(PropertyPath::parse("a..b").is_err());
        assert!(PropertyPath::parse(".a").is_err());
        assert!(PropertyPath::parse("orders[]").is_err());
        assert!(PropertyPath::parse("orders[total].x").is_err());
        assert!(PropertyPath::parse("orders]").is_err());
        assert!(PropertyPath::parse("[total]").is_err());
    }
}
