//! Deterministic cache-key construction.
//!
//! Keys are `operation:part:part:...`. The same operation with the same
//! filter parameters always yields the same key, so concurrent callers share
//! cache entries.

/// Build a cache key from an operation name and its parameter parts.
pub fn cache_key(operation: &str, parts: &[&str]) -> String {
    let mut key = String::from(operation);
    for part in parts {
        key.push(':');
        key.push_str(part);
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_shape() {
        assert_eq!(cache_key("routes", &["all"]), "routes:all");
        assert_eq!(cache_key("route", &["r1"]), "route:r1");
        assert_eq!(
            cache_key("stops", &["route=r1:r=500"]),
            "stops:route=r1:r=500"
        );
    }

    #[test]
    fn test_no_parts() {
        assert_eq!(cache_key("routes", &[]), "routes");
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(cache_key("a", &["b", "c"]), cache_key("a", &["b", "c"]));
    }
}
