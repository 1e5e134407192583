//! Client identity resolution and operation path normalization.

/// Placeholder substituted for id-like path segments.
pub const ID_PLACEHOLDER: &str = ":id";

const UNKNOWN_CLIENT: &str = "unknown";

/// Resolve the client key from proxy headers in priority order, falling back
/// to the direct connection address.
///
/// Multi-valued headers like `x-forwarded-for` contribute their first entry.
pub fn resolve_client_key<'a, F>(priority: &[String], lookup: F, remote_addr: Option<&str>) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    for header in priority {
        let Some(value) = lookup(header) else {
            continue;
        };
        let first = value.split(',').next().unwrap_or("").trim();
        if !first.is_empty() {
            return first.to_string();
        }
    }
    remote_addr
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

fn is_id_segment(segment: &str) -> bool {
    (!segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()))
        || uuid::Uuid::parse_str(segment).is_ok()
}

/// Replace numeric (and UUID) segments with [`ID_PLACEHOLDER`], dropping the
/// query string and any trailing slash.
pub fn normalize_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or("");
    let segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| if is_id_segment(s) { ID_PLACEHOLDER } else { s })
        .collect();
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn priority() -> Vec<String> {
        seoforge_core::config::DEFAULT_CLIENT_HEADERS
            .iter()
            .map(|h| h.to_string())
            .collect()
    }

    #[test]
    fn header_priority_wins() {
        let headers: HashMap<&str, &str> =
            [("x-forwarded-for", "10.0.0.1, 10.0.0.2"), ("x-real-ip", "192.168.1.9")].into();
        let key = resolve_client_key(&priority(), |h| headers.get(h).copied(), Some("127.0.0.1"));
        assert_eq!(key, "192.168.1.9");
    }

    #[test]
    fn forwarded_for_takes_first_hop() {
        let headers: HashMap<&str, &str> = [("x-forwarded-for", " 10.0.0.1 , 10.0.0.2")].into();
        let key = resolve_client_key(&priority(), |h| headers.get(h).copied(), None);
        assert_eq!(key, "10.0.0.1");
    }

    #[test]
    fn falls_back_to_remote_then_unknown() {
        let none = |_: &str| -> Option<&'static str> { None };
        assert_eq!(resolve_client_key(&priority(), none, Some("127.0.0.1")), "127.0.0.1");
        assert_eq!(resolve_client_key(&priority(), none, None), "unknown");
    }

    #[test]
    fn normalizes_numeric_and_uuid_segments() {
        assert_eq!(normalize_path("/api/products/42/reprocess"), "/api/products/:id/reprocess");
        assert_eq!(
            normalize_path("/api/products/67e55044-10b1-426f-9247-bb680e5fe0c8/status/"),
            "/api/products/:id/status"
        );
        assert_eq!(normalize_path("/api/products/enrich?x=1"), "/api/products/enrich");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("/api/v2/items"), "/api/v2/items");
    }
}
