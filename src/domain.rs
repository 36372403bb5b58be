/// Hostname extraction and domain rule matching for Tab Muter
use url::Url;

/// Extract the hostname from a tab URL
///
/// Fails soft: anything `Url` cannot parse (internal pages without a host,
/// garbage strings, empty input) yields an empty string, which matches no rule.
///
/// Examples:
/// - https://www.youtube.com/watch?v=x → www.youtube.com
/// - chrome://newtab → newtab
/// - not a url → ""
pub fn extract_hostname(url: &str) -> String {
    Url::parse(url.trim())
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .unwrap_or_default()
}

/// Does `hostname` match the rule `domain`?
///
/// Case-insensitive; true on an exact match or when `hostname` is a
/// subdomain of `domain` ("www.youtube.com" matches "youtube.com",
/// "notyoutube.com" does not).
pub fn matches(hostname: &str, domain: &str) -> bool {
    if hostname.is_empty() || domain.is_empty() {
        return false;
    }

    let hostname = hostname.to_lowercase();
    let domain = domain.to_lowercase();

    hostname == domain || hostname.ends_with(&format!(".{}", domain))
}

/// True if any rule in `domains` matches `hostname`
pub fn matches_any<S: AsRef<str>>(hostname: &str, domains: &[S]) -> bool {
    domains.iter().any(|domain| matches(hostname, domain.as_ref()))
}

/// Parse a textarea value into a domain list: one entry per line, trimmed, blanks dropped
pub fn parse_domain_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Inverse of `parse_domain_list` for filling a textarea
pub fn format_domain_list(domains: &[String]) -> String {
    domains.join("\n")
}
