//! URL helpers shared by the tree store, search and duplicate detection.

use url::Url;

fn has_http_scheme(value: &str) -> bool {
    let lower = value.get(..8).unwrap_or(value).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        value.get(prefix.len()..)
    } else {
        None
    }
}

/// Prefixes `https://` unless the value already has an http(s) scheme.
pub fn normalize_url(value: &str) -> String {
    if has_http_scheme(value) {
        value.to_string()
    } else {
        format!("https://{}", value)
    }
}

/// Heuristic used to tell pasted URLs apart from folder paths.
///
/// Accepts anything with an http(s) scheme, or a bare `host.tld` optionally
/// followed by a port, path, query or fragment. Whitespace always rejects.
pub fn is_likely_url(value: &str) -> bool {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }
    if has_http_scheme(value) {
        return true;
    }

    let host_end = value.find([':', '/', '?', '#']).unwrap_or(value.len());
    let host = &value[..host_end];
    let Some(dot) = host.rfind('.') else {
        return false;
    };
    let (label, tld) = (&host[..dot], &host[dot + 1..]);
    !label.is_empty()
        && label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
        && tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
}

fn parse_lenient(raw_url: &str) -> Option<Url> {
    let value = if raw_url.starts_with("http") {
        raw_url.to_string()
    } else {
        format!("https://{}", raw_url)
    };
    Url::parse(&value).ok()
}

/// Host name of the URL, or the input unchanged when it cannot be parsed.
pub fn domain_from_url(raw_url: &str) -> String {
    parse_lenient(raw_url)
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| raw_url.to_string())
}

/// Key under which two bookmarks count as the same page.
///
/// Lowercases the host, drops the fragment and port, strips one trailing
/// slash from a non-root path and keeps a non-empty query. Unparseable input
/// falls back to its trimmed lowercase form.
pub fn normalize_url_for_dedup(raw_url: &str) -> String {
    let Some(url) = parse_lenient(raw_url) else {
        return raw_url.trim().to_lowercase();
    };
    let host = url.host_str().unwrap_or_default().to_lowercase();
    let path = url.path();
    let path = if path.len() > 1 && path.ends_with('/') {
        &path[..path.len() - 1]
    } else {
        path
    };
    let query = match url.query() {
        Some(query) if !query.is_empty() => format!("?{}", query),
        _ => String::new(),
    };
    format!("{}://{}{}{}", url.scheme(), host, path, query)
}

/// Short form shown under bookmark titles: no scheme, no `www.`, no
/// trailing slash.
pub fn format_url_for_display(raw_url: &str) -> String {
    let mut display = raw_url.trim();
    display = strip_prefix_ignore_case(display, "https://")
        .or_else(|| strip_prefix_ignore_case(display, "http://"))
        .unwrap_or(display);
    display = strip_prefix_ignore_case(display, "www.").unwrap_or(display);
    if display.len() > 1 {
        display = display.strip_suffix('/').unwrap_or(display);
    }
    display.to_string()
}
