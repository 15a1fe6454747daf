//! Shared URL/form parsing utilities for route handlers.

/// Parse URL-encoded form body into key-value pairs.
/// Handles `key=value&key2=value2` format (from HTMX POST bodies).
pub fn parse_form_body(body: &str) -> Vec<(String, String)> {
    if body.is_empty() {
        return Vec::new();
    }
    body.split('&')
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?;
            let val = parts.next().unwrap_or("");
            Some((percent_decode(key), percent_decode(val)))
        })
        .collect()
}

/// Percent-decode a URL-encoded value. Decodes into raw bytes before UTF-8
/// assembly so multi-byte names (emoji, CJK) come through intact.
pub fn percent_decode(input: &str) -> String {
    let mut bytes = Vec::with_capacity(input.len());
    let mut iter = input.bytes();
    while let Some(b) = iter.next() {
        if b == b'%' {
            match (iter.next(), iter.next()) {
                (Some(hi), Some(lo)) => {
                    let hex = [hi, lo];
                    let decoded = core::str::from_utf8(&hex)
                        .ok()
                        .and_then(|s| u8::from_str_radix(s, 16).ok());
                    match decoded {
                        Some(val) => bytes.push(val),
                        None => {
                            bytes.push(b'%');
                            bytes.push(hi);
                            bytes.push(lo);
                        }
                    }
                }
                (Some(hi), None) => {
                    // lone hex digit at end of input
                    bytes.push(b'%');
                    bytes.push(hi);
                }
                _ => bytes.push(b'%'), // bare '%' at end of input
            }
        } else if b == b'+' {
            bytes.push(b' ');
        } else {
            bytes.push(b);
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Parse a query string into key-value pairs.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    let q = query.strip_prefix('?').unwrap_or(query);
    parse_form_body(q)
}

/// Helper to get a value by key from a list of key-value pairs.
pub fn get_param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Non-empty required parameter. The error text doubles as the fragment
/// message when a handler bails out.
pub fn require_param<'a>(params: &'a [(String, String)], key: &str) -> Result<&'a str, String> {
    match get_param(params, key) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(format!("missing '{}' parameter", key)),
    }
}

/// Parse a court/slot index parameter.
pub fn parse_index(params: &[(String, String)], key: &str) -> Result<usize, String> {
    let raw = require_param(params, key)?;
    raw.parse::<usize>()
        .map_err(|_| format!("'{}' is not a valid {}", raw, key))
}

/// Parse a signed adjustment parameter (play-count delta).
pub fn parse_delta(params: &[(String, String)], key: &str) -> Result<i32, String> {
    let raw = require_param(params, key)?;
    raw.parse::<i32>()
        .map_err(|_| format!("'{}' is not a valid {}", raw, key))
}

/// Split a comma-separated id list (queue reorder payloads).
pub fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Escape member-provided text for interpolation into HTML fragments.
pub fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
