//! Properties files
//!
//! Reader for the `key=value` files found in SDK packages
//! (`source.properties`, `build.prop`, `sdk.properties`, `manifest.ini`).
//! Follows the usual properties syntax: `=`, `:` or whitespace separators,
//! `#`/`!` comments, backslash escapes and line continuations.

use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Parsed properties, ordered by key
pub type Properties = BTreeMap<String, String>;

/// Read a properties file.
///
/// Returns `None` when the file is missing, unreadable or holds no entries.
pub fn read_properties(path: &Path) -> Option<Properties> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            if path.exists() {
                debug!("Failed to read {:?}: {}", path, e);
            }
            return None;
        }
    };
    let props = parse_properties(&text);
    if props.is_empty() {
        None
    } else {
        Some(props)
    }
}

/// Parse properties text. Later duplicates override earlier ones.
pub fn parse_properties(text: &str) -> Properties {
    let mut props = Properties::new();
    let mut lines = text.lines();

    while let Some(raw) = lines.next() {
        let mut line = raw.trim_start().to_string();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        while ends_with_continuation(&line) {
            line.pop();
            match lines.next() {
                Some(next) => line.push_str(next.trim_start()),
                None => break,
            }
        }
        let (key, value) = split_entry(&line);
        props.insert(key, value);
    }

    props
}

/// Merge `overlay` on top of `base`
pub fn merge(base: &mut Properties, overlay: Option<Properties>) {
    if let Some(overlay) = overlay {
        base.extend(overlay);
    }
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> (String, String) {
    let chars: Vec<char> = line.chars().collect();

    let mut end = 0;
    let mut escaped = false;
    while end < chars.len() {
        let c = chars[end];
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || c.is_whitespace() {
            break;
        }
        end += 1;
    }

    let mut start = end;
    while start < chars.len() && chars[start].is_whitespace() {
        start += 1;
    }
    if start < chars.len() && (chars[start] == '=' || chars[start] == ':') {
        start += 1;
        while start < chars.len() && chars[start].is_whitespace() {
            start += 1;
        }
    }

    let key: String = chars[..end].iter().collect();
    let value: String = chars[start..].iter().collect();
    (unescape(&key), unescape(&value))
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{0c}'),
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                let decoded = if hex.len() == 4 {
                    u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32)
                } else {
                    None
                };
                match decoded {
                    Some(ch) => {
                        out.push(ch);
                        for _ in 0..4 {
                            chars.next();
                        }
                    }
                    None => out.push('u'),
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}
