//! Java-style properties parser
//!
//! Follows the `java.util.Properties` line format: `#` and `!` comments,
//! keys separated from values by `=`, `:` or whitespace, backslash escapes,
//! and lines continued by an odd number of trailing backslashes. A key
//! repeated on several lines accumulates its values into a list.

use std::collections::HashMap;

use wikiinit_core::ConfigValue;

pub(crate) fn parse(contents: &str) -> HashMap<String, ConfigValue> {
    let mut values: HashMap<String, ConfigValue> = HashMap::new();
    let mut logical = String::new();
    let mut continuing = false;

    for raw_line in contents.lines() {
        let line = raw_line.trim_start_matches(is_blank);
        if !continuing && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
            continue;
        }

        continuing = ends_with_continuation(line);
        if continuing {
            logical.push_str(&line[..line.len() - 1]);
            continue;
        }
        logical.push_str(line);

        if let Some((key, value)) = split_pair(&std::mem::take(&mut logical)) {
            insert(&mut values, key, value);
        }
    }

    if let Some((key, value)) = split_pair(&logical) {
        insert(&mut values, key, value);
    }

    values
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{000C}')
}

/// An escaped backslash (`\\`) at the end of a line does not continue it
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Split a logical line at the first unescaped `=`, `:` or whitespace
fn split_pair(line: &str) -> Option<(String, String)> {
    let mut key_end = line.len();
    let mut value_start = line.len();
    let mut escaped = false;

    for (idx, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = idx;
                value_start = idx + 1;
                break;
            }
            c if is_blank(c) => {
                key_end = idx;
                let rest = line[idx..].trim_start_matches(is_blank);
                let rest = rest.strip_prefix(['=', ':']).unwrap_or(rest);
                value_start = line.len() - rest.len();
                break;
            }
            _ => {}
        }
    }

    let key = unescape(&line[..key_end]);
    if key.is_empty() {
        return None;
    }
    let value = unescape(line[value_start..].trim_start_matches(is_blank));

    Some((key, value))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{000C}'),
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                let is_hex = hex.len() == 4 && hex.chars().all(|c| c.is_ascii_hexdigit());
                let decoded = is_hex
                    .then(|| u32::from_str_radix(&hex, 16).ok())
                    .flatten()
                    .and_then(char::from_u32);
                match decoded {
                    Some(decoded) => {
                        out.push(decoded);
                        chars.nth(3);
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

fn insert(values: &mut HashMap<String, ConfigValue>, key: String, value: String) {
    match values.remove(&key) {
        None => {
            values.insert(key, ConfigValue::Scalar(value));
        }
        Some(ConfigValue::Scalar(previous)) => {
            values.insert(key, ConfigValue::List(vec![previous, value]));
        }
        Some(ConfigValue::List(mut previous)) => {
            previous.push(value);
            values.insert(key, ConfigValue::List(previous));
        }
    }
}
