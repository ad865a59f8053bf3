//! vCard parsing into extended contact data.
//!
//! Handles vCard 2.1, 3.0 and 4.0 line syntax: folded lines, property
//! groups (`item1.TEL`), `TYPE=` and bare type parameters, and backslash
//! escapes. Only the first card in the input is read.

use bytes::Bytes;
use shareprep_core::{ContactData, ContactPhone};

const DEFAULT_PHONE_LABEL: &str = "other";

/// Parse the first vCard in `vcard`. Returns `None` when there is no card or
/// the card carries neither a name nor a phone number.
pub fn parse_vcard(vcard: &Bytes) -> Option<ContactData> {
    let text = String::from_utf8_lossy(vcard);
    let lines = unfold(&text);

    let mut contact = ContactData {
        vcard: vcard.clone(),
        ..Default::default()
    };
    let mut in_card = false;
    let mut seen_card = false;

    for line in &lines {
        let Some((name, params, value)) = split_property(line) else {
            continue;
        };

        match name.as_str() {
            "BEGIN" if value.eq_ignore_ascii_case("VCARD") => {
                in_card = true;
                seen_card = true;
            }
            "END" if value.eq_ignore_ascii_case("VCARD") => break,
            _ if !in_card => {}
            "FN" => contact.formatted_name = non_empty(unescape(value)),
            "N" => {
                let parts = split_components(value);
                contact.last_name = parts.first().cloned().unwrap_or_default();
                contact.first_name = parts.get(1).cloned().unwrap_or_default();
            }
            "TEL" => {
                let number = unescape(value);
                if !number.trim().is_empty() {
                    contact.phone_numbers.push(ContactPhone {
                        label: phone_label(&params),
                        number: number.trim().to_string(),
                    });
                }
            }
            "EMAIL" => {
                if let Some(email) = non_empty(unescape(value)) {
                    contact.emails.push(email);
                }
            }
            "ORG" => {
                contact.organization = split_components(value)
                    .into_iter()
                    .find(|part| !part.is_empty());
            }
            "URL" => {
                if let Some(url) = non_empty(unescape(value)) {
                    contact.urls.push(url);
                }
            }
            "BDAY" => contact.birthday = non_empty(unescape(value)),
            _ => {}
        }
    }

    if !seen_card {
        return None;
    }

    let has_name = !contact.first_name.is_empty()
        || !contact.last_name.is_empty()
        || contact.formatted_name.is_some();
    if !has_name && contact.phone_numbers.is_empty() {
        return None;
    }

    if contact.first_name.is_empty() && contact.last_name.is_empty() {
        if let Some(formatted) = &contact.formatted_name {
            contact.first_name = formatted.clone();
        }
    }

    Some(contact)
}

/// Join continuation lines (starting with a space or tab) onto the line
/// before them.
fn unfold(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in text.split('\n') {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        let continuation = raw.strip_prefix(' ').or_else(|| raw.strip_prefix('\t'));
        if let (Some(continuation), Some(last)) = (continuation, lines.last_mut()) {
            last.push_str(continuation);
            continue;
        }
        lines.push(raw.to_string());
    }
    lines
}

/// Split `group.NAME;PARAM=a;PARAM2:value` into the upper-cased name, the
/// parameters and the raw value.
fn split_property(line: &str) -> Option<(String, Vec<String>, &str)> {
    let (head, value) = line.split_once(':')?;
    let mut parts = head.split(';');
    let name = parts.next()?;
    let name = name.rsplit('.').next().unwrap_or(name).trim().to_ascii_uppercase();
    if name.is_empty() {
        return None;
    }
    let params = parts.map(|p| p.trim().to_string()).collect();
    Some((name, params, value))
}

fn phone_label(params: &[String]) -> String {
    params
        .iter()
        .flat_map(|param| {
            let types = match param.split_once('=') {
                Some((key, values)) if key.eq_ignore_ascii_case("TYPE") => values,
                Some(_) => "",
                None => param.as_str(),
            };
            types.split(',')
        })
        .map(|t| t.trim().trim_matches('"').to_ascii_lowercase())
        .find(|t| !t.is_empty() && !matches!(t.as_str(), "voice" | "pref" | "internet"))
        .unwrap_or_else(|| DEFAULT_PHONE_LABEL.to_string())
}

/// Split a structured value on unescaped semicolons and unescape each part.
fn split_components(value: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in value.chars() {
        if escaped {
            current.push('\\');
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == ';' {
            parts.push(unescape(&current).trim().to_string());
            current.clear();
        } else {
            current.push(c);
        }
    }
    parts.push(unescape(&current).trim().to_string());
    parts
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
