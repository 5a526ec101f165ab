//! placeholder substitution for scaffolding templates
//!
//! placeholders are written `@key@` where key is `[a-z0-9_]+`. any other use of
//! `@` is copied through untouched.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

pub type Bindings = BTreeMap<String, String>;

/// substitute every `@key@` in `template` from `bindings`
pub fn render(template: &str, bindings: &Bindings) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('@') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        match after.find('@') {
            Some(end) if is_key(&after[..end]) => {
                let key = &after[..end];
                let value = bindings
                    .get(key)
                    .ok_or_else(|| Error::UnboundPlaceholder(key.to_string()))?;
                out.push_str(value);
                rest = &after[end + 1..];
            }
            _ => {
                out.push('@');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    Ok(out)
}

fn is_key(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// build bindings from pairs
pub fn bindings<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Bindings {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
