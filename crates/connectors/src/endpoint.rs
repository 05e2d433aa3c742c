//! Resolution of the endpoint strings given on the command line.
//!
//! An endpoint string either names a store (`http://host:9200/collection`)
//! or a local file (`dump.json`, `/var/dump/x.json`, `file:///var/dump/x.json`).

use crate::error::AdapterError;

/// A resolved endpoint string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Store base URL without the path, or the file location as given.
    pub url: String,
    /// Collection name taken from the URL path, or the file path.
    pub collection: String,
    pub is_file: bool,
}

impl Endpoint {
    /// Parses an endpoint string.
    ///
    /// - no scheme: the whole string is both the file path and the collection;
    /// - `file://`: the URL path is the file path;
    /// - any other scheme: the path is stripped from the URL and, without its
    ///   leading slashes, becomes the collection name.
    pub fn parse(raw: &str) -> Result<Self, AdapterError> {
        let Some((scheme, rest)) = split_scheme(raw)? else {
            return Ok(Endpoint {
                url: raw.to_string(),
                collection: raw.to_string(),
                is_file: true,
            });
        };

        let scheme = scheme.to_ascii_lowercase();
        let (rest, fragment) = split_off(rest, '#');
        let (rest, query) = split_off(rest, '?');

        let Some(hierarchy) = rest.strip_prefix("//") else {
            // Opaque form, e.g. `file:dump.json`.
            return Ok(Endpoint {
                url: format!("{scheme}:{}", &raw[scheme.len() + 1..]),
                collection: if scheme == "file" {
                    rest.to_string()
                } else {
                    String::new()
                },
                is_file: scheme == "file",
            });
        };

        let (authority, path) = match hierarchy.find('/') {
            Some(idx) => hierarchy.split_at(idx),
            None => (hierarchy, ""),
        };

        if scheme == "file" {
            return Ok(Endpoint {
                url: format!("{scheme}:{}", &raw[scheme.len() + 1..]),
                collection: path.to_string(),
                is_file: true,
            });
        }

        let mut url = format!("{scheme}://{authority}");
        if let Some(query) = query {
            url.push('?');
            url.push_str(query);
        }
        if let Some(fragment) = fragment {
            url.push('#');
            url.push_str(fragment);
        }

        Ok(Endpoint {
            url,
            collection: path.trim_start_matches('/').to_string(),
            is_file: false,
        })
    }
}

/// Splits `scheme:rest`. Returns `None` when the string carries no scheme.
fn split_scheme(raw: &str) -> Result<Option<(&str, &str)>, AdapterError> {
    for (idx, c) in raw.char_indices() {
        match c {
            'a'..='z' | 'A'..='Z' => {}
            '0'..='9' | '+' | '-' | '.' if idx > 0 => {}
            ':' if idx == 0 => {
                return Err(AdapterError::InvalidEndpoint {
                    endpoint: raw.to_string(),
                    reason: "missing protocol scheme".to_string(),
                });
            }
            ':' => return Ok(Some((&raw[..idx], &raw[idx + 1..]))),
            _ => return Ok(None),
        }
    }
    Ok(None)
}

fn split_off(s: &str, sep: char) -> (&str, Option<&str>) {
    match s.split_once(sep) {
        Some((head, tail)) => (head, Some(tail)),
        None => (s, None),
    }
}
