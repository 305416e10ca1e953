//! System identifier resolution.
//!
//! External entities and the document itself are named by system identifiers,
//! which are usually relative paths or URIs. They are resolved against the base
//! URI of the document that referenced them.

/// Resolve a potentially relative system identifier against a base URI.
///
/// Absolute identifiers (a URI scheme or an absolute path) are returned
/// unchanged. Relative identifiers are joined to the directory part of the base,
/// with `.` and `..` segments collapsed.
#[must_use]
pub fn resolve_system_ident(system_ident: &str, base_uri: &str) -> String {
    if is_absolute(system_ident) || base_uri.is_empty() {
        return system_ident.to_string();
    }

    let base_dir = base_uri.rsplit_once('/').map_or("", |(dir, _)| dir);
    if base_dir.is_empty() && !base_uri.starts_with('/') {
        return normalize_segments(system_ident);
    }
    normalize_segments(&format!("{base_dir}/{system_ident}"))
}

/// Strip a leading `file:` scheme so the identifier can be opened as a path.
#[must_use]
pub fn to_file_path(ident: &str) -> &str {
    ident
        .strip_prefix("file://")
        .or_else(|| ident.strip_prefix("file:"))
        .unwrap_or(ident)
}

fn is_absolute(ident: &str) -> bool {
    if ident.starts_with('/') {
        return true;
    }
    // "scheme:" where scheme is at least two characters, so that Windows drive
    // letters are not mistaken for a scheme.
    ident.find(':').is_some_and(|colon| {
        colon > 1
            && ident[..colon]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

fn normalize_segments(path: &str) -> String {
    let (prefix, rest) = match path.find("://") {
        Some(i) => {
            let after = &path[i + 3..];
            let host_end = after.find('/').map_or(after.len(), |p| p);
            path.split_at(i + 3 + host_end)
        }
        None => ("", path),
    };

    let absolute = rest.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|s| *s != "..") {
                    let _ = segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            s => segments.push(s),
        }
    }

    let joined = segments.join("/");
    if absolute {
        format!("{prefix}/{joined}")
    } else {
        format!("{prefix}{joined}")
    }
}
