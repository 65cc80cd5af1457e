//! String traversal shared by the body normalizers.

use serde_json::Value;

/// Calls `rewrite` for every string value in `value`, replacing the string
/// when it returns `Some`. Object keys are never rewritten.
pub(crate) fn rewrite_strings(value: &mut Value, rewrite: &mut impl FnMut(&str) -> Option<String>) {
    match value {
        Value::String(text) => {
            if let Some(replacement) = rewrite(text.as_str()) {
                *text = replacement;
            }
        },
        Value::Array(items) => {
            for item in items {
                rewrite_strings(item, rewrite);
            }
        },
        Value::Object(map) => {
            for child in map.values_mut() {
                rewrite_strings(child, rewrite);
            }
        },
        _ => {},
    }
}

/// Rewrites the path segments of a URL or absolute path.
///
/// `rewrite` receives the previous segment and the current one and returns a
/// replacement for the current segment. The query string and fragment are
/// kept verbatim. Returns `None` if `input` is not a path or nothing
/// changed.
pub(crate) fn rewrite_path_segments(
    input: &str,
    mut rewrite: impl FnMut(&str, &str) -> Option<String>,
) -> Option<String> {
    if !(input.starts_with('/') || input.contains("://")) {
        return None;
    }

    let (path, suffix) = input
        .find(['?', '#'])
        .map_or((input, ""), |i| input.split_at(i));

    let mut changed = false;
    let mut previous = "";
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match rewrite(previous, segment) {
            Some(replacement) => {
                changed = true;
                segments.push(replacement);
            },
            None => segments.push(segment.to_string()),
        }
        previous = segment;
    }

    changed.then(|| format!("{}{suffix}", segments.join("/")))
}

/// Visits the path segments of a URL or absolute path without rewriting.
pub(crate) fn for_each_path_segment(input: &str, mut visit: impl FnMut(&str, &str)) {
    rewrite_path_segments(input, |previous, segment| {
        visit(previous, segment);
        None
    });
}
