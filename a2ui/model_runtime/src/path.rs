//! Path expressions used by data bindings.
//!
//! Data model paths are slash-delimited (`/user/name`) and split on `/`
//! only, so map keys may contain dots. Relative paths (`name`, `./name`)
//! are resolved against a data context path. Expressions written by hand
//! may also use dot and bracket notation (`items[0].name`); [`normalize`]
//! turns those into slash form.

pub const ROOT_PATH: &str = "/";

/// Resolves `path` against `data_context_path`.
///
/// An absolute `path` overrides the context entirely. A relative one is
/// appended to the context with exactly one separator, or rooted at `/`
/// when there is no context.
pub fn resolve_path(path: &str, data_context_path: Option<&str>) -> String {
    if path.starts_with('/') {
        return collapse_slashes(path);
    }

    let relative = path.strip_prefix("./").unwrap_or(path);

    match data_context_path {
        Some(context) if !context.is_empty() && context != ROOT_PATH => {
            let base = context.trim_end_matches('/');
            collapse_slashes(&format!("{base}/{relative}"))
        }
        _ => collapse_slashes(&format!("/{relative}")),
    }
}

/// Appends one key to an absolute path.
pub fn join(base: &str, key: &str) -> String {
    let base = base.trim_end_matches('/');
    let key = key.trim_start_matches('/');
    if key.is_empty() {
        return if base.is_empty() { ROOT_PATH.to_string() } else { base.to_string() };
    }
    format!("{base}/{key}")
}

/// True for `/`, `""` and paths made only of separators or `.` segments.
pub fn is_root(path: &str) -> bool {
    segments(path).is_empty()
}

/// Splits a slash path into data model keys. Empty and `.` segments are
/// dropped; dots inside a segment are part of the key.
pub fn segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .map(str::to_string)
        .collect()
}

/// Rewrites a path expression into slash form.
///
/// `items[0].name`, `items.0.name` and `./items/0/name` all become
/// `items/0/name`; absolute expressions keep their leading `/`.
pub fn normalize(expression: &str) -> String {
    let absolute = expression.starts_with('/');
    let mut tokens = Vec::new();

    for part in expression.split('/') {
        for dotted in part.split('.') {
            push_bracket_segments(dotted, &mut tokens);
        }
    }

    let joined = tokens.join("/");
    if absolute { format!("/{joined}") } else { joined }
}

fn push_bracket_segments(raw: &str, out: &mut Vec<String>) {
    let mut rest = raw;

    while let Some(open) = rest.find('[') {
        let Some(close) = rest[open..].find(']').map(|offset| open + offset) else {
            break;
        };

        let inner = &rest[open + 1..close];
        if inner.is_empty() || !inner.bytes().all(|b| b.is_ascii_digit()) {
            break;
        }

        push_segment(&rest[..open], out);
        push_segment(inner, out);
        rest = &rest[close + 1..];
    }

    push_segment(rest, out);
}

fn push_segment(segment: &str, out: &mut Vec<String>) {
    if !segment.is_empty() {
        out.push(segment.to_string());
    }
}

/// Strips the implicit iteration variable from a binding authored inside a
/// template, e.g. `./item/name` or `/name` become `name` within a data
/// context. `.` is kept.
pub fn trim_contextual_path(path: &str, iteration_variable: &str) -> String {
    let mut trimmed = path;

    if !iteration_variable.is_empty() {
        let unprefixed = trimmed.strip_prefix('.').unwrap_or(trimmed);
        if let Some(after_slash) = unprefixed.strip_prefix('/') {
            if let Some(after_var) = after_slash.strip_prefix(iteration_variable) {
                if after_var.is_empty() || after_var.starts_with('/') {
                    trimmed = after_var;
                }
            }
        }
    }

    let unprefixed = trimmed.strip_prefix('.').unwrap_or(trimmed);
    match unprefixed.strip_prefix('/') {
        Some(rest) => rest.to_string(),
        None => trimmed.to_string(),
    }
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut previous_slash = false;

    for ch in path.chars() {
        if ch == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        out.push(ch);
    }

    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_path_ignores_context() {
        assert_eq!(resolve_path("/a/b/c", Some("/value")), "/a/b/c");
        assert_eq!(resolve_path("/value", Some("/a/b/c")), "/value");
    }

    #[test]
    fn relative_path_joins_context_with_single_separator() {
        assert_eq!(resolve_path("a/b/c", Some("/value/")), "/value/a/b/c");
        assert_eq!(resolve_path("a/b/c", Some("/value")), "/value/a/b/c");
        assert_eq!(resolve_path("./name", Some("/items/0")), "/items/0/name");
    }

    #[test]
    fn relative_path_without_context_is_rooted() {
        assert_eq!(resolve_path("name", None), "/name");
        assert_eq!(resolve_path("name", Some("/")), "/name");
        assert_eq!(resolve_path("name", Some("")), "/name");
    }

    #[test]
    fn duplicate_and_trailing_slashes_are_collapsed() {
        assert_eq!(resolve_path("//a///b/", None), "/a/b");
        assert_eq!(resolve_path("/", None), "/");
    }

    #[test]
    fn segments_split_on_slashes_only() {
        assert_eq!(segments("/items/0/name"), vec!["items", "0", "name"]);
        assert_eq!(segments("/items/0/./name"), vec!["items", "0", "name"]);
        assert_eq!(segments("/users/alice@example.com"), vec!["users", "alice@example.com"]);
        assert_eq!(segments("/ts/1700000000.5"), vec!["ts", "1700000000.5"]);
        assert!(segments("/").is_empty());
        assert!(segments(".").is_empty());
    }

    #[test]
    fn normalize_rewrites_dot_and_bracket_expressions() {
        assert_eq!(normalize("items[0].name"), "items/0/name");
        assert_eq!(normalize("items.0.name"), "items/0/name");
        assert_eq!(normalize("./items/0/name"), "items/0/name");
        assert_eq!(normalize("/book.0.title"), "/book/0/title");
        assert_eq!(normalize("/items/0/name"), "/items/0/name");
        assert_eq!(normalize("/"), "/");
    }

    #[test]
    fn numeric_keys_stay_plain_segments() {
        assert_eq!(segments("/messages/1700000000001"), vec!["messages", "1700000000001"]);
    }

    #[test]
    fn join_handles_root_and_empty_keys() {
        assert_eq!(join("/", "items"), "/items");
        assert_eq!(join("/items", "0"), "/items/0");
        assert_eq!(join("/items/", "/name"), "/items/name");
        assert_eq!(join("/items", ""), "/items");
        assert_eq!(join("/", ""), "/");
    }

    #[test]
    fn root_detection() {
        assert!(is_root("/"));
        assert!(is_root(""));
        assert!(is_root("."));
        assert!(!is_root("/a"));
    }

    #[test]
    fn contextual_trim_removes_iteration_variable_and_leading_separator() {
        assert_eq!(trim_contextual_path("./item/name", "item"), "name");
        assert_eq!(trim_contextual_path("/item/name", "item"), "name");
        assert_eq!(trim_contextual_path("/name", "item"), "name");
        assert_eq!(trim_contextual_path("./name", "item"), "name");
        assert_eq!(trim_contextual_path("name", "item"), "name");
        assert_eq!(trim_contextual_path(".", "item"), ".");
    }

    #[test]
    fn contextual_trim_only_matches_whole_segment() {
        assert_eq!(trim_contextual_path("/items/0", "item"), "items/0");
        assert_eq!(trim_contextual_path("./row/title", "row"), "title");
    }
}
