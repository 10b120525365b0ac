//! Per-file information the parser needs to resolve imports.

/// Where the file being parsed lives.
///
/// `folder` is a resource path such as `res://ui/menus`; relative import
/// paths are joined onto it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseContext {
    pub file_base_name: String,
    pub folder: String,
}

impl Default for ParseContext {
    fn default() -> Self {
        ParseContext {
            file_base_name: String::new(),
            folder: "res://".to_string(),
        }
    }
}

impl ParseContext {
    pub fn new(file_base_name: impl Into<String>, folder: impl Into<String>) -> Self {
        ParseContext {
            file_base_name: file_base_name.into(),
            folder: folder.into(),
        }
    }

    /// Resolves an import path against [`folder`](Self::folder).
    ///
    /// Paths carrying a scheme (`res://x`) or a leading `/` are taken as
    /// they are; either way `.` and `..` segments are folded away.
    pub fn resolve(&self, path: &str) -> String {
        if path.contains("://") || path.starts_with('/') || self.folder.is_empty() {
            return normalize(path);
        }
        let mut joined = self.folder.trim_end_matches('/').to_string();
        if !joined.ends_with(':') {
            joined.push('/');
        } else {
            joined.push_str("//");
        }
        joined.push_str(path);
        normalize(&joined)
    }
}

/// Folds `.` and `..` segments and duplicate separators, keeping any
/// `scheme://` prefix. `..` never climbs above a scheme or `/` root.
fn normalize(path: &str) -> String {
    let (prefix, rest, rooted) = match path.find("://") {
        Some(index) => (&path[..index + 3], &path[index + 3..], true),
        None if path.starts_with('/') => ("/", &path[1..], true),
        None => ("", path, false),
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if rooted => {}
                _ => segments.push(".."),
            },
            _ => segments.push(segment),
        }
    }
    format!("{prefix}{}", segments.join("/"))
}
