use std::path::{Path, PathBuf};

/// Expand a leading `~` to the user's home directory (§4.F).
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// True if `path` matches any of `patterns`. Patterns use `*` within a path
/// segment and `**` across segments (§4.F).
pub fn is_excluded(path: &Path, patterns: &[String]) -> bool {
    let path_str = path.to_string_lossy();
    patterns.iter().any(|p| glob_match(p, &path_str))
}

fn glob_match(pattern: &str, candidate: &str) -> bool {
    let pattern_segs: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let candidate_segs: Vec<&str> = candidate.split('/').filter(|s| !s.is_empty()).collect();
    match_segments(&pattern_segs, &candidate_segs)
}

fn match_segments(pattern: &[&str], candidate: &[&str]) -> bool {
    match pattern.first() {
        None => candidate.is_empty(),
        Some(&"**") => {
            // ** matches zero or more whole segments.
            match_segments(&pattern[1..], candidate)
                || (!candidate.is_empty() && match_segments(pattern, &candidate[1..]))
        }
        Some(seg) => match candidate.first() {
            Some(c) => segment_match(seg, c) && match_segments(&pattern[1..], &candidate[1..]),
            None => false,
        },
    }
}

/// `*` matches any run of characters within a single segment (never `/`,
/// since segments are already split on it).
fn segment_match(pattern: &str, segment: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == segment;
    }
    let parts: Vec<&str> = pattern.split('*').collect();
    let mut rest = segment;

    if let Some(first) = parts.first() {
        if !first.is_empty() {
            match rest.strip_prefix(first) {
                Some(r) => rest = r,
                None => return false,
            }
        }
    }
    if let Some(last) = parts.last() {
        if !last.is_empty() {
            match rest.strip_suffix(last) {
                Some(r) => rest = r,
                None => return false,
            }
        }
    }

    let middle = &parts[1..parts.len().saturating_sub(1)];
    let mut cursor = rest;
    for part in middle {
        if part.is_empty() {
            continue;
        }
        match cursor.find(part) {
            Some(idx) => cursor = &cursor[idx + part.len()..],
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_star_matches_any_depth() {
        assert!(is_excluded(Path::new("/a/b/c/d.rs"), &["**/d.rs".into()]));
        assert!(is_excluded(Path::new("/d.rs"), &["**/d.rs".into()]));
    }

    #[test]
    fn single_star_does_not_cross_segment_boundary() {
        assert!(!is_excluded(Path::new("/a/b/c.rs"), &["a/*.rs".into()]));
        assert!(is_excluded(Path::new("/a/c.rs"), &["a/*.rs".into()]));
    }

    #[test]
    fn exact_and_wildcard_segments() {
        assert!(is_excluded(
            Path::new("/home/user/.git/objects/x"),
            &["**/.git/**".into()]
        ));
        assert!(is_excluded(
            Path::new("/home/user/node_modules/pkg"),
            &["**/node_modules/**".into()]
        ));
    }

    #[test]
    fn non_matching_pattern_does_not_exclude() {
        assert!(!is_excluded(Path::new("/a/b.rs"), &["**/c.rs".into()]));
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_home("~/projects"), home.join("projects"));
    }
}
