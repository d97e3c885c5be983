/// Path equality per §4.J file correlator: exact, suffix either direction,
/// or basename-only equality.
pub fn paths_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    if a.ends_with(b) || b.ends_with(a) {
        return true;
    }
    basename(a) == basename(b)
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Command equality per §4.J process correlator: normalize whitespace, strip
/// the directory prefix from the first token, then accept exact equality,
/// substring containment either way, or equality of the base command.
pub fn commands_match(a: &str, b: &str) -> bool {
    let na = normalize_command(a);
    let nb = normalize_command(b);
    if na == nb {
        return true;
    }
    if na.contains(&nb) || nb.contains(&na) {
        return true;
    }
    base_command(&na) == base_command(&nb)
}

fn normalize_command(cmd: &str) -> String {
    cmd.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn base_command(normalized: &str) -> &str {
    let first = normalized.split(' ').next().unwrap_or(normalized);
    first.rsplit('/').next().unwrap_or(first)
}

/// Extracts a hostname from an execution's `action.target`, URL-aware: a
/// `scheme://host[:port]/...` target yields `host`; otherwise the target is
/// assumed to already be a bare hostname.
pub fn extract_hostname(target: &str) -> &str {
    let without_scheme = target.split("://").nth(1).unwrap_or(target);
    let host_and_rest = without_scheme.split('/').next().unwrap_or(without_scheme);
    host_and_rest.split(':').next().unwrap_or(host_and_rest)
}

/// Host equality per §4.J network correlator: exact match or suffix match
/// (covers `sub.api.example.com` witnessed against an `api.example.com`
/// execution target and vice versa).
pub fn hosts_match(a: &str, b: &str) -> bool {
    let a = a.trim_end_matches('.');
    let b = b.trim_end_matches('.');
    a.eq_ignore_ascii_case(b) || a.ends_with(&format!(".{b}")) || b.ends_with(&format!(".{a}"))
}
