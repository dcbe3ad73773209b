//! Allow/ignore pattern filtering for repository paths.
//!
//! Patterns use shell-style wildcards: `*` matches any run of characters
//! (including `/`), `?` matches a single character. A path is selected when
//! it matches at least one allow pattern (or no allow list is given) and no
//! ignore pattern. Ignore wins over allow.

/// Match a single wildcard pattern against a repository path.
#[must_use]
pub fn matches_pattern(pattern: &str, path: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    let txt: Vec<char> = path.chars().collect();

    // Iterative wildcard match with backtracking to the last `*`.
    let (mut p, mut t) = (0usize, 0usize);
    let (mut star, mut star_t) = (None::<usize>, 0usize);

    while t < txt.len() {
        if p < pat.len() && (pat[p] == '?' || pat[p] == txt[t]) {
            p += 1;
            t += 1;
        } else if p < pat.len() && pat[p] == '*' {
            star = Some(p);
            star_t = t;
            p += 1;
        } else if let Some(sp) = star {
            p = sp + 1;
            star_t += 1;
            t = star_t;
        } else {
            return false;
        }
    }

    while p < pat.len() && pat[p] == '*' {
        p += 1;
    }
    p == pat.len()
}

/// Whether a path survives the allow/ignore pattern pair.
#[must_use]
pub fn is_selected(path: &str, allow: Option<&[String]>, ignore: Option<&[String]>) -> bool {
    if let Some(ignore) = ignore {
        if ignore.iter().any(|pat| matches_pattern(pat, path)) {
            return false;
        }
    }
    match allow {
        Some(allow) => allow.iter().any(|pat| matches_pattern(pat, path)),
        None => true,
    }
}

/// Filter a path list through the allow/ignore pattern pair.
#[must_use]
pub fn filter_paths(
    paths: &[String],
    allow: Option<&[String]>,
    ignore: Option<&[String]>,
) -> Vec<String> {
    paths
        .iter()
        .filter(|path| is_selected(path, allow, ignore))
        .cloned()
        .collect()
}
