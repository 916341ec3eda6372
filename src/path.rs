//! Path splitting.
//!
//! Paths are split on `/` with empty components dropped, which collapses
//! `//`, a leading `/`, and a trailing `/` all at once. `.` and `..` are not
//! given any special meaning here -- they are just names, same as any other
//! component -- unlike the teacher's `PathSupport`, which resolves `..` by
//! walking back up the tree. Resolving them specially would require special
//! cwd-relative bookkeeping this filesystem has no use for, since every path
//! handed to the core is already absolute.

/// Split `path` into its non-empty, `/`-separated components.
pub fn split(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|component| !component.is_empty())
        .map(|component| component.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_splits_to_no_components() {
        assert!(split("/").is_empty());
        assert!(split("").is_empty());
    }

    #[test]
    fn collapses_repeated_and_surrounding_slashes() {
        assert_eq!(split("//a//b/"), vec!["a", "b"]);
        assert_eq!(split("/a/b/c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn dot_and_dotdot_are_literal_names() {
        assert_eq!(split("/a/./b/.."), vec!["a", ".", "b", ".."]);
    }
}
