//! Canonical `/`-separated absolute path handling. Paths are never resolved
//! against the host filesystem; they only address nodes inside the image.

use crate::error::{Error, Result};

/// Splits an absolute image path into its non-empty components.
/// `/` itself splits into zero components (the root).
pub fn split(path: &str) -> Result<Vec<&str>> {
    if !path.starts_with('/') {
        return Err(Error::InvalidPath(format!("path must be absolute: {path}")));
    }
    Ok(path.split('/').filter(|c| !c.is_empty()).collect())
}

/// Splits a path into its parent (as `/`-joined components) and its final
/// component name. The root itself has no parent and is rejected.
pub fn split_parent(path: &str) -> Result<(String, &str)> {
    let components = split(path)?;
    let (name, parent) = components
        .split_last()
        .ok_or_else(|| Error::InvalidPath("the root has no parent".to_string()))?;
    let parent_path = if parent.is_empty() { "/".to_string() } else { format!("/{}", parent.join("/")) };
    Ok((parent_path, *name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_nested_paths() {
        assert_eq!(split("/a/b/c").unwrap(), vec!["a", "b", "c"]);
        assert_eq!(split("/").unwrap(), Vec::<&str>::new());
    }

    #[test]
    fn rejects_relative_paths() {
        assert!(split("a/b").is_err());
    }

    #[test]
    fn split_parent_separates_leaf_from_directory() {
        let (parent, name) = split_parent("/a/b/c").unwrap();
        assert_eq!(parent, "/a/b");
        assert_eq!(name, "c");

        let (parent, name) = split_parent("/x").unwrap();
        assert_eq!(parent, "/");
        assert_eq!(name, "x");
    }

    #[test]
    fn root_has_no_parent() {
        assert!(split_parent("/").is_err());
    }
}
