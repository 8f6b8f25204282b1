use crate::models::error::{BackupError, Result};
use std::fs;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Strips trailing separators so `/data/foo/` and `/data/foo` name the same thing
pub fn strip_trailing_separator(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    let trimmed = raw.trim_end_matches(|c: char| c == '/' || c == MAIN_SEPARATOR);
    if trimmed.is_empty() {
        // the filesystem root
        return path.to_path_buf();
    }
    PathBuf::from(trimmed)
}

/// Splits a source path into the directory the archiver changes into and the
/// base name it archives relative to that directory.
pub fn split_source(source: &Path) -> Result<(PathBuf, String)> {
    let normalized = strip_trailing_separator(source);

    let resolved = match normalized.file_name() {
        Some(_) => normalized,
        // `.`, `..` and friends have no base name until resolved
        None => fs::canonicalize(&normalized).map_err(|cause| BackupError::MetadataError {
            path: normalized.clone(),
            cause,
        })?,
    };

    let base_name = resolved
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            BackupError::InvalidConfig(format!(
                "Cannot back up '{}': it has no base name",
                source.display()
            ))
        })?;

    let parent = match resolved.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    Ok((parent, base_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_trailing_separator_is_ignored() {
        let with_slash = split_source(Path::new("/data/foo/")).unwrap();
        let without_slash = split_source(Path::new("/data/foo")).unwrap();

        assert_eq!(with_slash, without_slash);
        assert_eq!(with_slash, (PathBuf::from("/data"), "foo".to_string()));
    }

    #[test]
    fn test_repeated_trailing_separators() {
        let (parent, base) = split_source(Path::new("/data/foo///")).unwrap();
        assert_eq!(parent, PathBuf::from("/data"));
        assert_eq!(base, "foo");
    }

    #[test]
    fn test_file_source() {
        let (parent, base) = split_source(Path::new("/data/set/d.txt")).unwrap();
        assert_eq!(parent, PathBuf::from("/data/set"));
        assert_eq!(base, "d.txt");
    }

    #[test]
    fn test_bare_relative_name_uses_current_dir() {
        let (parent, base) = split_source(Path::new("notes")).unwrap();
        assert_eq!(parent, PathBuf::from("."));
        assert_eq!(base, "notes");
    }

    #[test]
    fn test_dot_components_are_resolved() {
        let temp_dir = TempDir::new().unwrap();
        let inner = temp_dir.path().join("inner");
        fs::create_dir(&inner).unwrap();

        let (parent, base) = split_source(&inner.join("..")).unwrap();

        let expected = fs::canonicalize(temp_dir.path()).unwrap();
        assert_eq!(parent, expected.parent().unwrap().to_path_buf());
        assert_eq!(base, expected.file_name().unwrap().to_string_lossy());
    }

    #[test]
    fn test_root_has_no_base_name() {
        assert!(split_source(Path::new("/")).is_err());
    }
}
