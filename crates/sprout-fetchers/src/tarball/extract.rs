//! Gzipped tarball extraction with path validation.
//!
//! Published npm tarballs nest all entries under a single top-level
//! directory (`package/` for registry tarballs, `repo-<sha>/` for git-hosted
//! ones); extraction strips that component. Entry paths are validated so an
//! archive cannot write outside the destination directory.

use std::fs;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use camino::Utf8Path;
use flate2::read::GzDecoder;
use tar::{Archive, EntryType};

use sprout_core::SproutError;

use crate::FetcherResult;

/// Extract a gzipped tarball into `dest_dir`, stripping the top-level directory
pub fn extract_tarball<R: Read>(reader: R, dest_dir: &Utf8Path) -> FetcherResult<()> {
    let gz_decoder = GzDecoder::new(reader);
    let mut archive = Archive::new(gz_decoder);
    let dest_dir = dest_dir.as_std_path();

    fs::create_dir_all(dest_dir)
        .map_err(|e| SproutError::io(format!("Failed to create {}", dest_dir.display()), e))?;

    for entry_result in archive
        .entries()
        .map_err(|e| SproutError::io("Failed to read tarball entries".to_string(), e))?
    {
        let mut entry =
            entry_result.map_err(|e| SproutError::io("Failed to read tarball entry".to_string(), e))?;
        let entry_path = entry
            .path()
            .map_err(|e| SproutError::io("Failed to read tarball entry path".to_string(), e))?
            .into_owned();

        // The top-level directory itself produces an empty remainder
        let Some(safe_path) = validate_extract_path(&entry_path, dest_dir)? else {
            continue;
        };

        match entry.header().entry_type() {
            EntryType::Regular => {
                if let Some(parent) = safe_path.parent() {
                    fs::create_dir_all(parent).map_err(|e| {
                        SproutError::io(format!("Failed to create {}", parent.display()), e)
                    })?;
                }
                let mut file = fs::File::create(&safe_path).map_err(|e| {
                    SproutError::io(format!("Failed to create {}", safe_path.display()), e)
                })?;
                std::io::copy(&mut entry, &mut file).map_err(|e| {
                    SproutError::io(format!("Failed to write {}", safe_path.display()), e)
                })?;

                #[cfg(unix)]
                if let Ok(mode) = entry.header().mode() {
                    use std::os::unix::fs::PermissionsExt;
                    let _ = fs::set_permissions(&safe_path, fs::Permissions::from_mode(mode));
                }
            }
            EntryType::Directory => {
                fs::create_dir_all(&safe_path).map_err(|e| {
                    SproutError::io(format!("Failed to create {}", safe_path.display()), e)
                })?;
            }
            // Published tarballs cannot carry links or device nodes
            _ => continue,
        }
    }

    Ok(())
}

/// Validate an entry path: strip the top-level directory, reject traversal
/// and absolute components. Returns `None` for the top-level directory entry.
fn validate_extract_path(entry_path: &Path, dest_dir: &Path) -> FetcherResult<Option<PathBuf>> {
    let mut safe_path = dest_dir.to_path_buf();
    let mut seen_root = false;
    let mut has_components = false;

    for component in entry_path.components() {
        match component {
            Component::Normal(name) => {
                // The first normal component is the tarball's top-level directory
                if !seen_root {
                    seen_root = true;
                    continue;
                }
                has_components = true;
                safe_path.push(name);
            }
            Component::ParentDir => {
                return Err(SproutError::IntegrityFailure {
                    package: "tarball".to_string(),
                    expected: "safe entry path".to_string(),
                    actual: format!("directory traversal: {}", entry_path.display()),
                });
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(SproutError::IntegrityFailure {
                    package: "tarball".to_string(),
                    expected: "relative entry path".to_string(),
                    actual: format!("absolute path: {}", entry_path.display()),
                });
            }
            Component::CurDir => continue,
        }
    }

    if !has_components {
        return Ok(None);
    }

    if !safe_path.starts_with(dest_dir) {
        return Err(SproutError::IntegrityFailure {
            package: "tarball".to_string(),
            expected: "path within destination".to_string(),
            actual: format!("path escapes: {}", entry_path.display()),
        });
    }

    Ok(Some(safe_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_top_level_directory() {
        let dest = Path::new("/tmp/pkg");
        let path = validate_extract_path(Path::new("package/lib/index.js"), dest)
            .unwrap()
            .unwrap();
        assert_eq!(path, Path::new("/tmp/pkg/lib/index.js"));
    }

    #[test]
    fn top_level_directory_entry_is_skipped() {
        let dest = Path::new("/tmp/pkg");
        assert!(validate_extract_path(Path::new("package/"), dest)
            .unwrap()
            .is_none());
    }

    #[test]
    fn rejects_parent_traversal() {
        let dest = Path::new("/tmp/pkg");
        let result = validate_extract_path(Path::new("package/../../evil"), dest);
        assert!(matches!(
            result.unwrap_err(),
            SproutError::IntegrityFailure { .. }
        ));
    }

    #[test]
    fn rejects_absolute_paths() {
        let dest = Path::new("/tmp/pkg");
        let result = validate_extract_path(Path::new("/etc/passwd"), dest);
        assert!(matches!(
            result.unwrap_err(),
            SproutError::IntegrityFailure { .. }
        ));
    }
}
