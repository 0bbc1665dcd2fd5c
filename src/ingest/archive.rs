//! Archive extraction into a scoped working directory.
//!
//! ZIP archives are read with the `zip` crate. RAR archives are handed to the
//! external `unar` tool, which covers both RAR4 and RAR5 without licensing
//! restrictions.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Component, Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::{debug, warn};
use zip::ZipArchive;

use super::ArchiveKind;
use crate::core::{OmrError, OmrResult, SimpleError};

/// Extracts an archive into a fresh temporary directory.
///
/// The directory and everything in it are removed when the returned
/// [`TempDir`] is dropped; on error nothing is left behind.
pub fn extract_archive(path: &Path, kind: ArchiveKind, unar_program: &Path) -> OmrResult<TempDir> {
    let temp_dir = TempDir::new()?;
    match kind {
        ArchiveKind::Zip => extract_zip(path, temp_dir.path())?,
        ArchiveKind::Rar => extract_rar(path, temp_dir.path(), unar_program)?,
    }
    debug!("Extracted {} into {}", path.display(), temp_dir.path().display());
    Ok(temp_dir)
}

fn extract_zip(path: &Path, dest: &Path) -> OmrResult<()> {
    let context = path.display().to_string();
    let file = File::open(path)?;
    let mut archive =
        ZipArchive::new(BufReader::new(file)).map_err(|e| OmrError::archive(&context, e))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| OmrError::archive(&context, e))?;
        if entry.is_dir() {
            continue;
        }
        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping invalid path: {} (path traversal attempt or empty)", entry.name());
            continue;
        };

        let out_path = dest.join(relative);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out).map_err(|e| OmrError::archive(&context, e))?;
    }
    Ok(())
}

fn extract_rar(path: &Path, dest: &Path, unar_program: &Path) -> OmrResult<()> {
    let context = path.display().to_string();
    let output = Command::new(unar_program)
        .arg("-o")
        .arg(dest)
        .arg("-D") // Don't create subdirectory
        .arg("-f") // Force overwrite
        .arg(path)
        .output()
        .map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                OmrError::archive(
                    &context,
                    SimpleError::new(format!(
                        "{} not found; install unar to read RAR archives",
                        unar_program.display()
                    )),
                )
            } else {
                OmrError::archive(&context, e)
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(OmrError::archive(
            &context,
            SimpleError::new(format!("unar extraction failed: {}", stderr.trim())),
        ));
    }
    Ok(())
}

/// Every regular file under `root`, in directory traversal order.
///
/// The order is whatever the file system reports and is not sorted. Paths
/// are returned with the relative name they had inside the archive.
pub fn walk_files(root: &Path) -> io::Result<Vec<(PathBuf, PathBuf)>> {
    let mut files = Vec::new();
    walk_recursive(root, root, &mut files)?;
    Ok(files)
}

fn walk_recursive(dir: &Path, base: &Path, files: &mut Vec<(PathBuf, PathBuf)>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let metadata = entry.metadata()?;

        if metadata.is_file() {
            let raw = path.strip_prefix(base).unwrap_or(&path);
            let Some(relative) = sanitize_path(raw) else {
                warn!("Skipping invalid path: {}", raw.display());
                continue;
            };
            files.push((path, relative));
        } else if metadata.is_dir() {
            walk_recursive(&path, base, files)?;
        }
    }
    Ok(())
}

fn sanitize_path(path: &Path) -> Option<PathBuf> {
    let sanitized: PathBuf = path
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name),
            _ => None,
        })
        .collect();
    (!sanitized.as_os_str().is_empty()).then_some(sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) -> Result<(), Box<dyn std::error::Error>> {
        let mut writer = zip::ZipWriter::new(File::create(path)?);
        for (name, bytes) in entries {
            writer.start_file(*name, SimpleFileOptions::default())?;
            writer.write_all(bytes)?;
        }
        writer.finish()?;
        Ok(())
    }

    #[test]
    fn test_zip_extracts_nested_members() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let zip_path = dir.path().join("scans.zip");
        write_zip(&zip_path, &[("a.txt", b"a"), ("inner/b.txt", b"bb")])?;

        let extracted = extract_archive(&zip_path, ArchiveKind::Zip, Path::new("unar"))?;
        let mut names: Vec<PathBuf> = walk_files(extracted.path())?
            .into_iter()
            .map(|(_, relative)| relative)
            .collect();
        names.sort();
        assert_eq!(names, vec![PathBuf::from("a.txt"), PathBuf::from("inner/b.txt")]);
        Ok(())
    }

    #[test]
    fn test_working_directory_is_removed() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let zip_path = dir.path().join("scans.zip");
        write_zip(&zip_path, &[("a.txt", b"a")])?;

        let extracted = extract_archive(&zip_path, ArchiveKind::Zip, Path::new("unar"))?;
        let work_dir = extracted.path().to_path_buf();
        assert!(work_dir.exists());
        drop(extracted);
        assert!(!work_dir.exists());
        Ok(())
    }

    #[test]
    fn test_corrupt_zip_is_an_archive_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let zip_path = dir.path().join("broken.zip");
        std::fs::write(&zip_path, b"PK but not really")?;

        let err = extract_archive(&zip_path, ArchiveKind::Zip, Path::new("unar")).unwrap_err();
        assert!(err.to_string().starts_with("archive extraction failed"), "{err}");
        Ok(())
    }

    #[test]
    fn test_missing_unar_is_reported() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let rar_path = dir.path().join("scans.rar");
        std::fs::write(&rar_path, b"Rar!")?;

        let err = extract_archive(&rar_path, ArchiveKind::Rar, Path::new("/nonexistent/unar"))
            .unwrap_err();
        assert!(err.to_report_string().contains("install unar"), "{err}");
        Ok(())
    }

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path(Path::new("../a/./b.png")), Some(PathBuf::from("a/b.png")));
        assert_eq!(sanitize_path(Path::new("..")), None);
    }
}
