//! Byte-order-mark checks and fixes for script files.
//!
//! Windows PowerShell reads BOM-less scripts in the legacy code page, which
//! mangles non-ASCII text. These helpers find such files and prepend the
//! UTF-8 BOM.

use crate::error::AppError;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: [u8; 2] = [0xFF, 0xFE];
const UTF16_BE_BOM: [u8; 2] = [0xFE, 0xFF];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncodingKind {
    Utf8Bom,
    Utf8NoBom,
    Utf16Le,
    Utf16Be,
    Unknown,
}

impl EncodingKind {
    pub fn status(self) -> &'static str {
        match self {
            EncodingKind::Utf8Bom => "✓ UTF-8 with BOM",
            EncodingKind::Utf8NoBom => "⚠ UTF-8 without BOM (may cause issues)",
            EncodingKind::Utf16Le => "⚠ UTF-16 LE",
            EncodingKind::Utf16Be => "⚠ UTF-16 BE",
            EncodingKind::Unknown => "✗ Unknown encoding",
        }
    }
}

impl fmt::Display for EncodingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.status())
    }
}

pub fn detect_encoding(bytes: &[u8]) -> EncodingKind {
    if bytes.starts_with(&UTF8_BOM) {
        EncodingKind::Utf8Bom
    } else if bytes.starts_with(&UTF16_LE_BOM) {
        EncodingKind::Utf16Le
    } else if bytes.starts_with(&UTF16_BE_BOM) {
        EncodingKind::Utf16Be
    } else if std::str::from_utf8(bytes).is_ok() {
        EncodingKind::Utf8NoBom
    } else {
        EncodingKind::Unknown
    }
}

pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

/// Matching files under `target`. A file target is returned as-is when its
/// extension matches; directories are walked recursively.
pub fn find_script_files(target: &Path, extension: &str) -> Result<Vec<PathBuf>, AppError> {
    if target.is_file() {
        return Ok(if has_extension(target, extension) {
            vec![target.to_path_buf()]
        } else {
            Vec::new()
        });
    }
    if !target.is_dir() {
        return Err(AppError::InvalidInput(format!(
            "{} is neither a file nor directory",
            target.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(target).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && has_extension(entry.path(), extension) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub utf8_bom: usize,
    pub utf8_no_bom: usize,
    pub utf16_le: usize,
    pub utf16_be: usize,
    pub unknown: usize,
    pub errors: usize,
}

impl CheckSummary {
    fn record(&mut self, kind: EncodingKind) {
        match kind {
            EncodingKind::Utf8Bom => self.utf8_bom += 1,
            EncodingKind::Utf8NoBom => self.utf8_no_bom += 1,
            EncodingKind::Utf16Le => self.utf16_le += 1,
            EncodingKind::Utf16Be => self.utf16_be += 1,
            EncodingKind::Unknown => self.unknown += 1,
        }
    }

    pub fn needs_fix(&self) -> bool {
        self.utf8_no_bom > 0
    }
}

#[derive(Debug)]
pub struct CheckOutcome {
    pub path: PathBuf,
    pub result: Result<EncodingKind, AppError>,
}

pub fn check_file(path: &Path) -> Result<EncodingKind, AppError> {
    let bytes = std::fs::read(path)?;
    Ok(detect_encoding(&bytes))
}

pub fn check_path(target: &Path, extension: &str) -> Result<(Vec<CheckOutcome>, CheckSummary), AppError> {
    let files = find_script_files(target, extension)?;
    let mut summary = CheckSummary::default();

    let outcomes = files
        .into_iter()
        .map(|path| {
            let result = check_file(&path);
            match &result {
                Ok(kind) => summary.record(*kind),
                Err(e) => {
                    tracing::warn!("Failed to check {}: {}", path.display(), e);
                    summary.errors += 1;
                }
            }
            CheckOutcome { path, result }
        })
        .collect();

    Ok((outcomes, summary))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FixAction {
    Fixed,
    Skipped,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FixSummary {
    pub fixed: usize,
    pub skipped: usize,
    pub errors: usize,
}

#[derive(Debug)]
pub struct FixOutcome {
    pub path: PathBuf,
    pub result: Result<FixAction, AppError>,
}

/// Prepends the UTF-8 BOM unless already present. Content that is not valid
/// UTF-8 is left untouched and reported as an error.
pub fn add_utf8_bom(path: &Path) -> Result<FixAction, AppError> {
    let bytes = std::fs::read(path)?;
    match detect_encoding(&bytes) {
        EncodingKind::Utf8Bom => Ok(FixAction::Skipped),
        EncodingKind::Utf8NoBom => {
            let mut fixed = Vec::with_capacity(bytes.len() + UTF8_BOM.len());
            fixed.extend_from_slice(&UTF8_BOM);
            fixed.extend_from_slice(&bytes);
            std::fs::write(path, fixed)?;
            Ok(FixAction::Fixed)
        }
        other => Err(AppError::FileProcessingError(format!(
            "Refusing to rewrite non UTF-8 file ({:?})",
            other
        ))),
    }
}

pub fn fix_path(target: &Path, extension: &str) -> Result<(Vec<FixOutcome>, FixSummary), AppError> {
    let files = find_script_files(target, extension)?;
    let mut summary = FixSummary::default();

    let outcomes = files
        .into_iter()
        .map(|path| {
            let result = add_utf8_bom(&path);
            match &result {
                Ok(FixAction::Fixed) => summary.fixed += 1,
                Ok(FixAction::Skipped) => summary.skipped += 1,
                Err(e) => {
                    tracing::warn!("Failed to add BOM to {}: {}", path.display(), e);
                    summary.errors += 1;
                }
            }
            FixOutcome { path, result }
        })
        .collect();

    Ok((outcomes, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_detect_encoding() {
        assert_eq!(detect_encoding(b"\xEF\xBB\xBFWrite-Host"), EncodingKind::Utf8Bom);
        assert_eq!(detect_encoding(b"\xFF\xFEW\x00"), EncodingKind::Utf16Le);
        assert_eq!(detect_encoding(b"\xFE\xFF\x00W"), EncodingKind::Utf16Be);
        assert_eq!(detect_encoding("안녕".as_bytes()), EncodingKind::Utf8NoBom);
        assert_eq!(detect_encoding(b""), EncodingKind::Utf8NoBom);
        assert_eq!(detect_encoding(b"\xC3\x28"), EncodingKind::Unknown);
    }

    #[test]
    fn test_find_script_files_recursive_and_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("windows").join("setup");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("a.ps1"), "a").unwrap();
        fs::write(nested.join("B.PS1"), "b").unwrap();
        fs::write(nested.join("notes.txt"), "c").unwrap();

        let files = find_script_files(dir.path(), "ps1").unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|p| has_extension(p, "ps1")));

        // single file with a different extension is ignored
        assert!(find_script_files(&nested.join("notes.txt"), "ps1").unwrap().is_empty());
    }

    #[test]
    fn test_missing_target_is_invalid_input() {
        let dir = tempfile::tempdir().unwrap();
        let result = find_script_files(&dir.path().join("absent"), "ps1");
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_check_path_summary() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bom.ps1"), b"\xEF\xBB\xBFok").unwrap();
        fs::write(dir.path().join("plain.ps1"), "Write-Host '한글'").unwrap();
        fs::write(dir.path().join("wide.ps1"), b"\xFF\xFEa\x00").unwrap();

        let (outcomes, summary) = check_path(dir.path(), "ps1").unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(summary.utf8_bom, 1);
        assert_eq!(summary.utf8_no_bom, 1);
        assert_eq!(summary.utf16_le, 1);
        assert_eq!(summary.errors, 0);
        assert!(summary.needs_fix());
    }

    #[test]
    fn test_fix_adds_bom_once() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("run.ps1");
        fs::write(&script, "Write-Host 'héllo'").unwrap();

        assert_eq!(add_utf8_bom(&script).unwrap(), FixAction::Fixed);
        let bytes = fs::read(&script).unwrap();
        assert!(bytes.starts_with(&UTF8_BOM));
        assert_eq!(&bytes[3..], "Write-Host 'héllo'".as_bytes());

        assert_eq!(add_utf8_bom(&script).unwrap(), FixAction::Skipped);
        assert_eq!(fs::read(&script).unwrap(), bytes);
    }

    #[test]
    fn test_fix_path_counts_and_leaves_utf16_alone() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.ps1"), "a").unwrap();
        fs::write(dir.path().join("b.ps1"), b"\xEF\xBB\xBFb").unwrap();
        let wide = dir.path().join("c.ps1");
        fs::write(&wide, b"\xFF\xFEc\x00").unwrap();
        fs::write(dir.path().join("d.txt"), "d").unwrap();

        let (outcomes, summary) = fix_path(dir.path(), "ps1").unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(summary, FixSummary { fixed: 1, skipped: 1, errors: 1 });
        assert_eq!(fs::read(&wide).unwrap(), b"\xFF\xFEc\x00");
        assert_eq!(fs::read(dir.path().join("d.txt")).unwrap(), b"d");
    }
}
