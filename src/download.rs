use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

pub const SUMMARY_TXT: &str = "meeting-summary.txt";
pub const REPORT_PDF: &str = "meeting_report.pdf";

/// Write `contents` into `dir` under `file_name`, picking `name (1).ext`,
/// `name (2).ext`, ... when the name is taken. Returns the written path.
pub fn save_download(dir: &Path, file_name: &str, contents: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = free_path(dir, file_name);
    fs::write(&path, contents)?;
    Ok(path)
}

fn free_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (file_name, None),
    };
    (1..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{stem} ({n}).{ext}")),
            None => dir.join(format!("{stem} ({n})")),
        })
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_download_avoids_overwrite() {
        let dir = tempdir().unwrap();

        let first = save_download(dir.path(), SUMMARY_TXT, b"one").unwrap();
        let second = save_download(dir.path(), SUMMARY_TXT, b"two").unwrap();
        let third = save_download(dir.path(), SUMMARY_TXT, b"three").unwrap();

        assert_eq!(first.file_name().unwrap(), "meeting-summary.txt");
        assert_eq!(second.file_name().unwrap(), "meeting-summary (1).txt");
        assert_eq!(third.file_name().unwrap(), "meeting-summary (2).txt");
        assert_eq!(fs::read(&first).unwrap(), b"one");
        assert_eq!(fs::read(&third).unwrap(), b"three");
    }

    #[test]
    fn test_save_download_creates_dir() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("Downloads");
        let path = save_download(&target, REPORT_PDF, b"%PDF-1.4").unwrap();
        assert_eq!(path, target.join("meeting_report.pdf"));
    }
}
