#![forbid(unsafe_code)]

//! Artifact sources
//!
//! Three ways to produce the artifact stream the analyzer consumes: an
//! explicit file list, a unified diff, and a recursive directory walk.
//! Artifacts are UTF-8 text; anything else is skipped with a warning before
//! it reaches the analyzer.

use crate::error::GavelError;
use crate::types::Artifact;
use ignore::WalkBuilder;
use std::path::Path;
use tracing::warn;

/// Read an explicit list of paths as file artifacts
///
/// Invalid UTF-8 content is skipped with a warning; an unreadable path is
/// fatal to the whole operation.
///
/// # Errors
///
/// Returns `GavelError::Io` if any listed path cannot be read.
pub fn artifacts_from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Artifact>, GavelError> {
    let mut artifacts = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        match String::from_utf8(bytes) {
            Ok(content) => {
                artifacts.push(Artifact::file(path.display().to_string(), content));
            }
            Err(_) => {
                warn!(path = %path.display(), "skipping artifact with invalid UTF-8");
            }
        }
    }
    Ok(artifacts)
}

/// Split a unified diff into one artifact per file block
///
/// The path comes from the `+++ b/<path>` header with the `b/` prefix
/// stripped; blocks targeting `/dev/null` (deletions) are skipped. The
/// artifact content is the block text itself, so line numbers on diff
/// artifacts are relative to the block.
pub fn artifacts_from_diff(diff: &str) -> Vec<Artifact> {
    let mut artifacts = Vec::new();
    let mut current_path: Option<String> = None;
    let mut block: Vec<&str> = Vec::new();

    let mut flush = |path: &mut Option<String>, block: &mut Vec<&str>| {
        if let Some(path) = path.take() {
            artifacts.push(Artifact::diff(path, block.join("\n")));
        }
        block.clear();
    };

    for line in diff.lines() {
        if let Some(target) = line.strip_prefix("+++ ") {
            flush(&mut current_path, &mut block);
            // Drop a trailing timestamp ("path\t2026-01-01 ...") if present
            let target = target.split('\t').next().unwrap_or(target).trim();
            current_path = if target == "/dev/null" {
                None
            } else {
                Some(target.strip_prefix("b/").unwrap_or(target).to_string())
            };
            continue;
        }
        if line.starts_with("diff --git") || line.starts_with("--- ") {
            flush(&mut current_path, &mut block);
            continue;
        }
        if current_path.is_some() {
            block.push(line);
        }
    }
    flush(&mut current_path, &mut block);
    artifacts
}

/// Recursively read all files under a directory
///
/// Hidden directories (name starting with `.`) are skipped, except the
/// starting directory itself. Unreadable or non-UTF-8 files are skipped
/// with a warning.
///
/// # Errors
///
/// Returns `GavelError::Io` if the root itself cannot be walked.
pub fn artifacts_from_dir(root: &Path) -> Result<Vec<Artifact>, GavelError> {
    if !root.is_dir() {
        return Err(GavelError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("not a directory: {}", root.display()),
        )));
    }

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            let hidden = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with('.'));
            let is_dir = entry.file_type().is_some_and(|file_type| file_type.is_dir());
            !(hidden && is_dir)
        })
        .build();

    let mut paths = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "skipping unwalkable entry");
                continue;
            }
        };
        if entry.file_type().is_some_and(|file_type| file_type.is_file()) {
            paths.push(entry.into_path());
        }
    }
    paths.sort();

    let mut artifacts = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping unreadable file");
                continue;
            }
        };
        match String::from_utf8(bytes) {
            Ok(content) => artifacts.push(Artifact::file(path.display().to_string(), content)),
            Err(_) => warn!(path = %path.display(), "skipping artifact with invalid UTF-8"),
        }
    }
    Ok(artifacts)
}
