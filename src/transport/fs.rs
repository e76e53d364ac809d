use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::constants::MISSING_INPUT_DIR_MSG;
use crate::constants::artifacts::{JSON_EXTENSION, JSON_INDENT};
use crate::errors::PipelineError;

/// Regular `*.json` files directly inside `dir`, sorted by file name.
///
/// A folder that does not exist yet lists as empty.
pub fn list_json_files(dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    if !dir.try_exists()? {
        warn!(dir = %dir.display(), MISSING_INPUT_DIR_MSG);
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file() && is_json_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()).then_with(|| a.cmp(b)));
    Ok(files)
}

/// True if the path has a `.json` extension (case-insensitive).
pub fn is_json_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(JSON_EXTENSION))
        .unwrap_or(false)
}

/// Parse a whole JSON file, failing with the offending path on bad input.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PipelineError> {
    let file = fs::File::open(path)?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| PipelineError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Open `path` for writing only if nothing exists there yet.
///
/// Returns `None` when the name is already taken. Parent folders are created.
pub fn create_new_file(path: &Path) -> Result<Option<fs::File>, PipelineError> {
    ensure_parent_dir(path)?;
    match fs::File::options().write(true).create_new(true).open(path) {
        Ok(file) => Ok(Some(file)),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Write `value` as UTF-8 JSON with 4-space indentation into a new file.
///
/// Existing files are never touched; `false` means `path` was taken.
pub fn write_new_json_pretty<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<bool, PipelineError> {
    match create_new_file(path)? {
        Some(file) => {
            serialize_pretty(file, value, path)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Pretty-print `value` into an already opened `file`; `path` is only used for errors.
pub fn serialize_pretty<T: Serialize + ?Sized>(
    file: fs::File,
    value: &T,
    path: &Path,
) -> Result<(), PipelineError> {
    let mut writer = BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(JSON_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|source| PipelineError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    writer.flush()?;
    Ok(())
}

/// Best-effort file modified time.
pub fn file_mtime(path: &Path) -> Option<DateTime<Utc>> {
    let metadata = fs::metadata(path).ok()?;
    let modified = metadata.modified().ok()?;
    Some(DateTime::<Utc>::from(modified))
}

/// The `*.json` file in `dir` with the newest modification time.
///
/// Ties (and files whose mtime cannot be read) fall back to the greatest file
/// name, which for timestamp-prefixed artifacts is also the newest.
pub fn most_recent_json_file(dir: &Path) -> Result<PathBuf, PipelineError> {
    list_json_files(dir)?
        .into_iter()
        .max_by(|a, b| {
            file_mtime(a)
                .cmp(&file_mtime(b))
                .then_with(|| a.file_name().cmp(&b.file_name()))
        })
        .ok_or_else(|| {
            PipelineError::Configuration(format!("no JSON files found in '{}'", dir.display()))
        })
}

fn ensure_parent_dir(path: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
