use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::descriptor::MessageDescriptor;
use crate::fs::FileSystem;

/// Key the ordered descriptor sequence is exposed under for downstream
/// consumers of the same pipeline pass, whether or not a manifest file is
/// written.
pub const METADATA_KEY: &str = "react-intl";

/// Manifest location for a source file: the source's directory structure
/// mirrored under `messages_dir`, with the extension replaced by `.json`.
pub fn manifest_path(messages_dir: &Path, source_file: &Path) -> PathBuf {
    let mut path = messages_dir.to_path_buf();
    if let Some(parent) = source_file.parent() {
        path.push(parent);
    }
    let basename = source_file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.push(format!("{}.json", basename));
    path
}

/// Write one file's descriptors as a pretty-printed JSON array, overwriting
/// prior content. Nothing is written for an empty table. Returns the path
/// written, for reporting.
pub fn write_manifest<F: FileSystem>(
    fs: &F,
    messages_dir: &Path,
    source_file: &Path,
    messages: &[MessageDescriptor],
) -> Result<Option<PathBuf>> {
    if messages.is_empty() {
        return Ok(None);
    }

    let path = manifest_path(messages_dir, source_file);
    if let Some(parent) = path.parent() {
        fs.create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut content = serde_json::to_string_pretty(messages)?;
    content.push('\n');
    fs.write(&path, &content)
        .with_context(|| format!("Failed to write manifest: {}", path.display()))?;

    Ok(Some(path))
}
