//! Filesystem helpers

use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Write `data` to `path` so that readers only ever see the old or the new
/// content: the bytes go to a temporary file in the same directory, which is
/// synced and then renamed over the target.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
