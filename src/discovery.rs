use crate::error::DiscoveryError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const SUPPORTED_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "tif", "tiff", "bmp", "webp"];

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

/// Image files under `root`.
///
/// A regular file is returned as-is regardless of its extension. A directory
/// is walked recursively. Order follows `read_dir` and differs across
/// platforms and filesystems; sort the result if a stable order matters.
pub fn discover(root: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let meta = std::fs::metadata(root).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            DiscoveryError::NotFound(root.to_path_buf())
        } else {
            DiscoveryError::Io {
                path: root.to_path_buf(),
                source,
            }
        }
    })?;

    if meta.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut out = Vec::new();
    walk(root, &mut out).map_err(|source| DiscoveryError::Io {
        path: root.to_path_buf(),
        source,
    })?;
    debug!("discovered {} images under {}", out.len(), root.display());
    Ok(out)
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let ft = entry.file_type()?;
        if ft.is_dir() {
            // Only the root must be readable; skip broken subtrees.
            if let Err(err) = walk(&path, out) {
                warn!("skipping unreadable directory {}: {err}", path.display());
            }
        } else if (ft.is_file() || (ft.is_symlink() && path.is_file())) && is_supported_image(&path) {
            out.push(path);
        }
    }
    Ok(())
}
