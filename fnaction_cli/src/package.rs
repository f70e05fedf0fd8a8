// SPDX-License-Identifier: MIT

use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use crate::error::{ActionError, ActionResult};

/// Recursively zips `code_dir` at paths relative to its root, plus the
/// optional shared folder under a `common/` prefix, into an in-memory buffer.
/// Pure filesystem-to-bytes transform; the walk is sorted so repeated runs
/// produce the same archive.
pub fn package_folder(code_dir: &Path, common_dir: Option<&Path>) -> ActionResult<Vec<u8>> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    add_tree(&mut zip, code_dir, "")?;
    if let Some(common_dir) = common_dir {
        add_tree(&mut zip, common_dir, "common/")?;
    }
    let cursor = zip
        .finish()
        .map_err(|e| ActionError::config(format!("failed to finalize code archive: {}", e)))?;
    Ok(cursor.into_inner())
}

fn add_tree<W: Write + Seek>(zip: &mut zip::ZipWriter<W>, root: &Path, prefix: &str) -> ActionResult<()> {
    let options = zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| ActionError::config(format!("cannot walk '{}': {}", root.display(), e)))?;
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| ActionError::config(format!("cannot relativize '{}': {}", entry.path().display(), e)))?;
        if relative.as_os_str().is_empty() {
            continue;
        }
        let name = format!(
            "{}{}",
            prefix,
            relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/")
        );
        if entry.file_type().is_dir() {
            zip.add_directory(format!("{}/", name), options)
                .map_err(|e| ActionError::config(format!("cannot add directory '{}' to archive: {}", name, e)))?;
        } else {
            let mut contents = Vec::new();
            std::fs::File::open(entry.path())
                .and_then(|mut f| f.read_to_end(&mut contents))
                .map_err(|e| ActionError::config(format!("cannot read '{}': {}", entry.path().display(), e)))?;
            zip.start_file(name.as_str(), options)
                .map_err(|e| ActionError::config(format!("cannot add '{}' to archive: {}", name, e)))?;
            zip.write_all(&contents)
                .map_err(|e| ActionError::config(format!("cannot write '{}' to archive: {}", name, e)))?;
        }
    }
    Ok(())
}
