//! Thin wrapper around the `zip` crate for binary-cache artifact archives
//! (spec §4.2 tier 2/3: prebuilt frameworks travel as zip archives).

use crate::core::error::DrydockError;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Extracts `archive_path` into `dest_dir`, creating it if necessary.
pub fn unzip(archive_path: &Path, dest_dir: &Path) -> Result<(), DrydockError> {
    let file = File::open(archive_path).map_err(|e| DrydockError::RetrievalReadFailed {
        path: archive_path.display().to_string(),
        reason: e.to_string(),
    })?;
    extract_reader(file, dest_dir)
}

fn extract_reader<R: Read + Seek>(reader: R, dest_dir: &Path) -> Result<(), DrydockError> {
    let mut archive = ZipArchive::new(reader).map_err(|e| DrydockError::RetrievalReadFailed {
        path: dest_dir.display().to_string(),
        reason: e.to_string(),
    })?;

    std::fs::create_dir_all(dest_dir).map_err(|e| DrydockError::RetrievalWriteFailed {
        path: dest_dir.display().to_string(),
        reason: e.to_string(),
    })?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| DrydockError::RetrievalReadFailed {
            path: dest_dir.display().to_string(),
            reason: e.to_string(),
        })?;
        let Some(relative) = entry.enclosed_name() else {
            continue;
        };
        let out_path = dest_dir.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|e| DrydockError::RetrievalWriteFailed {
                path: out_path.display().to_string(),
                reason: e.to_string(),
            })?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DrydockError::RetrievalWriteFailed {
                path: parent.display().to_string(),
                reason: e.to_string(),
            })?;
        }
        let mut out_file = File::create(&out_path).map_err(|e| DrydockError::RetrievalWriteFailed {
            path: out_path.display().to_string(),
            reason: e.to_string(),
        })?;
        std::io::copy(&mut entry, &mut out_file).map_err(|e| DrydockError::RetrievalWriteFailed {
            path: out_path.display().to_string(),
            reason: e.to_string(),
        })?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode)).ok();
        }
    }
    Ok(())
}

/// Archives `src_dir`'s contents (relative to `src_dir`) into `archive_path`.
pub fn zip_dir(src_dir: &Path, archive_path: &Path) -> Result<(), DrydockError> {
    let file = File::create(archive_path).map_err(|e| DrydockError::RetrievalWriteFailed {
        path: archive_path.display().to_string(),
        reason: e.to_string(),
    })?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for entry in walkdir::WalkDir::new(src_dir).into_iter().filter_map(Result::ok) {
        let path = entry.path();
        let relative = path.strip_prefix(src_dir).unwrap_or(path);
        if relative.as_os_str().is_empty() {
            continue;
        }
        let name = relative.to_string_lossy().replace('\\', "/");

        if path.is_dir() {
            writer.add_directory(format!("{name}/"), options).map_err(|e| DrydockError::RetrievalWriteFailed {
                path: name.clone(),
                reason: e.to_string(),
            })?;
        } else if path.is_file() {
            writer.start_file(name.clone(), options).map_err(|e| DrydockError::RetrievalWriteFailed {
                path: name.clone(),
                reason: e.to_string(),
            })?;
            let mut f = File::open(path).map_err(|e| DrydockError::RetrievalReadFailed {
                path: name.clone(),
                reason: e.to_string(),
            })?;
            std::io::copy(&mut f, &mut writer).map_err(|e| DrydockError::RetrievalWriteFailed {
                path: name,
                reason: e.to_string(),
            })?;
        }
    }
    writer.finish().map_err(|e| DrydockError::RetrievalWriteFailed {
        path: archive_path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}
