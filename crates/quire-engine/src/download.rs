// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bundle download, digest verification, and archive extraction.

use std::io::{Cursor, Read};
use std::path::Path;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tracing::{info, warn};
use zip::ZipArchive;

use crate::provider::{Deadline, EngineError};

const CHUNK_SIZE: usize = 65536;

/// Fetch a bundle archive into memory, honouring the acquisition deadline
/// between chunks so a stalled mirror cannot eat the whole budget.
pub(crate) fn fetch_bundle(
    url: &str,
    timeout: Duration,
    deadline: &Deadline,
) -> Result<Vec<u8>, EngineError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|err| EngineError::Download {
            url: url.to_owned(),
            detail: format!("client setup failed: {}", err),
        })?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|err| EngineError::Download {
            url: url.to_owned(),
            detail: err.to_string(),
        })?;

    if !response.status().is_success() {
        return Err(EngineError::Download {
            url: url.to_owned(),
            detail: format!("status {}", response.status()),
        });
    }

    let mut archive = match response.content_length() {
        Some(len) => Vec::with_capacity(len as usize),
        None => Vec::new(),
    };
    let mut chunk = [0u8; CHUNK_SIZE];
    loop {
        deadline.check()?;
        let read = response
            .read(&mut chunk)
            .map_err(|err| EngineError::Download {
                url: url.to_owned(),
                detail: format!("read failed: {}", err),
            })?;
        if read == 0 {
            break;
        }
        archive.extend_from_slice(&chunk[..read]);
    }

    info!(url, bytes = archive.len(), "fetched engine bundle");
    Ok(archive)
}

/// Check the archive digest against a pinned value. The digest is logged
/// either way so an unpinned run still leaves an audit trail.
pub(crate) fn verify_archive(
    archive: &[u8],
    expected: Option<&str>,
) -> Result<(), EngineError> {
    let actual = digest_hex(archive);
    info!(sha256 = %actual, "engine bundle digest");
    if let Some(expected) = expected
        && !actual.eq_ignore_ascii_case(expected)
    {
        return Err(EngineError::ChecksumMismatch {
            expected: expected.to_owned(),
            actual,
        });
    }
    Ok(())
}

pub(crate) fn digest_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Unpack a bundle archive under `dest`, skipping entries that would
/// escape it.
pub(crate) fn extract_bundle(archive: &[u8], dest: &Path) -> Result<(), EngineError> {
    let mut zip = ZipArchive::new(Cursor::new(archive))
        .map_err(|err| EngineError::Extract(format!("archive open failed: {}", err)))?;

    std::fs::create_dir_all(dest)
        .map_err(|err| EngineError::Extract(format!("{}: {}", dest.display(), err)))?;

    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|err| EngineError::Extract(format!("entry {}: {}", index, err)))?;
        let Some(relative) = entry.enclosed_name() else {
            warn!(name = entry.name(), "skipping unsafe archive entry");
            continue;
        };
        let target = dest.join(relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&target)
                .map_err(|err| EngineError::Extract(format!("{}: {}", target.display(), err)))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| EngineError::Extract(format!("{}: {}", parent.display(), err)))?;
        }
        let mut file = std::fs::File::create(&target)
            .map_err(|err| EngineError::Extract(format!("{}: {}", target.display(), err)))?;
        std::io::copy(&mut entry, &mut file)
            .map_err(|err| EngineError::Extract(format!("{}: {}", target.display(), err)))?;
    }

    Ok(())
}
