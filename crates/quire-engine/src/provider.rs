// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tiered engine acquisition: local search, mirror download, bind probing.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use pdfium_render::prelude::*;
use quire_core::QuireError;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::EngineConfig;
use crate::download;

/// Environment variable naming an engine library file or directory.
/// Takes precedence over every other tier.
pub const ENGINE_PATH_ENV: &str = "QUIRE_PDFIUM";

/// Subdirectories a bundle may place the library under, tried in order.
const BUNDLE_LAYOUTS: &[&str] = &["", "lib", "bin"];

// -- Errors ---------------------------------------------------------------

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("download from {url} failed: {detail}")]
    Download { url: String, detail: String },

    #[error("bundle digest mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("bundle extraction failed: {0}")]
    Extract(String),

    #[error("engine acquisition timed out after {0:?}")]
    Timeout(Duration),

    #[error("engine bind failed: {0}")]
    Bind(String),

    #[error(
        "all engine sources failed after {attempts} attempt(s): {detail}; \
         check network connectivity and retry"
    )]
    Exhausted { attempts: u32, detail: String },
}

impl From<EngineError> for QuireError {
    fn from(err: EngineError) -> Self {
        QuireError::EngineLoad(err.to_string())
    }
}

/// Wall-clock ceiling shared by every tier of one acquisition.
pub(crate) struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    pub(crate) fn new(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    pub(crate) fn check(&self) -> Result<(), EngineError> {
        if Instant::now() >= self.at {
            return Err(EngineError::Timeout(self.budget));
        }
        Ok(())
    }
}

// -- Handles --------------------------------------------------------------

/// Which tier produced a usable library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineSource {
    Local,
    PrimaryMirror,
    SecondaryMirror,
}

impl fmt::Display for EngineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineSource::Local => write!(f, "local library"),
            EngineSource::PrimaryMirror => write!(f, "primary mirror"),
            EngineSource::SecondaryMirror => write!(f, "secondary mirror"),
        }
    }
}

/// A resolved engine location. Holds the path only; bindings are not
/// thread-safe, so each operation binds its own instance via [`bind`].
///
/// [`bind`]: EngineHandle::bind
#[derive(Debug, Clone)]
pub struct EngineHandle {
    library_path: Option<PathBuf>,
    source: EngineSource,
}

impl EngineHandle {
    /// Library file the handle binds to. `None` means the system loader
    /// resolves it by name.
    pub fn library_path(&self) -> Option<&Path> {
        self.library_path.as_deref()
    }

    pub fn source(&self) -> EngineSource {
        self.source
    }

    /// Bind a fresh engine instance for one operation.
    pub fn bind(&self) -> Result<Pdfium, EngineError> {
        let bindings = match &self.library_path {
            Some(path) => Pdfium::bind_to_library(path),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|err| EngineError::Bind(err.to_string()))?;
        Ok(Pdfium::new(bindings))
    }
}

// -- Provider -------------------------------------------------------------

#[derive(Debug)]
enum AcquireState {
    Untried,
    Ready(EngineHandle),
}

/// Process-wide engine resolver.
///
/// The first caller walks the tier ladder while holding the state lock, so
/// concurrent callers block and then observe the cached outcome. Only
/// success is memoized; a failed walk leaves the provider untried and the
/// next call starts over.
pub struct EngineProvider {
    config: EngineConfig,
    state: Mutex<AcquireState>,
}

impl EngineProvider {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            state: Mutex::new(AcquireState::Untried),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether a previous acquisition already resolved a library.
    pub fn is_ready(&self) -> bool {
        let state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        matches!(*state, AcquireState::Ready(_))
    }

    /// Resolve an engine library, walking local search, the primary
    /// mirror, then the secondary mirror until one yields a bindable
    /// library.
    #[instrument(skip_all)]
    pub fn acquire(&self) -> Result<EngineHandle, EngineError> {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let AcquireState::Ready(handle) = &*state {
            debug!(source = %handle.source(), "engine already resolved");
            return Ok(handle.clone());
        }

        let deadline = Deadline::new(self.config.acquire_timeout);
        let handle = self.walk_tiers(&deadline)?;
        info!(
            source = %handle.source(),
            path = ?handle.library_path(),
            "engine resolved"
        );
        *state = AcquireState::Ready(handle.clone());
        Ok(handle)
    }

    fn walk_tiers(&self, deadline: &Deadline) -> Result<EngineHandle, EngineError> {
        let mut failures: Vec<String> = Vec::new();

        if self.config.search_local {
            for candidate in self.local_candidates() {
                if let Some(path) = try_bind_at(&candidate) {
                    return Ok(EngineHandle {
                        library_path: Some(path),
                        source: EngineSource::Local,
                    });
                }
            }
            if Pdfium::bind_to_system_library().is_ok() {
                return Ok(EngineHandle {
                    library_path: None,
                    source: EngineSource::Local,
                });
            }
            failures.push("no local or system library".to_owned());
        } else {
            failures.push("local search disabled".to_owned());
        }

        let mirrors = [
            (&self.config.primary_mirror, EngineSource::PrimaryMirror),
            (&self.config.secondary_mirror, EngineSource::SecondaryMirror),
        ];
        for (mirror, source) in mirrors {
            deadline.check()?;
            match self.fetch_and_probe(mirror, source, deadline) {
                Ok(handle) => return Ok(handle),
                Err(err @ EngineError::Timeout(_)) => return Err(err),
                Err(err) => {
                    warn!(%source, error = %err, "engine tier failed");
                    failures.push(format!("{}: {}", source, err));
                }
            }
        }

        Err(EngineError::Exhausted {
            attempts: failures.len() as u32,
            detail: failures.join("; "),
        })
    }

    /// Places a library may already exist, in precedence order.
    fn local_candidates(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Ok(path) = std::env::var(ENGINE_PATH_ENV) {
            candidates.push(PathBuf::from(path));
        }
        if let Some(path) = &self.config.override_path {
            candidates.push(path.clone());
        }
        if let Ok(exe) = std::env::current_exe()
            && let Some(dir) = exe.parent()
        {
            candidates.push(dir.to_path_buf());
            candidates.push(dir.join("lib"));
        }
        candidates.push(PathBuf::from("."));
        let bundle = self.config.bundle_dir();
        for layout in BUNDLE_LAYOUTS {
            if layout.is_empty() {
                candidates.push(bundle.clone());
            } else {
                candidates.push(bundle.join(layout));
            }
        }
        candidates
    }

    fn fetch_and_probe(
        &self,
        mirror: &str,
        source: EngineSource,
        deadline: &Deadline,
    ) -> Result<EngineHandle, EngineError> {
        let url = self.config.bundle_url(mirror);
        let archive = download::fetch_bundle(&url, self.config.download_timeout, deadline)?;
        download::verify_archive(&archive, self.config.archive_sha256.as_deref())?;

        let bundle_dir = self.config.bundle_dir();
        download::extract_bundle(&archive, &bundle_dir)?;

        // The loader can lag extraction on some filesystems.
        std::thread::sleep(self.config.settle_delay);
        self.probe_bundle(&bundle_dir, source, deadline)
    }

    fn probe_bundle(
        &self,
        dir: &Path,
        source: EngineSource,
        deadline: &Deadline,
    ) -> Result<EngineHandle, EngineError> {
        let attempts = self.config.probe_attempts.max(1);
        for attempt in 1..=attempts {
            deadline.check()?;
            for layout in BUNDLE_LAYOUTS {
                let candidate = if layout.is_empty() {
                    dir.to_path_buf()
                } else {
                    dir.join(layout)
                };
                if let Some(path) = try_bind_at(&candidate) {
                    debug!(attempt, path = %path.display(), "bundle probe succeeded");
                    return Ok(EngineHandle {
                        library_path: Some(path),
                        source,
                    });
                }
            }
            if attempt < attempts {
                std::thread::sleep(self.config.probe_delay);
            }
        }
        Err(EngineError::Extract(format!(
            "no library found under {} after {} probe attempt(s)",
            dir.display(),
            attempts
        )))
    }
}

/// Try to bind at a candidate location. A file is used as-is; a directory
/// gets the platform library name appended.
fn try_bind_at(candidate: &Path) -> Option<PathBuf> {
    let library = if candidate.is_file() {
        candidate.to_path_buf()
    } else {
        PathBuf::from(Pdfium::pdfium_platform_library_name_at_path(candidate))
    };
    match Pdfium::bind_to_library(&library) {
        Ok(_) => Some(library),
        Err(_) => None,
    }
}
