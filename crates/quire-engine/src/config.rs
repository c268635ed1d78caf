// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine acquisition configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Release tag the default mirrors serve bundles from.
pub const BUNDLE_RELEASE: &str = "v6721";

/// Where the engine library is looked for and fetched from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Explicit library file or directory, tried before anything else.
    /// The `QUIRE_PDFIUM` environment variable takes precedence over it.
    pub override_path: Option<PathBuf>,
    /// Search local directories and the system loader before the mirrors.
    /// Disable to force a pinned bundle (or to fail hermetically).
    pub search_local: bool,
    /// Base URL of the primary bundle mirror.
    pub primary_mirror: String,
    /// Base URL of the secondary bundle mirror.
    pub secondary_mirror: String,
    /// Expected SHA-256 of the downloaded bundle, verified when set.
    pub archive_sha256: Option<String>,
    /// Directory downloaded bundles are extracted into.
    pub cache_dir: PathBuf,
    /// Pause between extraction and the first bind attempt. The dynamic
    /// loader can lag a fresh extraction on some filesystems.
    pub settle_delay: Duration,
    /// Bind attempts per bundle layout after a download.
    pub probe_attempts: u32,
    /// Pause between bind attempts.
    pub probe_delay: Duration,
    /// Ceiling on one whole acquisition, all tiers included.
    pub acquire_timeout: Duration,
    /// Ceiling on a single mirror request.
    pub download_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            override_path: None,
            search_local: true,
            primary_mirror: format!(
                "https://github.com/hyperpolymath/quire-engine-bundles/releases/download/{BUNDLE_RELEASE}"
            ),
            secondary_mirror: format!(
                "https://mirror.ghproxy.com/https://github.com/hyperpolymath/quire-engine-bundles/releases/download/{BUNDLE_RELEASE}"
            ),
            archive_sha256: None,
            cache_dir: default_cache_dir(),
            settle_delay: Duration::from_millis(200),
            probe_attempts: 5,
            probe_delay: Duration::from_millis(200),
            acquire_timeout: Duration::from_secs(120),
            download_timeout: Duration::from_secs(60),
        }
    }
}

impl EngineConfig {
    /// Full URL of this platform's bundle on the given mirror.
    pub fn bundle_url(&self, mirror_base: &str) -> String {
        format!(
            "{}/pdfium-{}.zip",
            mirror_base.trim_end_matches('/'),
            platform_target()
        )
    }

    /// Directory the current release's bundle is extracted into.
    pub fn bundle_dir(&self) -> PathBuf {
        self.cache_dir
            .join(format!("pdfium-{}-{}", BUNDLE_RELEASE, platform_target()))
    }
}

/// Bundle name component for the running platform.
///
/// Unknown platforms fall through to `{os}-{arch}`; the resulting URL will
/// miss and acquisition fails over to the remaining tiers.
pub fn platform_target() -> String {
    match (std::env::consts::OS, std::env::consts::ARCH) {
        ("linux", "x86_64") => "linux-x64".to_owned(),
        ("linux", "aarch64") => "linux-arm64".to_owned(),
        ("macos", "x86_64") => "mac-x64".to_owned(),
        ("macos", "aarch64") => "mac-arm64".to_owned(),
        ("windows", "x86_64") => "win-x64".to_owned(),
        ("windows", "aarch64") => "win-arm64".to_owned(),
        (os, arch) => format!("{os}-{arch}"),
    }
}

fn default_cache_dir() -> PathBuf {
    // XDG cache dir, then home, then the system temp dir as a last resort.
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        return PathBuf::from(xdg).join("quire");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".cache").join("quire");
    }
    std::env::temp_dir().join("quire")
}
