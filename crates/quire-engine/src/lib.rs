// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Quire Engine — acquisition and caching of the PDFium rendering library.
//
// The library is resolved through a tier ladder (explicit override, local
// directories, system loader, primary mirror, secondary mirror) and the
// winning handle is memoized for the process lifetime. Rasterization code
// binds its own short-lived `Pdfium` instance from the cached handle, one
// per operation, since the instance itself must stay on a single thread.

pub mod config;
pub mod download;
pub mod provider;

pub use config::EngineConfig;
pub use provider::{EngineError, EngineHandle, EngineProvider, EngineSource};
