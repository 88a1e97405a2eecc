//! The boundary between the loader and the host's dynamic linker.
//!
//! [`NativeRuntime`] is the only place external code enters the process.
//! [`DylibRuntime`] implements it over shared libraries with `libloading`.
//!
//! # Symbol naming
//!
//! Libraries export one C symbol per dotted path, with `.` replaced by `_`:
//! the namespace `org.marc4j` is the marker symbol `org_marc4j`, and the reader
//! `org.marc4j.MarcXmlReader` is `org_marc4j_MarcXmlReader`.

use libloading::Library;
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// Failure reported by a [`NativeRuntime`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    /// The path does not resolve in anything loaded so far.
    #[error("native symbol not found: {symbol}")]
    NotFound { symbol: String },

    /// An archive exists but could not be loaded.
    #[error("failed to load native archive {}: {message}", .path.display())]
    Archive { path: PathBuf, message: String },

    #[error("native runtime error: {0}")]
    Other(String),
}

/// Symbol resolution and archive loading.
pub trait NativeRuntime: Send + Sync {
    /// A resolved symbol.
    type Handle: Clone + Send + Sync;

    /// File extension of loadable archives, without the dot.
    fn archive_extension(&self) -> &str;

    /// Resolve a dotted path. Absence must be reported as [`RuntimeError::NotFound`].
    fn resolve(&self, path: &str) -> Result<Self::Handle, RuntimeError>;

    /// Load an archive into the process.
    fn load_archive(&self, path: &Path) -> Result<(), RuntimeError>;
}

/// A symbol resolved by [`DylibRuntime`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeSymbol {
    path: String,
    address: usize,
}

impl NativeSymbol {
    /// The dotted path this symbol was resolved from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Address of the exported symbol.
    ///
    /// Valid for the life of the process; archives are never unloaded.
    pub fn as_ptr(&self) -> *const c_void {
        self.address as *const c_void
    }
}

/// [`NativeRuntime`] over platform shared libraries.
///
/// Resolution searches the running process image first, then every loaded
/// archive in load order.
pub struct DylibRuntime {
    /// The executable and the libraries it was linked against.
    process: Option<Library>,
    /// Archives loaded through [`NativeRuntime::load_archive`]. Never dropped.
    libraries: RwLock<Vec<Library>>,
}

impl DylibRuntime {
    pub fn new() -> Self {
        Self {
            process: process_image(),
            libraries: RwLock::new(Vec::new()),
        }
    }

    /// Number of archives loaded so far.
    pub fn loaded_archives(&self) -> usize {
        self.libraries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for DylibRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeRuntime for DylibRuntime {
    type Handle = NativeSymbol;

    fn archive_extension(&self) -> &str {
        archive_extension()
    }

    fn resolve(&self, path: &str) -> Result<NativeSymbol, RuntimeError> {
        let symbol = symbol_name(path);
        let libraries = self
            .libraries
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        for library in self.process.iter().chain(libraries.iter()) {
            // SAFETY: the symbol is looked up as an opaque address and never
            // dereferenced or called here.
            let found = unsafe { library.get::<*const c_void>(symbol.as_bytes()) };
            if let Ok(found) = found {
                return Ok(NativeSymbol {
                    path: path.to_string(),
                    address: *found as usize,
                });
            }
        }

        Err(RuntimeError::NotFound {
            symbol: path.to_string(),
        })
    }

    fn load_archive(&self, path: &Path) -> Result<(), RuntimeError> {
        // SAFETY: loading a shared library runs its initializers. Archives only
        // come from the configured or bundled directory, and are kept loaded
        // for the rest of the process so resolved addresses stay valid.
        let library = unsafe { Library::new(path) }.map_err(|e| RuntimeError::Archive {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        self.libraries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(library);
        Ok(())
    }
}

/// Get the exported symbol name for a dotted path.
pub fn symbol_name(path: &str) -> String {
    path.replace('.', "_")
}

/// Get the shared library extension for the current platform.
fn archive_extension() -> &'static str {
    if cfg!(target_os = "macos") {
        "dylib"
    } else if cfg!(target_os = "windows") {
        "dll"
    } else {
        "so"
    }
}

#[cfg(unix)]
fn process_image() -> Option<Library> {
    Some(libloading::os::unix::Library::this().into())
}

#[cfg(windows)]
fn process_image() -> Option<Library> {
    match libloading::os::windows::Library::this() {
        Ok(library) => Some(library.into()),
        Err(e) => {
            log::warn!("cannot open process image for symbol lookup: {e}");
            None
        }
    }
}

#[cfg(not(any(unix, windows)))]
fn process_image() -> Option<Library> {
    None
}
