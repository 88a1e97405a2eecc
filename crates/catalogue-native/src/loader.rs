//! Retry-once loading of a [`LibrarySpec`].
//!
//! A load goes through at most two probes:
//!
//! 1. Probe the spec's symbols and bind its aliases.
//! 2. If something was not found, load every archive in the search directory
//!    and probe again. A second miss is fatal.
//!
//! Only [`RuntimeError::NotFound`] triggers the directory load. Any other
//! runtime failure, including an archive that fails to load, is returned as-is.
//! Nothing is rolled back on failure: archives loaded and aliases bound before
//! the failure stay loaded and bound.

use crate::registry::BindingRegistry;
use crate::runtime::{NativeRuntime, RuntimeError};
use crate::spec::LibrarySpec;
use catalogue_report::{Reportable, format_failure};
use catalogue_settings::Settings;
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Error returned by [`NativeLoader::ensure_loaded`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// Symbols still missing after loading the search directory.
    #[error("Can not find {name} native classes in {}", .dir.display())]
    Missing { name: String, dir: PathBuf },

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl Reportable for LoadError {
    fn type_name(&self) -> Cow<'_, str> {
        Cow::Borrowed("LoadError")
    }

    fn message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn trace(&self) -> &[String] {
        &[]
    }
}

/// Outcome of one probe pass.
enum Probe {
    Ready,
    Missing(String),
}

/// Outcome shared by every caller that joins one load of a library.
type Gate = Arc<OnceLock<Result<(), LoadError>>>;

/// Loads native libraries on demand and binds their aliases.
///
/// Loads are serialized per library name: concurrent callers for the same
/// library wait for a single attempt and share its result. A successful load
/// is remembered; a failed one is retried by the next caller that arrives
/// after it finished.
pub struct NativeLoader<R: NativeRuntime> {
    runtime: R,
    registry: Arc<BindingRegistry<R::Handle>>,
    install_root: PathBuf,
    gates: Mutex<HashMap<String, Gate>>,
}

impl<R: NativeRuntime> NativeLoader<R> {
    /// Create a loader with a fresh registry.
    pub fn new(runtime: R) -> Self {
        Self::with_registry(runtime, Arc::new(BindingRegistry::new()))
    }

    /// Create a loader that binds into an existing registry.
    pub fn with_registry(runtime: R, registry: Arc<BindingRegistry<R::Handle>>) -> Self {
        Self {
            runtime,
            registry,
            install_root: default_install_root(),
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Set the directory bundled fallback paths are relative to.
    pub fn with_install_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.install_root = root.into();
        self
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn registry(&self) -> &Arc<BindingRegistry<R::Handle>> {
        &self.registry
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    /// Get the handle bound to an alias.
    pub fn binding(&self, alias: &str) -> Option<R::Handle> {
        self.registry.get(alias)
    }

    /// Make sure `spec`'s library is loaded and its aliases are bound.
    pub fn ensure_loaded(&self, spec: &LibrarySpec, settings: &Settings) -> Result<(), LoadError> {
        let gate = self.gate(&spec.name);
        gate.get_or_init(|| self.attempt(spec, settings, &gate)).clone()
    }

    /// Directory searched for `spec`'s archives.
    ///
    /// The settings value for `spec.settings_key` if set and non-empty,
    /// otherwise the bundled directory under the install root.
    pub fn search_dir(&self, spec: &LibrarySpec, settings: &Settings) -> PathBuf {
        match settings.get_str(&spec.settings_key) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => self.install_root.join(&spec.bundled_fallback_dir),
        }
    }

    /// Archives directly inside `dir`, sorted by path.
    ///
    /// An unreadable directory has no archives.
    pub fn archives_in(&self, dir: &Path) -> Vec<PathBuf> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("cannot read archive directory {}: {e}", dir.display());
                return Vec::new();
            }
        };

        let ext = self.runtime.archive_extension();
        let mut archives: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|e| e == ext))
            .collect();
        archives.sort();
        archives
    }

    fn gate(&self, name: &str) -> Gate {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(gates.entry(name.to_string()).or_default())
    }

    /// Forget a failed attempt so the next caller starts over.
    fn release(&self, name: &str, gate: &Gate) {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        if gates.get(name).is_some_and(|current| Arc::ptr_eq(current, gate)) {
            gates.remove(name);
        }
    }

    /// Run one load for the callers sharing `gate`.
    ///
    /// A failed attempt leaves the gate map before its outcome is published,
    /// so only callers already waiting on `gate` see the failure.
    fn attempt(
        &self,
        spec: &LibrarySpec,
        settings: &Settings,
        gate: &Gate,
    ) -> Result<(), LoadError> {
        let outcome = self.load(spec, settings);
        if outcome.is_err() {
            self.release(&spec.name, gate);
        }
        outcome
    }

    fn load(&self, spec: &LibrarySpec, settings: &Settings) -> Result<(), LoadError> {
        let Probe::Missing(symbol) = self.probe_and_bind(spec)? else {
            log::debug!("{} already available", spec.name);
            return Ok(());
        };

        let dir = self.search_dir(spec, settings);
        log::debug!(
            "{}: {symbol} not found, loading archives from {}",
            spec.name,
            dir.display()
        );
        self.load_archives(spec, &dir)?;

        match self.probe_and_bind(spec)? {
            Probe::Ready => Ok(()),
            Probe::Missing(symbol) => {
                log::debug!("{}: {symbol} still not found", spec.name);
                let err = LoadError::Missing {
                    name: spec.name.clone(),
                    dir,
                };
                log::error!("{}", format_failure(&err).trim_end());
                Err(err)
            }
        }
    }

    /// Resolve every probe symbol, then bind every alias not yet bound.
    fn probe_and_bind(&self, spec: &LibrarySpec) -> Result<Probe, RuntimeError> {
        for symbol in &spec.probe_symbols {
            match self.runtime.resolve(symbol) {
                Ok(_) => {}
                Err(RuntimeError::NotFound { .. }) => return Ok(Probe::Missing(symbol.clone())),
                Err(e) => return Err(e),
            }
        }

        for (alias, path) in &spec.bindings {
            if self.registry.contains(alias) {
                continue;
            }
            match self.runtime.resolve(path) {
                Ok(handle) => {
                    if self.registry.bind(alias, handle) {
                        log::debug!("bound {alias} to {path}");
                    }
                }
                Err(RuntimeError::NotFound { .. }) => return Ok(Probe::Missing(path.clone())),
                Err(e) => return Err(e),
            }
        }

        Ok(Probe::Ready)
    }

    fn load_archives(&self, spec: &LibrarySpec, dir: &Path) -> Result<(), RuntimeError> {
        let archives = self.archives_in(dir);
        if archives.is_empty() {
            log::warn!(
                "{}: no .{} archives in {}",
                spec.name,
                self.runtime.archive_extension(),
                dir.display()
            );
            return Ok(());
        }

        for archive in &archives {
            log::debug!("loading {}", archive.display());
            self.runtime.load_archive(archive)?;
        }
        log::info!(
            "{}: loaded {} archives from {}",
            spec.name,
            archives.len(),
            dir.display()
        );
        Ok(())
    }
}

/// Parent of the directory holding the running executable.
fn default_install_root() -> PathBuf {
    let root = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent()?.parent().map(Path::to_path_buf));
    root.unwrap_or_else(|| {
        log::warn!("cannot locate install root, using current directory");
        PathBuf::from(".")
    })
}
