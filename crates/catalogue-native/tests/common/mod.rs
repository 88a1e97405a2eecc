//! In-memory [`NativeRuntime`] for driving the loader without a dynamic linker.
//!
//! Archives are `.jar` files on disk whose contents are ignored; the symbols an
//! archive provides are registered up front by file name.

#![allow(dead_code)]

use catalogue_native::{NativeRuntime, RuntimeError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
pub struct FakeRuntime {
    resolvable: Mutex<HashSet<String>>,
    archives: HashMap<String, Vec<String>>,
    broken: HashSet<String>,
    failing: HashSet<String>,
    load_delay: Duration,
    loads: Mutex<Vec<PathBuf>>,
    resolves: Mutex<Vec<String>>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Symbols resolvable before any archive is loaded.
    pub fn with_symbols(self, symbols: &[&str]) -> Self {
        self.resolvable
            .lock()
            .unwrap()
            .extend(symbols.iter().map(|s| s.to_string()));
        self
    }

    /// An archive file name and the symbols loading it provides.
    pub fn archive(mut self, file_name: &str, symbols: &[&str]) -> Self {
        self.archives.insert(
            file_name.to_string(),
            symbols.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    /// An archive that fails to load.
    pub fn broken_archive(mut self, file_name: &str) -> Self {
        self.broken.insert(file_name.to_string());
        self
    }

    /// A path whose resolution fails with something other than "not found".
    pub fn failing(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    pub fn slow_loads(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    pub fn loads(&self) -> Vec<PathBuf> {
        self.loads.lock().unwrap().clone()
    }

    pub fn resolves(&self) -> Vec<String> {
        self.resolves.lock().unwrap().clone()
    }

    pub fn resolve_count(&self, path: &str) -> usize {
        self.resolves.lock().unwrap().iter().filter(|p| *p == path).count()
    }
}

impl NativeRuntime for FakeRuntime {
    type Handle = String;

    fn archive_extension(&self) -> &str {
        "jar"
    }

    fn resolve(&self, path: &str) -> Result<String, RuntimeError> {
        self.resolves.lock().unwrap().push(path.to_string());
        if self.failing.contains(path) {
            return Err(RuntimeError::Other(format!("cannot inspect {path}")));
        }
        if self.resolvable.lock().unwrap().contains(path) {
            Ok(format!("handle:{path}"))
        } else {
            Err(RuntimeError::NotFound {
                symbol: path.to_string(),
            })
        }
    }

    fn load_archive(&self, path: &Path) -> Result<(), RuntimeError> {
        std::thread::sleep(self.load_delay);
        self.loads.lock().unwrap().push(path.to_path_buf());

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.broken.contains(&file_name) {
            return Err(RuntimeError::Archive {
                path: path.to_path_buf(),
                message: "invalid archive header".to_string(),
            });
        }
        if let Some(symbols) = self.archives.get(&file_name) {
            self.resolvable
                .lock()
                .unwrap()
                .extend(symbols.iter().cloned());
        }
        Ok(())
    }
}

/// Create empty files named `names` in `dir`.
pub fn write_files(dir: &Path, names: &[&str]) {
    std::fs::create_dir_all(dir).unwrap();
    for name in names {
        std::fs::write(dir.join(name), b"").unwrap();
    }
}

/// Everything the Marc4J spec probes and binds.
pub const MARC4J_SYMBOLS: &[&str] = &[
    "org.marc4j",
    "org.marc4j.MarcPermissiveStreamReader",
    "org.marc4j.MarcXmlReader",
];
