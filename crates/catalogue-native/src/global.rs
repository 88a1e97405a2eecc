//! Process-wide loader.
//!
//! Indexing components and extensions share one [`NativeLoader`] so each
//! library is loaded at most once per process. The singleton lives in a
//! `'static OnceLock`, so its archives are never unloaded and bound symbols
//! stay valid.

use crate::loader::{LoadError, NativeLoader};
use crate::runtime::DylibRuntime;
use crate::spec::LibrarySpec;
use catalogue_settings::Settings;
use std::sync::OnceLock;

static NATIVE_LOADER: OnceLock<NativeLoader<DylibRuntime>> = OnceLock::new();

/// Get the process-wide loader.
pub fn native_loader() -> &'static NativeLoader<DylibRuntime> {
    NATIVE_LOADER.get_or_init(|| NativeLoader::new(DylibRuntime::new()))
}

/// Load the MARC library from `marc4j.jar_dir` or the bundled archives.
///
/// Afterwards `MarcPermissiveStreamReader` and `MarcXmlReader` are bound in
/// [`native_loader`]'s registry.
pub fn require_marc4j(settings: &Settings) -> Result<(), LoadError> {
    native_loader().ensure_loaded(&LibrarySpec::marc4j(), settings)
}

/// Load the search client library from `solrj.jar_dir` or the bundled archives.
///
/// Afterwards `HttpSolrServer` and `SolrInputDocument` are bound in
/// [`native_loader`]'s registry.
pub fn require_solrj(settings: &Settings) -> Result<(), LoadError> {
    native_loader().ensure_loaded(&LibrarySpec::solrj(), settings)
}
