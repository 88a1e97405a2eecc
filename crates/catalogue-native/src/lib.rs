//! Loading of optional native libraries.
//!
//! Indexing components that parse MARC records or submit documents to a search
//! engine call [`require_marc4j`] / [`require_solrj`] (or
//! [`NativeLoader::ensure_loaded`] with their own [`LibrarySpec`]) before
//! touching the library. The loader probes for the library's symbols, loads
//! every archive from the configured directory if they are missing, probes
//! once more, and then exposes well-known aliases through its
//! [`BindingRegistry`].
//!
//! Archives are never unloaded: handles in the registry stay valid for the
//! life of the process.

mod global;
mod loader;
mod registry;
mod runtime;
mod spec;

pub use catalogue_settings::Settings;
pub use global::{native_loader, require_marc4j, require_solrj};
pub use loader::{LoadError, NativeLoader};
pub use registry::BindingRegistry;
pub use runtime::{DylibRuntime, NativeRuntime, NativeSymbol, RuntimeError, symbol_name};
pub use spec::LibrarySpec;
