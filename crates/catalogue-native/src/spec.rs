use std::path::PathBuf;

/// Description of one optional native library.
///
/// Built by the caller for each load request. `probe_symbols` prove the
/// library is present; `bindings` name the symbols to expose once it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibrarySpec {
    /// Human-readable name used in errors ("Marc4J").
    pub name: String,
    /// Dotted namespace paths, probed in order.
    pub probe_symbols: Vec<String>,
    /// `(alias, dotted path)` pairs, bound in order.
    pub bindings: Vec<(String, String)>,
    /// Settings key holding the archive directory.
    pub settings_key: String,
    /// Archive directory used when the setting is absent, relative to the install root.
    pub bundled_fallback_dir: PathBuf,
}

impl LibrarySpec {
    pub fn new(
        name: impl Into<String>,
        settings_key: impl Into<String>,
        bundled_fallback_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            probe_symbols: Vec::new(),
            bindings: Vec::new(),
            settings_key: settings_key.into(),
            bundled_fallback_dir: bundled_fallback_dir.into(),
        }
    }

    /// Add a symbol that must resolve before binding.
    pub fn probe(mut self, symbol: impl Into<String>) -> Self {
        self.probe_symbols.push(symbol.into());
        self
    }

    /// Add an alias to bind once the library is available.
    pub fn bind(mut self, alias: impl Into<String>, path: impl Into<String>) -> Self {
        self.bindings.push((alias.into(), path.into()));
        self
    }

    /// The MARC record parsing library.
    ///
    /// Exposes `MarcPermissiveStreamReader` and `MarcXmlReader`.
    pub fn marc4j() -> Self {
        Self::new("Marc4J", "marc4j.jar_dir", "vendor/marc4j/lib")
            .probe("org.marc4j")
            .bind(
                "MarcPermissiveStreamReader",
                "org.marc4j.MarcPermissiveStreamReader",
            )
            .bind("MarcXmlReader", "org.marc4j.MarcXmlReader")
    }

    /// The search-engine client library.
    ///
    /// Exposes `HttpSolrServer` and `SolrInputDocument`.
    pub fn solrj() -> Self {
        Self::new("SolrJ", "solrj.jar_dir", "vendor/solrj/lib")
            .probe("org.apache.solr")
            .probe("org.apache.solr.client.solrj")
            .bind(
                "HttpSolrServer",
                "org.apache.solr.client.solrj.impl.HttpSolrServer",
            )
            .bind(
                "SolrInputDocument",
                "org.apache.solr.common.SolrInputDocument",
            )
    }
}
