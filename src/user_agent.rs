//! User-Agent string for E-utilities traffic.
//!
//! NCBI asks heavy users to identify their tool so it can contact them before
//! blocking; the UA carries the crate name and version.

/// Default User-Agent for search and fetch requests.
#[must_use]
pub(crate) fn default_eutils_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("pubmed-harvester/{version} (bibliographic-harvest)")
}
