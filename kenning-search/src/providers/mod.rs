//! Search provider implementations.

pub mod brave;
pub mod exa;

use std::sync::Arc;

pub use brave::BraveProvider;
pub use exa::ExaProvider;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::provider::SearchProvider;
use crate::types::ProviderKind;

/// Construct the concrete provider for `kind`.
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the underlying HTTP client cannot be built.
pub fn build_provider(
    kind: ProviderKind,
    config: &SearchConfig,
) -> Result<Arc<dyn SearchProvider>, SearchError> {
    Ok(match kind {
        ProviderKind::Brave => Arc::new(BraveProvider::new(config)?),
        ProviderKind::Exa => Arc::new(ExaProvider::new(config)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_every_kind() {
        let config = SearchConfig::default();
        for kind in ProviderKind::all() {
            let provider = build_provider(*kind, &config).expect("provider");
            assert_eq!(provider.kind(), *kind);
        }
    }
}
