#[macro_use]
extern crate log;

use dashboard_models::v0::{EmbedError, ProviderId, ValidationResult};

mod providers;

/// Domain fragments that identify each provider, in detection priority order
static PROVIDER_DOMAINS: &[(ProviderId, &[&str])] = &[
    (ProviderId::YouTube, &["youtube.com", "youtu.be"]),
    (ProviderId::Spotify, &["spotify.com"]),
    (ProviderId::Soundcloud, &["soundcloud.com"]),
];

/// Find which provider a link belongs to, first match in priority order wins
pub fn detect_provider(url: &str) -> Option<ProviderId> {
    let url = url.to_ascii_lowercase();

    PROVIDER_DOMAINS
        .iter()
        .find(|(_, domains)| domains.iter().any(|domain| url.contains(domain)))
        .map(|(provider, _)| *provider)
}

/// Turn a user supplied share link into a URL that can be loaded in an
/// embedded frame.
///
/// Never touches the network and always gives the same answer for the same
/// input. Rejections are returned as data with a provider aware reason.
pub fn validate(raw_url: &str) -> ValidationResult {
    let url = raw_url.trim();
    if url.is_empty() {
        return ValidationResult::invalid(None, EmbedError::EmptyInput);
    }

    let Some(provider) = detect_provider(url) else {
        return ValidationResult::invalid(None, EmbedError::UnsupportedPlatform);
    };

    let canonical = match provider {
        ProviderId::YouTube => providers::youtube(url),
        ProviderId::Spotify => providers::spotify(url),
        ProviderId::Soundcloud => Ok(providers::soundcloud(url)),
    };

    match canonical {
        Ok(canonical_embed_url) => ValidationResult::valid(provider, canonical_embed_url),
        Err(error) => {
            debug!("Rejected {provider} link: {}", error.code());
            ValidationResult::invalid(Some(provider), error)
        }
    }
}
