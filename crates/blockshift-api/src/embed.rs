use blockshift_config::OembedOptions;
use thiserror::Error;

/// oEmbed data as returned by the provider, keyed by oEmbed field name.
pub type EmbedRecord = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("Could not fetch {url}: {reason}")]
    Unreachable { url: String, reason: String },
    #[error("Invalid embed response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },
}

/// Resolves a URL to its oEmbed metadata.
pub trait EmbedProvider {
    /// `Ok(None)` when the page exists but offers no oEmbed data.
    fn fetch(&self, url: &str, options: &OembedOptions) -> Result<Option<EmbedRecord>, EmbedError>;
}
