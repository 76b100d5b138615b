use std::fmt;

auto_derived!(
    /// Media provider that can be embedded on a profile
    #[derive(Copy, Hash)]
    #[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
    pub enum ProviderId {
        YouTube,
        Spotify,
        Soundcloud,
    }

    /// Reason a media link could not be embedded
    #[derive(Copy, Hash)]
    #[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
    pub enum EmbedError {
        /// Nothing was entered
        EmptyInput,
        /// Link does not belong to any supported provider
        UnsupportedPlatform,
        /// YouTube link without a recognisable video
        MalformedYoutubeUrl,
        /// Spotify link without a recognisable track, album, etc.
        MalformedSpotifyUrl,
    }

    /// Outcome of validating a user supplied media link
    pub struct ValidationResult {
        /// Whether the link can be embedded
        pub is_valid: bool,
        /// Provider whose domain matched
        #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
        pub provider: Option<ProviderId>,
        /// URL safe to load in an embedded frame
        #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
        pub canonical_embed_url: Option<String>,
        /// Why the link was rejected
        #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
        pub error: Option<EmbedError>,
    }

    /// Media embed stored on a profile
    pub struct SavedEmbed {
        /// Provider of the media
        pub provider: ProviderId,
        /// Canonical embed URL
        pub embed_url: String,
    }
);

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::YouTube => "youtube",
            ProviderId::Spotify => "spotify",
            ProviderId::Soundcloud => "soundcloud",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EmbedError {
    /// Error code as exposed to clients
    pub fn code(&self) -> &'static str {
        match self {
            EmbedError::EmptyInput => "EMPTY_INPUT",
            EmbedError::UnsupportedPlatform => "UNSUPPORTED_PLATFORM",
            EmbedError::MalformedYoutubeUrl => "MALFORMED_YOUTUBE_URL",
            EmbedError::MalformedSpotifyUrl => "MALFORMED_SPOTIFY_URL",
        }
    }

    /// Message suitable for showing to the end user
    pub fn message(&self) -> &'static str {
        match self {
            EmbedError::EmptyInput => "Please enter a link.",
            EmbedError::UnsupportedPlatform => {
                "Only YouTube, Spotify and SoundCloud links are supported."
            }
            EmbedError::MalformedYoutubeUrl => {
                "That YouTube link doesn't point to a video, copy the link from the Share button."
            }
            EmbedError::MalformedSpotifyUrl => {
                "That Spotify link doesn't point to a track, album, playlist, artist or podcast."
            }
        }
    }
}

impl ValidationResult {
    /// Link accepted and rewritten into its embeddable form
    pub fn valid(provider: ProviderId, canonical_embed_url: String) -> Self {
        ValidationResult {
            is_valid: true,
            provider: Some(provider),
            canonical_embed_url: Some(canonical_embed_url),
            error: None,
        }
    }

    /// Link rejected, optionally after its provider was recognised
    pub fn invalid(provider: Option<ProviderId>, error: EmbedError) -> Self {
        ValidationResult {
            is_valid: false,
            provider,
            canonical_embed_url: None,
            error: Some(error),
        }
    }
}
