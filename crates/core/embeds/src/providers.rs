use dashboard_models::v0::EmbedError;
use lazy_static::lazy_static;
use regex::Regex;
use urlencoding::{decode as url_decode, encode as url_encode};

const YOUTUBE_EMBED_BASE: &str = "https://www.youtube.com/embed/";
const SPOTIFY_EMBED_BASE: &str = "https://open.spotify.com/embed/";
const SOUNDCLOUD_PLAYER_BASE: &str = "https://w.soundcloud.com/player/?url=";

lazy_static! {
    static ref RE_YOUTUBE_WATCH: Regex = Regex::new("(?i)^(?:https?://)?(?:(?:www|m|music)\\.)?youtube\\.com/watch\\?(?:[^#]*&)?v=([A-Za-z0-9_-]{11})(?:[&#].*)?$").unwrap();
    static ref RE_YOUTUBE_SHORT: Regex = Regex::new("(?i)^(?:https?://)?(?:www\\.)?youtu\\.be/([A-Za-z0-9_-]{11})(?:[?#].*)?$").unwrap();
    static ref RE_YOUTUBE_PATH: Regex = Regex::new("(?i)^(?:https?://)?(?:(?:www|m|music)\\.)?youtube\\.com/(?:embed|shorts|live|v)/([A-Za-z0-9_-]{11})(?:[?#].*)?$").unwrap();

    static ref RE_SPOTIFY: Regex = Regex::new("(?i)^(?:https?://)?open\\.spotify\\.com/(?:intl-[a-z]{2}(?:-[a-z]{2})?/)?(?:embed/)?(track|album|playlist|artist|episode|show)/([A-Za-z0-9]+)(?:[?#/].*)?$").unwrap();

    static ref RE_SOUNDCLOUD_PLAYER_SOURCE: Regex = Regex::new("(?i)^(?:https?://)?w\\.soundcloud\\.com/player/?\\?(?:[^#]*&)?url=([^&#]+)").unwrap();
}

/// Watch links, short links and path style links all name the same video
pub fn youtube(url: &str) -> Result<String, EmbedError> {
    [&*RE_YOUTUBE_WATCH, &*RE_YOUTUBE_SHORT, &*RE_YOUTUBE_PATH]
        .iter()
        .find_map(|re| re.captures(url))
        .map(|captures| format!("{YOUTUBE_EMBED_BASE}{}", &captures[1]))
        .ok_or(EmbedError::MalformedYoutubeUrl)
}

pub fn spotify(url: &str) -> Result<String, EmbedError> {
    RE_SPOTIFY
        .captures(url)
        .map(|captures| {
            format!(
                "{SPOTIFY_EMBED_BASE}{}/{}",
                captures[1].to_ascii_lowercase(),
                &captures[2]
            )
        })
        .ok_or(EmbedError::MalformedSpotifyUrl)
}

/// The SoundCloud player takes the original link verbatim, so any link on
/// the domain is accepted. Player links are unwrapped to their source when
/// one can be recovered, otherwise wrapped as they are.
pub fn soundcloud(url: &str) -> String {
    let source = RE_SOUNDCLOUD_PLAYER_SOURCE
        .captures(url)
        .and_then(|captures| url_decode(&captures[1]).ok().map(|source| source.into_owned()))
        .unwrap_or_else(|| url.to_owned());

    format!("{SOUNDCLOUD_PLAYER_BASE}{}", url_encode(&source))
}
