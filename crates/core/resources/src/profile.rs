use std::sync::Arc;

use dashboard_coalesced::{CoalescionService, OperationKey};
use dashboard_config::Settings;
use dashboard_models::v0::{SavedEmbed, ValidationResult};
use dashboard_result::{create_error, Error, Result};
use serde_json::Value;

use crate::{EntitlementPolicy, Transport, TransportRequest};

const MEDIA_PATH: &str = "/profile/media";

/// Song or video embedded on the user's profile
pub struct ProfileMedia {
    transport: Arc<dyn Transport>,
    saves: CoalescionService<OperationKey, SavedEmbed>,
    loads: CoalescionService<OperationKey, Option<SavedEmbed>>,
    entitlement: EntitlementPolicy,
}

impl ProfileMedia {
    pub fn new(transport: Arc<dyn Transport>, settings: &Settings) -> Self {
        ProfileMedia {
            transport,
            saves: CoalescionService::from_config(crate::coalescion_config(settings)),
            loads: CoalescionService::from_config(crate::coalescion_config(settings)),
            entitlement: (&settings.transport).into(),
        }
    }

    /// Validate a share link and store its embeddable form.
    ///
    /// Rejected links come back as data and never reach the transport.
    /// Links naming the same media share one save while it is in flight.
    pub async fn save_embed(&self, raw_url: &str) -> Result<ValidationResult> {
        let result = dashboard_embeds::validate(raw_url);
        let (Some(provider), Some(embed_url)) =
            (result.provider, result.canonical_embed_url.clone())
        else {
            return Ok(result);
        };

        let key = OperationKey::from_parts("profile.media.save", &[("embed_url", embed_url.as_str())]);
        let embed = SavedEmbed {
            provider,
            embed_url,
        };

        let body = serde_json::to_value(&embed).map_err(|error| {
            create_error!(ProgrammerError {
                error: error.to_string()
            })
        })?;

        let transport = self.transport.clone();
        let entitlement = self.entitlement.clone();

        self.saves
            .execute(key, move || async move {
                transport
                    .call(TransportRequest::put(MEDIA_PATH).body(body))
                    .await
                    .into_result(&entitlement)?;

                Ok::<_, Error>(embed)
            })
            .await?;

        info!("Saved {provider} embed to profile");
        self.loads.clear();

        Ok(result)
    }

    /// Load the embed currently stored on the profile, if any
    pub async fn fetch_embed(&self) -> Result<Arc<Option<SavedEmbed>>> {
        let transport = self.transport.clone();
        let entitlement = self.entitlement.clone();

        self.loads
            .execute(OperationKey::from_parts("profile.media.load", &[]), move || async move {
                let body = transport
                    .call(TransportRequest::get(MEDIA_PATH))
                    .await
                    .into_result(&entitlement)?;

                if body == Value::Null {
                    return Ok(None);
                }

                serde_json::from_value::<SavedEmbed>(body)
                    .map(Some)
                    .map_err(|error| {
                        create_error!(InvalidResponse {
                            error: error.to_string()
                        })
                    })
            })
            .await
    }

    /// Forget in-flight operations, used on session reset
    pub fn clear(&self) {
        self.saves.clear();
        self.loads.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use dashboard_config::Settings;
    use dashboard_models::v0::{EmbedError, ProviderId, SavedEmbed};
    use serde_json::json;

    use super::ProfileMedia;
    use crate::{test_fixtures::FakeTransport, Method, Status, TransportResponse};

    fn media(transport: &Arc<FakeTransport>) -> ProfileMedia {
        ProfileMedia::new(transport.clone(), &Settings::defaults())
    }

    #[tokio::test]
    async fn invalid_links_never_reach_transport() {
        let transport = Arc::new(FakeTransport::fixed(Duration::ZERO, TransportResponse::ok(json!({}))));
        let media = media(&transport);

        for (url, error) in [
            ("", EmbedError::EmptyInput),
            ("https://example.com/video", EmbedError::UnsupportedPlatform),
            ("https://www.youtube.com/feed", EmbedError::MalformedYoutubeUrl),
        ] {
            let result = media.save_embed(url).await.unwrap();
            assert!(!result.is_valid);
            assert_eq!(result.error, Some(error));
        }

        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn saves_canonical_embed() {
        let transport = Arc::new(FakeTransport::fixed(Duration::ZERO, TransportResponse::ok(json!({}))));
        let result = media(&transport)
            .save_embed("https://open.spotify.com/track/4cOdK2wGLETKBW3PvgPWqT")
            .await
            .unwrap();

        assert!(result.is_valid);

        let request = transport.requests().remove(0);
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.path, "/profile/media");
        assert_eq!(
            request.body,
            Some(json!({
                "provider": "spotify",
                "embed_url": "https://open.spotify.com/embed/track/4cOdK2wGLETKBW3PvgPWqT"
            }))
        );
    }

    #[tokio::test]
    async fn equivalent_links_share_one_save() {
        let transport = Arc::new(FakeTransport::fixed(
            Duration::from_millis(30),
            TransportResponse::ok(json!({})),
        ));
        let media = media(&transport);

        let (long, short) = tokio::join!(
            media.save_embed("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            media.save_embed("https://youtu.be/dQw4w9WgXcQ"),
        );

        assert_eq!(long.unwrap(), short.unwrap());
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn entitlement_denial_surfaces() {
        let transport = Arc::new(FakeTransport::fixed(
            Duration::ZERO,
            TransportResponse {
                status: Status::ClientError(403),
                body: json!({ "type": "PremiumRequired" }),
            },
        ));

        let error = media(&transport)
            .save_embed("https://soundcloud.com/artist/track")
            .await
            .unwrap_err();

        assert!(error.is_entitlement_denied());
    }

    #[tokio::test]
    async fn fetches_saved_embed() {
        let transport = Arc::new(FakeTransport::fixed(
            Duration::ZERO,
            TransportResponse::ok(json!({
                "provider": "youtube",
                "embed_url": "https://www.youtube.com/embed/dQw4w9WgXcQ"
            })),
        ));

        let embed = media(&transport).fetch_embed().await.unwrap();
        assert_eq!(
            *embed,
            Some(SavedEmbed {
                provider: ProviderId::YouTube,
                embed_url: "https://www.youtube.com/embed/dQw4w9WgXcQ".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn empty_profile_has_no_embed() {
        let transport = Arc::new(FakeTransport::fixed(
            Duration::ZERO,
            TransportResponse::ok(serde_json::Value::Null),
        ));

        assert_eq!(*media(&transport).fetch_embed().await.unwrap(), None);
    }

    #[tokio::test]
    async fn saving_refreshes_next_load() {
        let transport = Arc::new(FakeTransport::fixed(Duration::ZERO, TransportResponse::ok(serde_json::Value::Null)));
        let media = media(&transport);

        media.fetch_embed().await.unwrap();
        media.save_embed("https://youtu.be/dQw4w9WgXcQ").await.unwrap();
        media.fetch_embed().await.unwrap();

        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn transport_failures_are_not_hidden() {
        let transport = Arc::new(FakeTransport::fixed(
            Duration::ZERO,
            TransportResponse::failed(Status::NetworkError),
        ));

        let error = media(&transport).fetch_embed().await.unwrap_err();
        assert!(error.is_transport_failure());
        assert!(!error.is_entitlement_denied());
    }
}
