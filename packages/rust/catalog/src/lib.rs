//! Client for the external game-data catalog (DofusDB).
//!
//! The pipeline only talks to the catalog through [`CatalogApi`], so tests can
//! substitute an in-memory implementation. [`DofusDbClient`] is the HTTP one:
//! a single pooled `reqwest` client with a fixed per-request timeout, used
//! strictly sequentially.

mod models;

use std::time::Duration;

use bestiary_shared::{ApiConfig, BestiaryError, CatalogId, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use models::{Page, RawDungeon, RawMonster, RawNamed};
pub use models::{Dungeon, DungeonSummary, MonsterSummary};

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 3;

/// User-Agent string for catalog requests.
const USER_AGENT: &str = concat!("Bestiary/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// CatalogApi
// ---------------------------------------------------------------------------

/// The catalog operations the enrichment pipeline consumes.
///
/// Names are returned already localized; a `None` name means the record had
/// no entry for the configured locale.
#[allow(async_fn_in_trait)]
pub trait CatalogApi {
    /// Monsters whose localized name equals `name` exactly.
    async fn search_monsters(&self, name: &str) -> Result<Vec<MonsterSummary>>;

    /// Localized name of a monster race.
    async fn race_name(&self, id: CatalogId) -> Result<Option<String>>;

    /// Localized name of a subarea.
    async fn subarea_name(&self, id: CatalogId) -> Result<Option<String>>;

    /// First page of the dungeon listing.
    async fn list_dungeons(&self) -> Result<Vec<DungeonSummary>>;

    /// One dungeon with its member monster ids.
    async fn dungeon(&self, id: CatalogId) -> Result<Dungeon>;
}

// ---------------------------------------------------------------------------
// DofusDbClient
// ---------------------------------------------------------------------------

/// HTTP implementation of [`CatalogApi`].
#[derive(Debug, Clone)]
pub struct DofusDbClient {
    client: Client,
    base_url: Url,
    locale: String,
    list_limit: u32,
}

impl DofusDbClient {
    /// Build a client from the `[api]` config section.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            BestiaryError::config(format!("invalid catalog URL '{}': {e}", config.base_url))
        })?;

        if base_url.cannot_be_a_base() {
            return Err(BestiaryError::config(format!(
                "catalog URL '{base_url}' cannot be used as a base"
            )));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BestiaryError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            locale: config.locale.clone(),
            list_limit: config.dungeon_list_limit,
        })
    }

    /// Locale used for name queries and localized fields.
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// `{base}/{segments...}`, keeping any path prefix of the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(%url, "GET");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| BestiaryError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BestiaryError::Network(format!("{url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| BestiaryError::Network(format!("{url}: failed to read body: {e}")))?;

        serde_json::from_str(&body)
            .map_err(|e| BestiaryError::parse(format!("{url}: unexpected response body: {e}")))
    }
}

impl CatalogApi for DofusDbClient {
    #[instrument(skip(self))]
    async fn search_monsters(&self, name: &str) -> Result<Vec<MonsterSummary>> {
        let mut url = self.endpoint(&["monsters"]);
        url.query_pairs_mut()
            .append_pair(&format!("name.{}", self.locale), name);

        let page: Page<RawMonster> = self.get_json(url).await?;
        Ok(page
            .data
            .into_iter()
            .map(|m| m.localize(&self.locale))
            .collect())
    }

    async fn race_name(&self, id: CatalogId) -> Result<Option<String>> {
        let url = self.endpoint(&["monster-races", &id.to_string()]);
        let race: RawNamed = self.get_json(url).await?;
        Ok(race.localize(&self.locale))
    }

    async fn subarea_name(&self, id: CatalogId) -> Result<Option<String>> {
        let url = self.endpoint(&["subareas", &id.to_string()]);
        let subarea: RawNamed = self.get_json(url).await?;
        Ok(subarea.localize(&self.locale))
    }

    async fn list_dungeons(&self) -> Result<Vec<DungeonSummary>> {
        let mut url = self.endpoint(&["dungeons"]);
        url.query_pairs_mut()
            .append_pair("limit", &self.list_limit.to_string());

        let page: Page<RawDungeon> = self.get_json(url).await?;
        Ok(page
            .data
            .into_iter()
            .map(|d| d.summary(&self.locale))
            .collect())
    }

    async fn dungeon(&self, id: CatalogId) -> Result<Dungeon> {
        let url = self.endpoint(&["dungeons", &id.to_string()]);
        let dungeon: RawDungeon = self.get_json(url).await?;
        Ok(dungeon.localize(&self.locale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> DofusDbClient {
        let config = ApiConfig {
            base_url: server.uri(),
            ..ApiConfig::default()
        };
        DofusDbClient::new(&config).unwrap()
    }

    #[test]
    fn endpoint_keeps_base_prefix() {
        let config = ApiConfig {
            base_url: "https://example.com/api/v2/".into(),
            ..ApiConfig::default()
        };
        let client = DofusDbClient::new(&config).unwrap();
        let url = client.endpoint(&["monster-races", "12"]);
        assert_eq!(url.as_str(), "https://example.com/api/v2/monster-races/12");
    }

    #[test]
    fn rejects_non_base_url() {
        let config = ApiConfig {
            base_url: "mailto:someone@example.com".into(),
            ..ApiConfig::default()
        };
        assert!(DofusDbClient::new(&config).is_err());
    }

    #[tokio::test]
    async fn search_sends_localized_name_query() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/monsters"))
            .and(query_param("name.fr", "Bouftou d'Élevage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total": 1,
                "data": [{
                    "id": 101,
                    "name": {"fr": "Bouftou d'Élevage", "en": "Farmed Gobball"},
                    "race": 7,
                    "subareas": [95, 96]
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let monsters = client.search_monsters("Bouftou d'Élevage").await.unwrap();

        assert_eq!(monsters.len(), 1);
        assert_eq!(monsters[0].id, Some(101));
        assert_eq!(monsters[0].name.as_deref(), Some("Bouftou d'Élevage"));
        assert_eq!(monsters[0].race, Some(7));
        assert_eq!(monsters[0].subareas, vec![95, 96]);
    }

    #[tokio::test]
    async fn search_without_data_is_empty() {
        let server = MockServer::start().await;

        Mock::given(path("/monsters"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"total": 0})))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.search_monsters("Inconnu").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_with_null_data_is_empty() {
        let server = MockServer::start().await;

        Mock::given(path("/monsters"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"total": 0, "data": null})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.search_monsters("Inconnu").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_keeps_negative_ids() {
        let server = MockServer::start().await;

        Mock::given(path("/monsters"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"id": 494, "name": {"fr": "Tofu"}, "race": -1, "subareas": null}]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let monsters = client.search_monsters("Tofu").await.unwrap();
        assert_eq!(monsters[0].id, Some(494));
        assert_eq!(monsters[0].race, Some(-1));
        assert!(monsters[0].subareas.is_empty());
    }

    #[tokio::test]
    async fn race_and_subarea_names() {
        let server = MockServer::start().await;

        Mock::given(path("/monster-races/7"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": 7, "name": {"fr": "Bouftous"}})),
            )
            .mount(&server)
            .await;

        Mock::given(path("/subareas/95"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": 95, "name": {"en": "Gobball Corner"}})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(client.race_name(7).await.unwrap(), Some("Bouftous".into()));
        // No French entry
        assert_eq!(client.subarea_name(95).await.unwrap(), None);
    }

    #[tokio::test]
    async fn http_error_is_network_error() {
        let server = MockServer::start().await;

        Mock::given(path("/dungeons/999"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.dungeon(999).await.unwrap_err();
        assert!(matches!(err, BestiaryError::Network(_)));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let server = MockServer::start().await;

        Mock::given(path("/monster-races/3"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client.race_name(3).await.unwrap_err();
        assert!(matches!(err, BestiaryError::Parse { .. }));
    }

    #[tokio::test]
    async fn dungeon_listing_uses_limit() {
        let server = MockServer::start().await;

        Mock::given(path("/dungeons"))
            .and(query_param("limit", "500"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {"id": 1, "name": {"fr": "Donjon des Bouftous"}},
                    {"id": 2, "name": {"fr": "Donjon des Larves"}}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(path("/dungeons/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 1,
                "name": {"fr": "Donjon des Bouftous"},
                "monsters": [101, 102, 147]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let listing = client.list_dungeons().await.unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[1].id, Some(2));

        let dungeon = client.dungeon(1).await.unwrap();
        assert_eq!(dungeon.name.as_deref(), Some("Donjon des Bouftous"));
        assert_eq!(dungeon.monsters, vec![101, 102, 147]);
    }
}
