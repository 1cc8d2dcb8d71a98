//! Movie metadata lookup against the OMDb catalog.
//!
//! Each lookup is a single `GET /?apikey=..&t=..` round-trip bounded by the
//! configured timeout. Responses are neither cached nor retried.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::OmdbSettings;

#[derive(thiserror::Error, Debug)]
pub enum LookupError {
    #[error("Movie not found in OMDb: {0}")]
    NotFound(String),
    #[error("OMDb answered with HTTP {0}")]
    Status(u16),
    #[error("OMDb request timed out")]
    Timeout,
    #[error("Failed to reach OMDb: {0}")]
    Transport(reqwest::Error),
    #[error("Unexpected OMDb response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LookupError::Timeout
        } else if err.is_decode() {
            LookupError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            LookupError::Status(status.as_u16())
        } else {
            LookupError::Transport(err)
        }
    }
}

/// Canonical metadata for one title, using OMDb's field names on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MovieMetadata {
    pub title: String,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub rated: Option<String>,
    #[serde(default)]
    pub released: Option<String>,
    #[serde(default)]
    pub runtime: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub actors: Option<String>,
    #[serde(default)]
    pub plot: Option<String>,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default, rename = "imdbRating")]
    pub imdb_rating: Option<String>,
    #[serde(default, rename = "imdbID")]
    pub imdb_id: Option<String>,
}

impl MovieMetadata {
    #[cfg(test)]
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            year: None,
            rated: None,
            released: None,
            runtime: None,
            genre: None,
            director: None,
            actors: None,
            plot: None,
            poster: None,
            imdb_rating: None,
            imdb_id: None,
        }
    }

    /// First entry of OMDb's comma separated genre list, skipping "N/A".
    pub fn primary_genre(&self) -> Option<&str> {
        self.genre
            .as_deref()
            .and_then(|genres| genres.split(',').next())
            .map(str::trim)
            .filter(|genre| !genre.is_empty() && *genre != "N/A")
    }
}

#[async_trait]
pub trait MetadataLookup: Send + Sync {
    async fn lookup(&self, name: &str) -> Result<MovieMetadata, LookupError>;
}

pub struct OmdbClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OmdbClient {
    pub fn new(settings: &OmdbSettings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }
}

#[async_trait]
impl MetadataLookup for OmdbClient {
    async fn lookup(&self, name: &str) -> Result<MovieMetadata, LookupError> {
        log::info!("OMDb: looking up '{}'", name);

        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&[("apikey", self.api_key.as_str()), ("t", name)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("OMDb: HTTP {} for '{}'", status, name);
            return Err(LookupError::Status(status.as_u16()));
        }

        let body: Value = response.json().await?;
        parse_omdb_body(body)
    }
}

fn parse_omdb_body(body: Value) -> Result<MovieMetadata, LookupError> {
    if body.get("Response").and_then(Value::as_str) == Some("False") {
        let message = body
            .get("Error")
            .and_then(Value::as_str)
            .unwrap_or("Movie not found!")
            .to_string();
        return Err(LookupError::NotFound(message));
    }

    serde_json::from_value(body).map_err(|e| LookupError::Malformed(e.to_string()))
}

/// Read-only query: resolved metadata, or `None` when OMDb has no match.
pub async fn movie_details(
    lookup: &dyn MetadataLookup,
    name: &str,
) -> Result<Option<MovieMetadata>, LookupError> {
    match lookup.lookup(name).await {
        Ok(metadata) => Ok(Some(metadata)),
        Err(LookupError::NotFound(message)) => {
            log::info!("OMDb: no match for '{}': {}", name, message);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
pub mod tests {
    use std::collections::HashMap;

    use mockito::Matcher;

    use super::*;

    /// In-memory catalog keyed by the requested name.
    #[derive(Default)]
    pub struct FakeCatalog {
        pub titles: HashMap<String, MovieMetadata>,
    }

    impl FakeCatalog {
        pub fn with(entries: &[(&str, &str)]) -> Self {
            let titles = entries
                .iter()
                .map(|(query, title)| (query.to_string(), MovieMetadata::with_title(*title)))
                .collect();
            Self { titles }
        }
    }

    #[async_trait]
    impl MetadataLookup for FakeCatalog {
        async fn lookup(&self, name: &str) -> Result<MovieMetadata, LookupError> {
            self.titles
                .get(name)
                .cloned()
                .ok_or_else(|| LookupError::NotFound("Movie not found!".to_string()))
        }
    }

    fn settings_for(base_url: String) -> OmdbSettings {
        OmdbSettings {
            base_url,
            api_key: "test-key".to_string(),
            timeout_secs: 2,
        }
    }

    #[actix_web::test]
    async fn lookup_returns_canonical_title() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("apikey".into(), "test-key".into()),
                Matcher::UrlEncoded("t".into(), "inception".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"Title":"Inception","Year":"2010","Genre":"Action, Adventure, Sci-Fi","imdbID":"tt1375666","Response":"True"}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let client = OmdbClient::new(&settings_for(server.url())).unwrap();
        let metadata = client.lookup("inception").await.unwrap();

        assert_eq!(metadata.title, "Inception");
        assert_eq!(metadata.year.as_deref(), Some("2010"));
        assert_eq!(metadata.imdb_id.as_deref(), Some("tt1375666"));
        assert_eq!(metadata.primary_genre(), Some("Action"));
        mock.assert_async().await;
    }

    #[actix_web::test]
    async fn lookup_maps_false_response_to_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"Response":"False","Error":"Movie not found!"}"#)
            .create_async()
            .await;

        let client = OmdbClient::new(&settings_for(server.url())).unwrap();
        let err = client.lookup("no such film").await.unwrap_err();

        assert!(matches!(err, LookupError::NotFound(ref msg) if msg == "Movie not found!"));
    }

    #[actix_web::test]
    async fn lookup_maps_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"Response":"False","Error":"Invalid API key!"}"#)
            .create_async()
            .await;

        let client = OmdbClient::new(&settings_for(server.url())).unwrap();
        let err = client.lookup("Inception").await.unwrap_err();

        assert!(matches!(err, LookupError::Status(401)));
    }

    #[actix_web::test]
    async fn lookup_rejects_body_without_title() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"Year":"2010","Response":"True"}"#)
            .create_async()
            .await;

        let client = OmdbClient::new(&settings_for(server.url())).unwrap();
        let err = client.lookup("Inception").await.unwrap_err();

        assert!(matches!(err, LookupError::Malformed(_)));
    }

    #[actix_web::test]
    async fn lookup_reports_unreachable_service() {
        let client = OmdbClient::new(&settings_for("http://127.0.0.1:1".to_string())).unwrap();
        let err = client.lookup("Inception").await.unwrap_err();

        assert!(matches!(
            err,
            LookupError::Transport(_) | LookupError::Timeout
        ));
    }

    #[actix_web::test]
    async fn lookup_times_out_on_silent_server() {
        // Connections queue in the backlog and never get an answer.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let settings = OmdbSettings {
            timeout_secs: 1,
            ..settings_for(base_url)
        };

        let client = OmdbClient::new(&settings).unwrap();
        let err = client.lookup("Inception").await.unwrap_err();

        assert!(matches!(err, LookupError::Timeout));
        drop(listener);
    }

    #[actix_web::test]
    async fn movie_details_turns_no_match_into_none() {
        let catalog = FakeCatalog::with(&[("Inception", "Inception")]);

        let found = movie_details(&catalog, "Inception").await.unwrap();
        let missing = movie_details(&catalog, "Nothing").await.unwrap();

        assert_eq!(found.map(|m| m.title), Some("Inception".to_string()));
        assert!(missing.is_none());
    }

    #[test]
    fn primary_genre_skips_placeholder() {
        let mut metadata = MovieMetadata::with_title("Obscure");
        metadata.genre = Some("N/A".to_string());
        assert_eq!(metadata.primary_genre(), None);

        metadata.genre = Some("Drama".to_string());
        assert_eq!(metadata.primary_genre(), Some("Drama"));
    }
}
