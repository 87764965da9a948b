//! HTTP client for the remote translation store.
//!
//! The wire shapes follow the Lokalise-style REST conventions: batched key
//! endpoints under a project, per-item errors inside a 200 response, and
//! page-count response headers for the key listing.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{
    Client,
    Response,
    StatusCode,
};
use serde::{
    Deserialize,
    Serialize,
};

use super::{
    CreateKeyError,
    CreateKeysResult,
    KeyPage,
    NewKey,
    RemoteKey,
    RemoteKeyDetail,
    RemoteTranslation,
    StoreError,
    StoreErrorKind,
    TranslationStore,
};

/// Default API endpoint.
const DEFAULT_BASE_URL: &str = "https://api.lokalise.com/api2";

/// Pagination header carrying the total page count.
const PAGE_COUNT_HEADER: &str = "x-pagination-page-count";

/// [`TranslationStore`] implementation over the store's REST API.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: String,
    token: String,
    /// Platform whose key names this client resolves against.
    platform: String,
}

/// Key name as stored remotely: one name per platform.
type WireKeyName = BTreeMap<String, String>;

/// Languages listing response.
#[derive(Debug, Deserialize)]
struct WireLanguages {
    languages: Vec<WireLanguage>,
}

/// One configured project language.
#[derive(Debug, Deserialize)]
struct WireLanguage {
    lang_iso: String,
}

/// Key listing / lookup response.
#[derive(Debug, Deserialize)]
struct WireKeys {
    keys: Vec<WireKey>,
    #[serde(default)]
    errors: Vec<WireKeyError>,
}

/// One key, with translations when the query asked for them.
#[derive(Debug, Deserialize)]
struct WireKey {
    key_id: u64,
    key_name: WireKeyName,
    #[serde(default)]
    translations: Vec<WireTranslation>,
}

/// One stored translation of a key.
#[derive(Debug, Deserialize)]
struct WireTranslation {
    translation_id: u64,
    language_iso: String,
    translation: String,
}

/// Per-item error inside a batched response.
#[derive(Debug, Deserialize)]
struct WireKeyError {
    message: String,
    code: u16,
    #[serde(default)]
    key_name: Option<WireKeyName>,
}

/// Batched create request body.
#[derive(Debug, Serialize)]
struct WireCreateRequest {
    keys: Vec<WireNewKey>,
}

/// One key of a batched create request.
#[derive(Debug, Serialize)]
struct WireNewKey {
    key_name: String,
    platforms: Vec<String>,
    translations: Vec<WireNewTranslation>,
    filenames: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<String>,
}

/// Translation payload of a key to create.
#[derive(Debug, Serialize)]
struct WireNewTranslation {
    language_iso: String,
    translation: String,
}

/// Translation update request body.
#[derive(Debug, Serialize)]
struct WireUpdateRequest<'a> {
    translation: &'a str,
}

/// Bulk delete request body.
#[derive(Debug, Serialize)]
struct WireDeleteRequest<'a> {
    keys: &'a [u64],
}

impl HttpStore {
    #[must_use]
    pub fn new(token: impl Into<String>, platform: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, token, platform)
    }

    /// Point the client at a different endpoint (self-hosted, tests).
    #[must_use]
    pub fn with_base_url(
        base_url: impl Into<String>,
        token: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            token: token.into(),
            platform: platform.into(),
        }
    }

    /// Request builder with the token header applied.
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .header("x-api-token", &self.token)
    }

    /// Name of a key on this client's platform.
    fn key_name(&self, names: &WireKeyName) -> Option<String> {
        names.get(&self.platform).or_else(|| names.values().next()).cloned()
    }

    /// Convert a wire key into the inventory shape.
    fn remote_key(&self, key: &WireKey) -> Result<RemoteKey, StoreError> {
        let name = self
            .key_name(&key.key_name)
            .ok_or_else(|| StoreError::Decode(format!("key {} carries no name", key.key_id)))?;
        Ok(RemoteKey { key_id: key.key_id, name })
    }
}

/// Map response status onto the error taxonomy.
fn check_status(response: Response) -> Result<Response, StoreError> {
    match response.status() {
        StatusCode::TOO_MANY_REQUESTS => Err(StoreError::RateLimited),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(StoreError::Unavailable("authentication rejected".to_string()))
        }
        status if !status.is_success() => {
            Err(StoreError::Unavailable(format!("unexpected status {status}")))
        }
        _ => Ok(response),
    }
}

/// Translate a per-item wire error into the error-kind enum.
///
/// This is the single place where the store's "already taken" phrasing is
/// interpreted; everything downstream branches on the kind.
fn classify(error: &WireKeyError) -> StoreErrorKind {
    let message = error.message.to_lowercase();
    if error.code == 400 && (message.contains("already taken") || message.contains("already exists"))
    {
        StoreErrorKind::AlreadyExists
    } else {
        StoreErrorKind::Rejected
    }
}

#[async_trait]
impl TranslationStore for HttpStore {
    async fn list_languages(&self, project: &str) -> Result<Vec<String>, StoreError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/projects/{project}/languages"))
            .send()
            .await?;
        let languages: WireLanguages = check_status(response)?.json().await?;

        Ok(languages.languages.into_iter().map(|language| language.lang_iso).collect())
    }

    async fn list_keys(
        &self,
        project: &str,
        platform: &str,
        page: u32,
        page_size: u32,
    ) -> Result<KeyPage, StoreError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/projects/{project}/keys"))
            .query(&[
                ("filter_platforms", platform.to_string()),
                ("page", page.to_string()),
                ("limit", page_size.to_string()),
            ])
            .send()
            .await?;
        let response = check_status(response)?;

        let page_count: u32 = response
            .headers()
            .get(PAGE_COUNT_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok())
            .unwrap_or(1);

        let keys: WireKeys = response.json().await?;
        let items = keys
            .keys
            .iter()
            .map(|key| self.remote_key(key))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(KeyPage { items, has_next_page: page < page_count })
    }

    async fn create_keys(
        &self,
        project: &str,
        keys: Vec<NewKey>,
    ) -> Result<CreateKeysResult, StoreError> {
        let body = WireCreateRequest {
            keys: keys
                .into_iter()
                .map(|key| WireNewKey {
                    key_name: key.name,
                    platforms: key.platforms,
                    translations: key
                        .translations
                        .into_iter()
                        .map(|translation| WireNewTranslation {
                            language_iso: translation.language,
                            translation: translation.value,
                        })
                        .collect(),
                    filenames: key.filenames,
                    tags: key.tags,
                })
                .collect(),
        };

        let response = self
            .request(reqwest::Method::POST, &format!("/projects/{project}/keys"))
            .json(&body)
            .send()
            .await?;
        let wire: WireKeys = check_status(response)?.json().await?;

        let created = wire
            .keys
            .iter()
            .map(|key| self.remote_key(key))
            .collect::<Result<Vec<_>, _>>()?;
        let errors = wire
            .errors
            .iter()
            .map(|error| CreateKeyError {
                name: error
                    .key_name
                    .as_ref()
                    .and_then(|names| self.key_name(names))
                    .unwrap_or_default(),
                kind: classify(error),
                message: error.message.clone(),
            })
            .collect();

        Ok(CreateKeysResult { created, errors })
    }

    async fn keys_with_translations(
        &self,
        project: &str,
        names: &[String],
    ) -> Result<Vec<RemoteKeyDetail>, StoreError> {
        let response = self
            .request(reqwest::Method::GET, &format!("/projects/{project}/keys"))
            .query(&[
                ("filter_keys", names.join(",")),
                ("include_translations", "1".to_string()),
                ("limit", "5000".to_string()),
            ])
            .send()
            .await?;
        let wire: WireKeys = check_status(response)?.json().await?;

        wire.keys
            .iter()
            .map(|key| {
                Ok(RemoteKeyDetail {
                    key_id: key.key_id,
                    name: self.remote_key(key)?.name,
                    translations: key
                        .translations
                        .iter()
                        .map(|translation| RemoteTranslation {
                            translation_id: translation.translation_id,
                            language: translation.language_iso.clone(),
                            value: translation.translation.clone(),
                        })
                        .collect(),
                })
            })
            .collect()
    }

    async fn update_translation(
        &self,
        project: &str,
        translation_id: u64,
        value: &str,
    ) -> Result<(), StoreError> {
        let response = self
            .request(
                reqwest::Method::PUT,
                &format!("/projects/{project}/translations/{translation_id}"),
            )
            .json(&WireUpdateRequest { translation: value })
            .send()
            .await?;
        check_status(response)?;

        Ok(())
    }

    async fn bulk_delete_keys(&self, project: &str, key_ids: &[u64]) -> Result<(), StoreError> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("/projects/{project}/keys"))
            .json(&WireDeleteRequest { keys: key_ids })
            .send()
            .await?;
        check_status(response)?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    #[rstest]
    #[case(400, "This key name is already taken", StoreErrorKind::AlreadyExists)]
    #[case(400, "Key already exists", StoreErrorKind::AlreadyExists)]
    #[case(400, "Invalid key name", StoreErrorKind::Rejected)]
    #[case(500, "This key name is already taken", StoreErrorKind::Rejected)]
    fn classify_maps_wire_errors(
        #[case] code: u16,
        #[case] message: &str,
        #[case] expected: StoreErrorKind,
    ) {
        let error = WireKeyError { message: message.to_string(), code, key_name: None };

        assert_that!(classify(&error), eq(expected));
    }

    #[rstest]
    fn key_name_prefers_the_configured_platform() {
        let store = HttpStore::new("token", "web");
        let names: WireKeyName = [
            ("ios".to_string(), "ios_name".to_string()),
            ("web".to_string(), "web_name".to_string()),
        ]
        .into_iter()
        .collect();

        assert_that!(store.key_name(&names), some(eq("web_name")));
    }

    #[rstest]
    fn key_name_falls_back_to_any_platform() {
        let store = HttpStore::new("token", "web");
        let names: WireKeyName =
            [("ios".to_string(), "ios_name".to_string())].into_iter().collect();

        assert_that!(store.key_name(&names), some(eq("ios_name")));
    }
}
