use chrono::{DateTime, TimeZone, Utc};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::TautulliError;

/// Default poster size requested from the image proxy.
pub const DEFAULT_IMAGE_WIDTH: u32 = 300;
pub const DEFAULT_IMAGE_HEIGHT: u32 = 450;

#[derive(Clone)]
pub struct TautulliClient {
    base_url: String,
    api_key: String,
    image_width: u32,
    image_height: u32,
    http: Client,
}

impl TautulliClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            image_width: DEFAULT_IMAGE_WIDTH,
            image_height: DEFAULT_IMAGE_HEIGHT,
            http: Client::new(),
        }
    }

    pub fn with_image_size(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/api/v2", self.base_url)
    }
}

/// Kind of library item reported by `get_recently_added`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum MediaType {
    Movie,
    Show,
    Season,
    Episode,
    Other(String),
}

impl From<String> for MediaType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "movie" => MediaType::Movie,
            "show" => MediaType::Show,
            "season" => MediaType::Season,
            "episode" => MediaType::Episode,
            _ => MediaType::Other(value),
        }
    }
}

impl MediaType {
    pub fn is_tv(&self) -> bool {
        matches!(self, MediaType::Show | MediaType::Season | MediaType::Episode)
    }
}

/// One row of `get_recently_added`.
///
/// Tautulli sends most numbers as strings and uses `""` for absent values,
/// so every field beyond the media type and the added timestamp is lenient.
#[derive(Debug, Clone, Deserialize)]
pub struct RecentlyAddedItem {
    pub media_type: MediaType,

    #[serde(deserialize_with = "lenient::u64_required")]
    pub added_at: u64,

    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub section_id: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub library_name: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub rating_key: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub year: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub thumb: Option<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub directors: Vec<String>,
    /// Runtime in milliseconds.
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub duration: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub originally_available_at: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub media_index: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub child_count: Option<u64>,

    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub parent_rating_key: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub parent_title: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_u64")]
    pub parent_media_index: Option<u64>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub parent_thumb: Option<String>,

    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub grandparent_rating_key: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub grandparent_title: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub grandparent_thumb: Option<String>,
}

impl RecentlyAddedItem {
    pub fn added_at_utc(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.added_at).ok()?;
        Utc.timestamp_opt(secs, 0).single()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Library {
    #[serde(deserialize_with = "lenient::u64_required")]
    pub section_id: u64,
    pub section_name: String,
    #[serde(default)]
    pub section_type: String,
}

#[derive(Debug, Deserialize)]
struct RecentlyAddedData {
    #[serde(default)]
    recently_added: Vec<RecentlyAddedItem>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    response: EnvelopeBody,
}

#[derive(Debug, Deserialize)]
struct EnvelopeBody {
    result: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Value,
}

/// A downloaded poster image.
#[derive(Debug, Clone)]
pub struct PosterImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl PosterImage {
    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "jpg",
        }
    }
}

impl TautulliClient {
    /// Call `cmd` and unwrap the `{"response": {...}}` envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        cmd: &str,
        params: &[(&str, String)],
    ) -> Result<T, TautulliError> {
        let response = self
            .http
            .get(self.endpoint())
            .query(&[("apikey", self.api_key.as_str()), ("cmd", cmd)])
            .query(params)
            .send()
            .await
            .map_err(|err| TautulliError::network(err.to_string()))?;

        if !response.status().is_success() {
            return Err(TautulliError::Status {
                status: response.status().as_u16(),
            });
        }

        let envelope = response
            .json::<Envelope>()
            .await
            .map_err(|err| TautulliError::parse(err.to_string()))?;

        if envelope.response.result != "success" {
            return Err(TautulliError::api(
                cmd,
                envelope
                    .response
                    .message
                    .unwrap_or_else(|| format!("result was '{}'", envelope.response.result)),
            ));
        }

        serde_json::from_value(envelope.response.data)
            .map_err(|err| TautulliError::parse(format!("{}: {}", cmd, err)))
    }

    /// Newest-first page of recently added items.
    pub async fn get_recently_added(
        &self,
        count: u32,
        start: u32,
        section_id: Option<u64>,
    ) -> Result<Vec<RecentlyAddedItem>, TautulliError> {
        let mut params = vec![("count", count.to_string()), ("start", start.to_string())];
        if let Some(section_id) = section_id {
            params.push(("section_id", section_id.to_string()));
        }

        let data: RecentlyAddedData = self.call("get_recently_added", &params).await?;
        Ok(data.recently_added)
    }

    pub async fn get_server_friendly_name(&self) -> Result<String, TautulliError> {
        self.call("get_server_friendly_name", &[]).await
    }

    pub async fn get_libraries(&self) -> Result<Vec<Library>, TautulliError> {
        self.call("get_libraries", &[]).await
    }

    /// URL of a Plex image served through Tautulli's `pms_image_proxy`.
    pub fn image_proxy_url(&self, img: &str) -> Result<Url, TautulliError> {
        Url::parse_with_params(
            &self.endpoint(),
            &[
                ("apikey", self.api_key.clone()),
                ("cmd", "pms_image_proxy".to_string()),
                ("img", img.to_string()),
                ("width", self.image_width.to_string()),
                ("height", self.image_height.to_string()),
                ("fallback", "poster".to_string()),
            ],
        )
        .map_err(|err| TautulliError::InvalidUrl {
            message: err.to_string(),
        })
    }

    /// Download a poster through the image proxy.
    pub async fn fetch_image(&self, img: &str) -> Result<PosterImage, TautulliError> {
        let url = self.image_proxy_url(img)?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| TautulliError::network(err.to_string()))?;

        if !response.status().is_success() {
            return Err(TautulliError::Status {
                status: response.status().as_u16(),
            });
        }

        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
            .filter(|value| value.starts_with("image/"))
            .unwrap_or_else(|| "image/jpeg".to_string());

        let bytes = response
            .bytes()
            .await
            .map_err(|err| TautulliError::network(err.to_string()))?;

        Ok(PosterImage {
            bytes: bytes.to_vec(),
            mime,
        })
    }
}

mod lenient {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn as_u64(value: &Value) -> Option<u64> {
        match value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn u64_required<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        let value = Value::deserialize(d)?;
        as_u64(&value).ok_or_else(|| D::Error::custom(format!("expected integer, got {}", value)))
    }

    pub fn opt_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(value.as_ref().and_then(as_u64))
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(match value {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(match value {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) if !s.trim().is_empty() => Some(s),
                    _ => None,
                })
                .collect(),
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s],
            _ => Vec::new(),
        })
    }
}
