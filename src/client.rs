use mime::Mime;
use reqwest::{
    header::{HeaderMap, HeaderValue, InvalidHeaderValue},
    Client, RequestBuilder, Response,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use snafu::{OptionExt, ResultExt, Snafu};
use std::{fmt, sync::Arc};
use tracing::instrument;
use url::Url;

use crate::{
    files::{model::File, FileBuilder},
    generation::{ContentBuilder, GenerateContentRequest, GenerationResponse},
};

/// Root of the Gemini REST API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// Gemini model used for a generation request.
///
/// Any name the API accepts can be used through [`Model::Custom`]; bare names are
/// prefixed with `models/` on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Model {
    #[default]
    Gemini3FlashPreview,
    Gemini25Flash,
    Gemini25Pro,
    Custom(String),
}

impl Model {
    /// Resource name of the model, e.g. `models/gemini-3-flash-preview`.
    pub fn as_str(&self) -> &str {
        match self {
            Model::Gemini3FlashPreview => "models/gemini-3-flash-preview",
            Model::Gemini25Flash => "models/gemini-2.5-flash",
            Model::Gemini25Pro => "models/gemini-2.5-pro",
            Model::Custom(name) => name,
        }
    }
}

impl AsRef<str> for Model {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Model {
    fn from(name: String) -> Self {
        let name = name.trim();
        let name = name.strip_prefix("models/").unwrap_or(name);
        match name {
            "gemini-3-flash-preview" => Model::Gemini3FlashPreview,
            "gemini-2.5-flash" => Model::Gemini25Flash,
            "gemini-2.5-pro" => Model::Gemini25Pro,
            other => Model::Custom(format!("models/{other}")),
        }
    }
}

impl From<&str> for Model {
    fn from(name: &str) -> Self {
        Model::from(name.to_string())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("failed to parse API key"))]
    InvalidApiKey { source: InvalidHeaderValue },

    #[snafu(display("failed to construct HTTP client"))]
    BuildHttpClient { source: reqwest::Error },

    #[snafu(display("failed to construct URL (probably incorrect model name): {suffix}"))]
    ConstructUrl {
        source: url::ParseError,
        suffix: String,
    },

    #[snafu(display("failed to perform request to '{url}'"))]
    PerformRequest { source: reqwest::Error, url: Url },

    #[snafu(display(
        "bad response from server; code {code}; description: {}",
        description.as_deref().unwrap_or("none")
    ))]
    BadResponse {
        code: u16,
        description: Option<String>,
    },

    #[snafu(display("response is missing the '{header}' header"))]
    MissingResponseHeader { header: String },

    #[snafu(display("failed to obtain response body"))]
    DecodeResponse { source: reqwest::Error },

    #[snafu(display("failed to deserialize JSON response"))]
    Deserialize { source: serde_json::Error },
}

/// Internal client for making requests to the Gemini API
pub(crate) struct GeminiClient {
    http_client: Client,
    pub model: Model,
    base_url: Url,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    fn new(api_key: &str, model: Model, base_url: Url) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key).context(InvalidApiKeySnafu)?;
        key.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key);

        let http_client = Client::builder()
            .default_headers(headers)
            .build()
            .context(BuildHttpClientSnafu)?;

        Ok(Self {
            http_client,
            model,
            base_url,
        })
    }

    /// Generate content
    #[instrument(skip_all, fields(model = %self.model))]
    pub(crate) async fn generate_content_raw(
        &self,
        request: GenerateContentRequest,
    ) -> Result<GenerationResponse, Error> {
        let url = self.build_url(&format!("{}:generateContent", self.model))?;
        let response = self
            .perform(url.clone(), |client| client.post(url).json(&request))
            .await?;
        Self::decode_json(response).await
    }

    /// Upload a file with the resumable upload protocol.
    ///
    /// The first request opens an upload session; the second sends the bytes and
    /// finalizes it.
    #[instrument(skip_all, fields(
        file.size = file_bytes.len(),
        mime.type = %mime_type,
        display_name = display_name.as_deref(),
    ))]
    pub(crate) async fn upload_file(
        &self,
        display_name: Option<String>,
        file_bytes: Vec<u8>,
        mime_type: Mime,
    ) -> Result<File, Error> {
        let start_url = self.build_upload_url()?;
        let metadata = match display_name {
            Some(name) => json!({ "file": { "displayName": name } }),
            None => json!({ "file": {} }),
        };
        let size = file_bytes.len().to_string();

        let response = self
            .perform(start_url.clone(), |client| {
                client
                    .post(start_url)
                    .header("X-Goog-Upload-Protocol", "resumable")
                    .header("X-Goog-Upload-Command", "start")
                    .header("X-Goog-Upload-Header-Content-Length", size.as_str())
                    .header("X-Goog-Upload-Header-Content-Type", mime_type.as_ref())
                    .json(&metadata)
            })
            .await?;

        let session_url = response
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|value| value.to_str().ok())
            .context(MissingResponseHeaderSnafu {
                header: UPLOAD_URL_HEADER,
            })?;
        let session_url = Url::parse(session_url).context(ConstructUrlSnafu {
            suffix: session_url.to_string(),
        })?;

        let response = self
            .perform(session_url.clone(), |client| {
                client
                    .post(session_url)
                    .header("X-Goog-Upload-Command", "upload, finalize")
                    .header("X-Goog-Upload-Offset", "0")
                    .header(reqwest::header::CONTENT_LENGTH, size.as_str())
                    .body(file_bytes)
            })
            .await?;

        let uploaded: UploadFileResponse = Self::decode_json(response).await?;
        Ok(uploaded.file)
    }

    /// Fetch the current metadata of a file, e.g. `files/abc-123`.
    #[instrument(skip(self))]
    pub(crate) async fn get_file(&self, name: &str) -> Result<File, Error> {
        let url = self.build_url(name)?;
        let response = self
            .perform(url.clone(), |client| client.get(url))
            .await?;
        Self::decode_json(response).await
    }

    async fn perform<F>(&self, url: Url, builder: F) -> Result<Response, Error>
    where
        F: FnOnce(&Client) -> RequestBuilder,
    {
        let response = builder(&self.http_client)
            .send()
            .await
            .context(PerformRequestSnafu { url })?;
        Self::check_response(response).await
    }

    /// Check the response status code and return an error if it is not successful
    async fn check_response(response: Response) -> Result<Response, Error> {
        let status = response.status();
        if !status.is_success() {
            let description = response.text().await.ok();
            BadResponseSnafu {
                code: status.as_u16(),
                description,
            }
            .fail()
        } else {
            Ok(response)
        }
    }

    async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, Error> {
        let bytes = response.bytes().await.context(DecodeResponseSnafu)?;
        serde_json::from_slice(&bytes).context(DeserializeSnafu)
    }

    /// Build a URL relative to the API root
    fn build_url(&self, suffix: &str) -> Result<Url, Error> {
        self.base_url.join(suffix).context(ConstructUrlSnafu {
            suffix: suffix.to_string(),
        })
    }

    /// Uploads live under `/upload` in front of the API root path.
    fn build_upload_url(&self) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        let path = format!("/upload{}", self.base_url.path());
        url.set_path(&path);
        url.join("files").context(ConstructUrlSnafu {
            suffix: format!("{path}files"),
        })
    }
}

#[derive(Debug, serde::Deserialize)]
struct UploadFileResponse {
    file: File,
}

/// Client for the Gemini API
#[derive(Clone, Debug)]
pub struct Gemini {
    client: Arc<GeminiClient>,
}

impl Gemini {
    /// Create a new client with the specified API key, model, and base URL
    pub fn with_model_and_base_url(
        api_key: impl AsRef<str>,
        model: impl Into<Model>,
        base_url: Url,
    ) -> Result<Self, Error> {
        let client = GeminiClient::new(api_key.as_ref(), model.into(), base_url)?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    #[cfg(test)]
    pub(crate) fn client(&self) -> Arc<GeminiClient> {
        self.client.clone()
    }

    /// Start building a content generation request
    pub fn generate_content(&self) -> ContentBuilder {
        ContentBuilder::new(self.client.clone())
    }

    /// Start building a file upload.
    pub fn create_file<B: Into<Vec<u8>>>(&self, bytes: B) -> FileBuilder {
        FileBuilder::new(self.client.clone(), bytes)
    }
}
