use std::sync::Arc;
use tracing::instrument;

use crate::{
    client::{Error as ClientError, GeminiClient},
    files::{Error as FilesError, FileHandle},
    generation::{GenerateContentRequest, GenerationResponse},
    models::{Content, Part, Role},
};

/// Builder for content generation requests
#[derive(Clone)]
pub struct ContentBuilder {
    client: Arc<GeminiClient>,
    pub contents: Vec<Content>,
}

impl ContentBuilder {
    /// Creates a new `ContentBuilder`.
    pub(crate) fn new(client: Arc<GeminiClient>) -> Self {
        Self {
            client,
            contents: Vec::new(),
        }
    }

    /// Adds a user message, together with coordinates for a previously uploaded file.
    ///
    /// The file reference comes first, followed by the text.
    ///
    /// # Errors
    ///
    /// Returns an error if the file metadata is incomplete (missing MIME type or URI).
    pub fn with_user_message_and_file(
        mut self,
        text: impl Into<String>,
        file_handle: &FileHandle,
    ) -> Result<Self, FilesError> {
        let (uri, mime_type) = file_handle.reference()?;
        let content = Content::from_parts(vec![Part::file_data(mime_type, uri), Part::text(text)])
            .with_role(Role::User);
        self.contents.push(content);
        Ok(self)
    }

    /// Builds the `GenerateContentRequest`.
    pub fn build(self) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: self.contents,
        }
    }

    /// Executes the content generation request.
    #[instrument(skip_all, fields(messages.parts.count = self.contents.len()))]
    pub async fn execute(self) -> Result<GenerationResponse, ClientError> {
        let client = self.client.clone();
        let request = self.build();
        client.generate_content_raw(request).await
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        client::DEFAULT_BASE_URL,
        files::File,
        Gemini, Model,
    };
    use serde_json::json;
    use url::Url;

    fn gemini() -> Gemini {
        Gemini::with_model_and_base_url(
            "test-key",
            Model::default(),
            Url::parse(DEFAULT_BASE_URL).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn file_message_is_a_single_user_turn() {
        let gemini = gemini();
        let file: File = serde_json::from_value(json!({
            "name": "files/demo",
            "mimeType": "video/mp4",
            "uri": "https://generativelanguage.googleapis.com/v1beta/files/demo",
            "state": "ACTIVE"
        }))
        .unwrap();
        let handle = crate::files::FileHandle::new(gemini.client(), file);

        let request = gemini
            .generate_content()
            .with_user_message_and_file("Critique this.", &handle)
            .unwrap()
            .build();

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "contents": [{
                    "parts": [
                        { "fileData": {
                            "mimeType": "video/mp4",
                            "fileUri": "https://generativelanguage.googleapis.com/v1beta/files/demo"
                        } },
                        { "text": "Critique this." }
                    ],
                    "role": "user"
                }]
            })
        );
    }

    #[test]
    fn file_without_uri_cannot_be_referenced() {
        let gemini = gemini();
        let file: File =
            serde_json::from_value(json!({ "name": "files/demo", "mimeType": "video/mp4" }))
                .unwrap();
        let handle = crate::files::FileHandle::new(gemini.client(), file);

        assert!(gemini
            .generate_content()
            .with_user_message_and_file("Critique this.", &handle)
            .is_err());
    }
}
