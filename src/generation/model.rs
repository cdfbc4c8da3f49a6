use serde::{Deserialize, Serialize};

use crate::models::{Content, Part};

/// Request to generate content
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// The contents to generate content from
    pub contents: Vec<Content>,
}

/// Reason why generation finished
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishReason {
    /// Default value. This value is unused.
    FinishReasonUnspecified,
    /// Natural stop point of the model or provided stop sequence.
    Stop,
    /// The maximum number of tokens as specified in the request was reached.
    MaxTokens,
    /// The response candidate content was flagged for safety reasons.
    Safety,
    /// The response candidate content was flagged for recitation reasons.
    Recitation,
    /// The response candidate content was flagged for using an unsupported language.
    Language,
    /// Unknown reason.
    Other,
    /// Token generation stopped because the content contains forbidden terms.
    Blocklist,
    /// Token generation stopped for potentially containing prohibited content.
    ProhibitedContent,
    /// A reason newer than this client.
    #[serde(other)]
    Unrecognized,
}

/// A candidate response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// The content of the candidate
    #[serde(default)]
    pub content: Content,
    /// The finish reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    /// The index of the candidate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i32>,
}

/// Usage metadata for the request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_token_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates_token_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_token_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thoughts_token_count: Option<i32>,
}

/// Response from the Gemini API for content generation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    /// The candidates generated
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// The usage metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,
    /// The version of the model that produced the response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
}

impl GenerationResponse {
    /// Get the text of the first candidate, skipping thought summaries.
    ///
    /// Returns an empty string when the first candidate carries no text.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.parts.as_ref())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| match part {
                        Part::Text {
                            text,
                            thought: None | Some(false),
                            ..
                        } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_joins_parts_of_first_candidate_without_thoughts() {
        let response: GenerationResponse = serde_json::from_value(json!({
            "candidates": [
                {
                    "content": {
                        "parts": [
                            { "text": "thinking about pacing", "thought": true },
                            { "text": "1) Quick read\n" },
                            { "text": "The cut is tight.", "thoughtSignature": "abc" }
                        ],
                        "role": "model"
                    },
                    "finishReason": "STOP",
                    "index": 0
                },
                {
                    "content": { "parts": [{ "text": "second candidate" }], "role": "model" }
                }
            ],
            "usageMetadata": {
                "promptTokenCount": 5210,
                "candidatesTokenCount": 312,
                "totalTokenCount": 5700,
                "thoughtsTokenCount": 178
            },
            "modelVersion": "gemini-3-flash-preview",
            "responseId": "resp-1"
        }))
        .unwrap();

        assert_eq!(response.text(), "1) Quick read\nThe cut is tight.");
        assert_eq!(response.candidates[0].finish_reason, Some(FinishReason::Stop));
        assert_eq!(
            response.usage_metadata.unwrap().thoughts_token_count,
            Some(178)
        );
    }

    #[test]
    fn blocked_response_has_empty_text() {
        let response: GenerationResponse = serde_json::from_value(json!({
            "candidates": [{ "finishReason": "SAFETY", "index": 0 }]
        }))
        .unwrap();

        assert_eq!(response.text(), "");
        assert_eq!(response.candidates[0].finish_reason, Some(FinishReason::Safety));
    }

    #[test]
    fn unknown_finish_reason_is_tolerated() {
        let candidate: Candidate = serde_json::from_value(json!({
            "content": { "parts": [{ "text": "ok" }] },
            "finishReason": "IMAGE_SAFETY"
        }))
        .unwrap();

        assert_eq!(candidate.finish_reason, Some(FinishReason::Unrecognized));
    }
}
