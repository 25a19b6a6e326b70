// SPDX-License-Identifier: MIT

//! AI reply generation and bulk sentiment categorization.
//!
//! Thin chat-completions client. Both operations degrade rather than fail:
//! reply generation falls back to a fixed default string, and a per-comment
//! categorization failure files that comment as neutral.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::error::AppError;
use crate::models::{CommentSummary, Sentiment};

const MODEL: &str = "gpt-3.5-turbo";

/// Returned when reply generation fails upstream.
const FALLBACK_REPLY: &str = "Thank you for your comment! I appreciate your feedback \
and perspective. Looking forward to creating more content you'll enjoy! 😊";

/// Fixed pause between categorization calls to respect upstream rate limits.
const CATEGORIZE_DELAY: Duration = Duration::from_millis(200);

/// Wall-time ceiling for a whole categorization batch. Comments not reached
/// within the budget default to neutral.
const CATEGORIZE_BATCH_CEILING: Duration = Duration::from_secs(60);

/// Sentiment partition returned by bulk categorization.
#[derive(Debug, Default, Serialize)]
pub struct CategorizedComments {
    pub positive: Vec<CommentSummary>,
    pub negative: Vec<CommentSummary>,
    pub neutral: Vec<CommentSummary>,
}

/// Chat-completions API client.
#[derive(Clone)]
pub struct AiService {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl AiService {
    pub fn new(api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key,
        }
    }

    /// Override the API endpoint (tests point this at a local server).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Generate a friendly reply to a comment.
    ///
    /// Upstream failure degrades to a fixed default reply instead of an
    /// error, so the posting flow never blocks on the model.
    pub async fn generate_reply(&self, comment: &str) -> String {
        let system = "You are a helpful assistant that generates friendly and professional \
                      replies to YouTube comments. Keep the replies concise, relevant, and \
                      engaging.";
        let user = format!(
            "Please generate a friendly reply to this YouTube comment: \"{}\"",
            comment
        );

        match self.chat_completion(system, &user).await {
            Ok(reply) if !reply.trim().is_empty() => reply.trim().to_string(),
            Ok(_) => {
                tracing::warn!("Empty reply from model, using fallback");
                FALLBACK_REPLY.to_string()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Reply generation failed, using fallback");
                FALLBACK_REPLY.to_string()
            }
        }
    }

    /// Categorize a batch of comments by sentiment.
    ///
    /// Comments are processed sequentially with a fixed delay between model
    /// calls; an empty input short-circuits without calling upstream. Every
    /// input comment lands in exactly one partition.
    pub async fn categorize_comments(
        &self,
        comments: Vec<CommentSummary>,
    ) -> CategorizedComments {
        let mut result = CategorizedComments::default();
        if comments.is_empty() {
            return result;
        }

        let started = Instant::now();
        let total = comments.len();

        for (index, mut comment) in comments.into_iter().enumerate() {
            let sentiment = if started.elapsed() >= CATEGORIZE_BATCH_CEILING {
                tracing::warn!(
                    processed = index,
                    total,
                    "Categorization batch ceiling reached, defaulting rest to neutral"
                );
                Sentiment::Neutral
            } else {
                if index > 0 {
                    tokio::time::sleep(CATEGORIZE_DELAY).await;
                }
                self.classify_sentiment(&comment.text).await
            };

            comment.sentiment = Some(sentiment);
            match sentiment {
                Sentiment::Positive => result.positive.push(comment),
                Sentiment::Negative => result.negative.push(comment),
                Sentiment::Neutral => result.neutral.push(comment),
            }
        }

        result
    }

    /// Classify a single comment, defaulting to neutral on any failure.
    async fn classify_sentiment(&self, text: &str) -> Sentiment {
        let system = "You are a sentiment classifier for YouTube comments. Respond with \
                      exactly one word: positive, negative, or neutral.";
        let user = format!("Classify the sentiment of this comment: \"{}\"", text);

        match self.chat_completion(system, &user).await {
            Ok(label) => parse_sentiment(&label),
            Err(e) => {
                tracing::warn!(error = %e, "Sentiment classification failed, defaulting to neutral");
                Sentiment::Neutral
            }
        }
    }

    /// Run one chat completion and return the first choice's content.
    async fn chat_completion(&self, system: &str, user: &str) -> Result<String, AppError> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: user.to_string(),
                },
            ],
            max_tokens: 150,
            temperature: 0.7,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Model request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::Internal(anyhow::anyhow!(
                "Model request failed with status {}",
                status
            )));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Model response parse error: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("No completion choices returned")))
    }
}

/// Map a model response onto a sentiment label.
fn parse_sentiment(label: &str) -> Sentiment {
    let label = label.trim().to_ascii_lowercase();
    if label.starts_with("positive") {
        Sentiment::Positive
    } else if label.starts_with("negative") {
        Sentiment::Negative
    } else {
        // Unknown output counts as a per-comment failure: file as neutral.
        Sentiment::Neutral
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: &'static str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sentiment_labels() {
        assert_eq!(parse_sentiment("positive"), Sentiment::Positive);
        assert_eq!(parse_sentiment(" Negative."), Sentiment::Negative);
        assert_eq!(parse_sentiment("NEUTRAL"), Sentiment::Neutral);
    }

    #[test]
    fn test_parse_sentiment_garbage_defaults_to_neutral() {
        assert_eq!(parse_sentiment("I cannot classify this"), Sentiment::Neutral);
        assert_eq!(parse_sentiment(""), Sentiment::Neutral);
    }

    #[tokio::test]
    async fn test_categorize_empty_input_short_circuits() {
        // Unroutable base URL: any upstream call would error loudly, so an
        // all-empty result proves no call was attempted.
        let ai = AiService::new("test".to_string())
            .with_base_url("http://127.0.0.1:1/v1".to_string());

        let result = ai.categorize_comments(Vec::new()).await;
        assert!(result.positive.is_empty());
        assert!(result.negative.is_empty());
        assert!(result.neutral.is_empty());
    }
}
