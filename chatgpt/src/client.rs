use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "gpt-4-turbo";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// A single system + user exchange sent to the Chat Completions endpoint.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    /// Ask the provider to constrain its reply to a JSON object.
    pub json_object: bool,
}

#[derive(Debug, Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Minimal OpenAI Chat Completions client returning the whole reply at once.
pub struct OpenAiModelClient {
    api_key: String,
    pub model: String,
    base_url: String,
    http: reqwest::Client,
}

impl OpenAiModelClient {
    pub fn new(api_key: String) -> Self {
        Self::new_with_model(api_key, DEFAULT_MODEL.to_string())
    }

    pub fn new_with_model(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Send one request and return the first choice's message content.
    /// `Ok(None)` means the provider answered without any content.
    pub async fn complete(&self, request: &ChatRequest) -> Result<Option<String>> {
        let body = build_body(&self.model, request);
        tracing::debug!(
            "chat request body: {}",
            serde_json::to_string(&body).unwrap_or_default()
        );

        let mut req = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json");
        if let Ok(project) = std::env::var("OPENAI_PROJECT") {
            if !project.is_empty() {
                req = req.header("OpenAI-Project", project);
            }
        }
        if let Ok(org) = std::env::var("OPENAI_ORG") {
            if !org.is_empty() {
                req = req.header("OpenAI-Organization", org);
            }
        }

        let resp = req.json(&body).send().await.map_err(|e| anyhow!(e))?;
        let status = resp.status();
        tracing::debug!("chat response status: {status}");

        let text = resp.text().await.map_err(|e| anyhow!(e))?;
        if !status.is_success() {
            return Err(anyhow!("openai http {status}: {text}"));
        }
        extract_content(&text)
    }
}

fn build_body<'a>(model: &'a str, request: &'a ChatRequest) -> ChatBody<'a> {
    ChatBody {
        model,
        messages: [
            ChatMessage {
                role: "system",
                content: &request.system,
            },
            ChatMessage {
                role: "user",
                content: &request.user,
            },
        ],
        response_format: request
            .json_object
            .then_some(ResponseFormat { kind: "json_object" }),
    }
}

fn extract_content(body: &str) -> Result<Option<String>> {
    let reply: ChatReply =
        serde_json::from_str(body).map_err(|e| anyhow!("malformed chat reply: {e}"))?;
    Ok(reply
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_requests_json_object_mode() {
        let request = ChatRequest {
            system: "sys".into(),
            user: "hello".into(),
            json_object: true,
        };
        let value = serde_json::to_value(build_body("gpt-4-turbo", &request)).unwrap();
        assert_eq!(value["model"], "gpt-4-turbo");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hello");
        assert_eq!(value["response_format"]["type"], "json_object");
    }

    #[test]
    fn body_omits_format_for_plain_text() {
        let request = ChatRequest {
            system: "sys".into(),
            user: "hello".into(),
            json_object: false,
        };
        let value = serde_json::to_value(build_body("m", &request)).unwrap();
        assert!(value.get("response_format").is_none());
    }

    #[test]
    fn content_taken_from_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"slides\":[]}"}}]}"#;
        assert_eq!(
            extract_content(body).unwrap().as_deref(),
            Some(r#"{"slides":[]}"#)
        );
    }

    #[test]
    fn missing_content_is_none() {
        assert_eq!(extract_content(r#"{"choices":[]}"#).unwrap(), None);
        assert_eq!(
            extract_content(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap(),
            None
        );
    }

    #[test]
    fn garbage_reply_is_error() {
        assert!(extract_content("<html>").is_err());
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = OpenAiModelClient::new("k".into()).with_base_url("http://localhost:9/v1/");
        assert_eq!(client.base_url, "http://localhost:9/v1");
        assert_eq!(client.model, DEFAULT_MODEL);
    }
}
