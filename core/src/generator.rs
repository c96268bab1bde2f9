//! Turns free text into a validated slide list via the completion collaborator.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use slide_chatgpt::ChatRequest;
use slide_common::{Deck, GenerationOptions, Slide};

use crate::client::CompletionClient;
use crate::error::GenerationError;
use crate::store::DeckStore;

pub struct Generator {
    client: Arc<dyn CompletionClient>,
    store: DeckStore,
}

/// Slides that survived validation, plus the indices of dropped candidates.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ParsedSlides {
    pub slides: Vec<Slide>,
    pub dropped: Vec<usize>,
}

#[derive(Debug, Deserialize)]
struct SlideDocument {
    #[serde(default)]
    slides: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct CandidateSlide {
    title: String,
    content: Vec<String>,
    #[serde(default, deserialize_with = "string_or_none")]
    image_url: Option<String>,
}

/// Optional fields tolerate any JSON value; only strings are kept.
fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

impl Generator {
    pub fn new(client: Arc<dyn CompletionClient>, store: DeckStore) -> Self {
        Self { client, store }
    }

    /// Generate a deck from `text` and insert it into the store.
    ///
    /// Fails without touching the store if the collaborator errors, sends
    /// nothing back, or sends something that is not a slide document.
    pub async fn generate(
        &self,
        text: &str,
        options: &GenerationOptions,
    ) -> Result<Deck, GenerationError> {
        let request = ChatRequest {
            system: system_prompt(&options.theme, options.slide_count),
            user: text.to_string(),
            json_object: true,
        };

        let reply = self.client.complete(request).await.map_err(|e| {
            tracing::error!("Error generating presentation: {e}");
            e
        })?;
        let reply = reply
            .filter(|body| !body.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)?;

        let parsed = parse_slides(&reply)?;
        if !parsed.dropped.is_empty() {
            tracing::warn!(
                "Dropped {} malformed slide(s) at {:?}",
                parsed.dropped.len(),
                parsed.dropped
            );
        }

        // Image generation is not implemented; `include_images` is ignored.
        let deck = Deck::new(
            uuid::Uuid::new_v4().to_string(),
            parsed.slides,
            options.theme.clone(),
            Utc::now(),
        );
        self.store.put(deck.clone()).await;

        tracing::info!(
            "Created deck {} with {} slide(s), theme {}",
            deck.id,
            deck.slides.len(),
            deck.theme
        );
        Ok(deck)
    }
}

/// Instruction sent alongside the user's text.
pub fn system_prompt(theme: &str, slide_count: usize) -> String {
    format!(
        r#"You are a presentation specialist who turns text into high quality slide decks.
Create the slides using this theme: {theme}
Aim for about {slide_count} slides.
Every slide must have a title and a list of content items.
Return the result as JSON in exactly this format:
{{
  "slides": [
    {{
      "title": "Slide title",
      "content": ["Content item 1", "Content item 2"]
    }}
  ]
}}"#
    )
}

/// Decode a reply into slides. The envelope must be a JSON object; entries
/// inside `slides` that lack a string `title` or a string-list `content`
/// are dropped and the rest kept in order.
pub fn parse_slides(reply: &str) -> Result<ParsedSlides, GenerationError> {
    let document: SlideDocument = serde_json::from_str(reply)?;

    let mut parsed = ParsedSlides::default();
    for (index, candidate) in document.slides.into_iter().enumerate() {
        match serde_json::from_value::<CandidateSlide>(candidate) {
            Ok(candidate) => parsed.slides.push(Slide {
                title: candidate.title,
                content: candidate.content,
                image_url: candidate.image_url,
            }),
            Err(e) => {
                tracing::debug!("slide {index} rejected: {e}");
                parsed.dropped.push(index);
            }
        }
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::StaticClient;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingClient {
        reply: String,
        seen: Mutex<Vec<ChatRequest>>,
    }

    #[async_trait]
    impl CompletionClient for RecordingClient {
        async fn complete(&self, request: ChatRequest) -> Result<Option<String>, GenerationError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(request);
            }
            Ok(Some(self.reply.clone()))
        }
    }

    struct FailingClient;

    #[async_trait]
    impl CompletionClient for FailingClient {
        async fn complete(&self, _request: ChatRequest) -> Result<Option<String>, GenerationError> {
            Err(GenerationError::Transport("connection refused".into()))
        }
    }

    fn setup(client: impl CompletionClient + 'static) -> (Generator, DeckStore) {
        let store = DeckStore::new();
        (Generator::new(Arc::new(client), store.clone()), store)
    }

    #[test]
    fn malformed_entries_are_dropped_in_place() {
        let reply = r#"{"slides":[
            {"title":"One","content":["a","b"]},
            {"content":["no title"]},
            {"title":"Two","content":[]},
            {"title":"No content"},
            {"title":"Bad content","content":"not a list"},
            {"title":"Three","content":["c"],"image_url":"http://img"}
        ]}"#;
        let parsed = parse_slides(reply).unwrap();
        let titles: Vec<_> = parsed.slides.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["One", "Two", "Three"]);
        assert_eq!(parsed.dropped, [1, 3, 4]);
        assert_eq!(parsed.slides[0].content, ["a", "b"]);
        assert_eq!(parsed.slides[2].image_url.as_deref(), Some("http://img"));
    }

    #[test]
    fn odd_image_url_does_not_drop_slide() {
        let reply = r#"{"slides":[
            {"title":"A","content":["x"],"image_url":123},
            {"title":"B","content":["y"]},
            {"title":"C","content":[],"image_url":{"src":"http://img"}},
            {"title":"D","content":["z"],"image_url":null}
        ]}"#;
        let parsed = parse_slides(reply).unwrap();
        assert_eq!(parsed.slides.len(), 4);
        assert!(parsed.dropped.is_empty());
        assert!(parsed.slides.iter().all(|s| s.image_url.is_none()));
        assert_eq!(parsed.slides[0].title, "A");
    }

    #[test]
    fn missing_slides_key_means_no_slides() {
        assert_eq!(parse_slides("{}").unwrap(), ParsedSlides::default());
    }

    #[test]
    fn non_object_reply_fails() {
        assert!(matches!(
            parse_slides("[1,2]"),
            Err(GenerationError::Decode(_))
        ));
        assert!(matches!(
            parse_slides("Sure! Here are your slides"),
            Err(GenerationError::Decode(_))
        ));
        assert!(matches!(
            parse_slides(r#"{"slides": "none"}"#),
            Err(GenerationError::Decode(_))
        ));
    }

    #[test]
    fn prompt_mentions_theme_and_count() {
        let prompt = system_prompt("business", 5);
        assert!(prompt.contains("theme: business"));
        assert!(prompt.contains("about 5 slides"));
        assert!(prompt.contains(r#""slides": ["#));
    }

    #[tokio::test]
    async fn generate_stores_and_returns_deck() {
        let client = RecordingClient {
            reply: r#"{"slides":[{"title":"Intro","content":["x"]},{"title":"Bad"}]}"#.into(),
            seen: Mutex::new(Vec::new()),
        };
        let store = DeckStore::new();
        let client = Arc::new(client);
        let generator = Generator::new(client.clone(), store.clone());

        let options = GenerationOptions::default().with_theme("creative").with_slide_count(3);
        let deck = generator.generate("Quarterly update", &options).await.unwrap();

        assert_eq!(deck.slides.len(), 1);
        assert_eq!(deck.theme, "creative");
        assert_eq!(deck.download_url, format!("/api/presentations/{}/download", deck.id));
        assert_eq!(store.get(&deck.id).await.unwrap(), deck);

        let seen = client.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].user, "Quarterly update");
        assert!(seen[0].json_object);
        assert!(seen[0].system.contains("about 3 slides"));
    }

    #[tokio::test]
    async fn unknown_theme_kept_verbatim() {
        let (generator, _) = setup(StaticClient::new(r#"{"slides":[]}"#));
        let options = GenerationOptions::default().with_theme("neon");
        let deck = generator.generate("t", &options).await.unwrap();
        assert_eq!(deck.theme, "neon");
        assert!(deck.slides.is_empty());
    }

    #[tokio::test]
    async fn each_deck_gets_a_fresh_id() {
        let (generator, store) = setup(StaticClient::new(r#"{"slides":[]}"#));
        let options = GenerationOptions::default();
        let a = generator.generate("t", &options).await.unwrap();
        let b = generator.generate("t", &options).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn failures_store_nothing() {
        let options = GenerationOptions::default();

        let (generator, store) = setup(StaticClient::empty());
        assert!(matches!(
            generator.generate("t", &options).await,
            Err(GenerationError::EmptyResponse)
        ));
        assert!(store.is_empty().await);

        let (generator, store) = setup(StaticClient::new("   "));
        assert!(matches!(
            generator.generate("t", &options).await,
            Err(GenerationError::EmptyResponse)
        ));
        assert!(store.is_empty().await);

        let (generator, store) = setup(StaticClient::new("not json"));
        assert!(matches!(
            generator.generate("t", &options).await,
            Err(GenerationError::Decode(_))
        ));
        assert!(store.is_empty().await);

        let (generator, store) = setup(FailingClient);
        let err = generator.generate("t", &options).await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
        assert!(store.is_empty().await);
    }
}
