use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use slide_common::{Deck, GenerationOptions, Slide, DEFAULT_THEME};

use crate::client::{CompletionClient, OpenAiAdapter};
use crate::config::Config;
use crate::error::{Result, ServiceError};
use crate::generator::Generator;
use crate::render::{RenderReport, Renderer};
use crate::store::DeckStore;

pub const PPTX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// A rendered deck ready to hand to a client. `bytes` are the ones this
/// call rendered, not a re-read of the shared file.
#[derive(Debug)]
pub struct Download {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: &'static str,
    pub report: RenderReport,
}

/// Generate, fetch and download decks.
pub struct SlideService {
    generator: Generator,
    store: DeckStore,
    renderer: Renderer,
    demo_fallback: bool,
}

impl SlideService {
    pub fn new(client: Arc<dyn CompletionClient>, store: DeckStore, renderer: Renderer) -> Self {
        Self {
            generator: Generator::new(client, store.clone()),
            store,
            renderer,
            demo_fallback: false,
        }
    }

    /// Wire an OpenAI-backed service from configuration.
    pub fn from_config(config: &Config) -> Self {
        let client = OpenAiAdapter::new(
            config.api_key.clone(),
            config.model.clone(),
            config.api_base_url.clone(),
        );
        Self::new(
            Arc::new(client),
            DeckStore::new(),
            Renderer::new(config.scratch_dir.clone()),
        )
        .with_demo_fallback(config.demo_fallback)
    }

    /// Answer unknown ids with a placeholder deck. Meant for demos only.
    pub fn with_demo_fallback(mut self, enabled: bool) -> Self {
        self.demo_fallback = enabled;
        self
    }

    pub fn store(&self) -> &DeckStore {
        &self.store
    }

    pub async fn create_deck(&self, text: &str, options: &GenerationOptions) -> Result<Deck> {
        if text.trim().is_empty() {
            return Err(ServiceError::InvalidInput("text is required".to_string()));
        }
        Ok(self.generator.generate(text, options).await?)
    }

    pub async fn fetch_deck(&self, id: &str) -> Result<Deck> {
        match self.store.get(id).await {
            Ok(deck) => Ok(deck),
            Err(_) if self.demo_fallback => {
                tracing::warn!("Deck {id} not found; serving placeholder deck");
                Ok(placeholder_deck(id))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn download_deck(&self, id: &str) -> Result<Download> {
        let deck = self.fetch_deck(id).await?;
        let mut report = self.renderer.render(&deck).await?;
        let bytes = std::mem::take(&mut report.bytes);

        Ok(Download {
            path: report.path.clone(),
            bytes,
            filename: format!("presentation-{}.pptx", deck.id),
            content_type: PPTX_CONTENT_TYPE,
            report,
        })
    }
}

/// Stand-in deck served for unknown ids when demo fallback is on. Never stored.
fn placeholder_deck(id: &str) -> Deck {
    let slide = |title: &str, content: &[&str]| {
        Slide::new(title, content.iter().map(|s| s.to_string()).collect())
    };
    Deck::new(
        id.to_string(),
        vec![
            slide(
                "Presentation title",
                &[
                    "This presentation was generated automatically",
                    "See the following slides for details",
                ],
            ),
            slide(
                "Topic 1",
                &[
                    "Benefits of generated presentations",
                    "Professional slides in a fraction of the time",
                    "A consistent design theme throughout",
                ],
            ),
            slide(
                "Topic 2",
                &[
                    "Key features",
                    "Automatic structuring of text",
                    "Smart layout placement",
                ],
            ),
            slide(
                "Data analysis",
                &[
                    "Preparation time reduced by 75%",
                    "Satisfaction with slide quality up 68%",
                ],
            ),
            slide(
                "Summary",
                &[
                    "Save time and effort",
                    "Consistent design quality",
                    "Focus on the content",
                ],
            ),
        ],
        DEFAULT_THEME.to_string(),
        Utc::now(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::StaticClient;
    use crate::error::GenerationError;

    fn service(reply: &str, dir: &std::path::Path) -> SlideService {
        SlideService::new(
            Arc::new(StaticClient::new(reply)),
            DeckStore::new(),
            Renderer::new(dir),
        )
    }

    const TWO_SLIDES: &str =
        r#"{"slides":[{"title":"Hello","content":["a","b"]},{"title":"More","content":["c"]}]}"#;

    #[tokio::test]
    async fn blank_text_rejected_before_generation() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(TWO_SLIDES, dir.path());
        let err = svc
            .create_deck("  \n", &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert!(svc.store().is_empty().await);
    }

    #[tokio::test]
    async fn fetch_after_create_returns_same_deck() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(TWO_SLIDES, dir.path());
        let deck = svc
            .create_deck("topic", &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(svc.fetch_deck(&deck.id).await.unwrap(), deck);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(TWO_SLIDES, dir.path());
        assert!(matches!(
            svc.fetch_deck("nope").await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            svc.download_deck("nope").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn demo_fallback_serves_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(TWO_SLIDES, dir.path()).with_demo_fallback(true);

        let deck = svc.fetch_deck("gen-abc").await.unwrap();
        assert_eq!(deck.id, "gen-abc");
        assert_eq!(deck.slides.len(), 5);
        assert!(svc.store().is_empty().await);

        let download = svc.download_deck("gen-abc").await.unwrap();
        assert_eq!(download.report.slide_count, 5);
    }

    #[tokio::test]
    async fn download_carries_file_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service(TWO_SLIDES, dir.path());
        let deck = svc
            .create_deck("topic", &GenerationOptions::default())
            .await
            .unwrap();

        let download = svc.download_deck(&deck.id).await.unwrap();
        assert_eq!(download.filename, format!("presentation-{}.pptx", deck.id));
        assert_eq!(download.content_type, PPTX_CONTENT_TYPE);
        assert!(download.bytes.starts_with(b"PK"));
        assert_eq!(download.report.slide_count, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_downloads_of_one_deck_are_complete() {
        let dir = tempfile::tempdir().unwrap();
        let slides: Vec<_> = (0..300)
            .map(|i| serde_json::json!({"title": format!("Slide {i}"), "content": ["a", "b", "c"]}))
            .collect();
        let reply = serde_json::json!({ "slides": slides }).to_string();
        let svc = Arc::new(service(&reply, dir.path()));
        let deck = svc
            .create_deck("topic", &GenerationOptions::default())
            .await
            .unwrap();

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let svc = svc.clone();
                let id = deck.id.clone();
                tokio::spawn(async move { svc.download_deck(&id).await })
            })
            .collect();
        for handle in handles {
            let download = handle.await.unwrap().unwrap();
            let outline = crate::render::read_outline(&download.bytes).unwrap();
            assert_eq!(outline.len(), 300);
            assert_eq!(outline[299].title, "Slide 299");
        }
    }

    #[tokio::test]
    async fn generation_error_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let svc = service("{broken", dir.path());
        let err = svc
            .create_deck("topic", &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Generation(GenerationError::Decode(_))
        ));
    }
}
