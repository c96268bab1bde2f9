use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_THEME: &str = "modern";
pub const DEFAULT_SLIDE_COUNT: usize = 10;

/// Options that steer deck generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_slide_count", alias = "slideCount")]
    pub slide_count: usize,
    /// Reserved. Image generation is not implemented, so this has no effect.
    #[serde(default = "default_include_images", alias = "includeImages")]
    pub include_images: bool,
}

fn default_theme() -> String {
    DEFAULT_THEME.to_string()
}

fn default_slide_count() -> usize {
    DEFAULT_SLIDE_COUNT
}

fn default_include_images() -> bool {
    true
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            slide_count: default_slide_count(),
            include_images: default_include_images(),
        }
    }
}

impl GenerationOptions {
    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self
    }

    pub fn with_slide_count(mut self, slide_count: usize) -> Self {
        self.slide_count = slide_count;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    pub title: String,
    /// Bullet lines in display order.
    pub content: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Slide {
    pub fn new(title: impl Into<String>, content: Vec<String>) -> Self {
        Self {
            title: title.into(),
            content,
            image_url: None,
        }
    }
}

/// A generated deck. Never mutated once it has been stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    pub id: String,
    pub slides: Vec<Slide>,
    pub theme: String,
    pub created_at: DateTime<Utc>,
    pub download_url: String,
}

impl Deck {
    pub fn new(id: String, slides: Vec<Slide>, theme: String, created_at: DateTime<Utc>) -> Self {
        let download_url = download_locator(&id);
        Self {
            id,
            slides,
            theme,
            created_at,
            download_url,
        }
    }
}

/// Address from which the rendered file for `id` can be downloaded.
pub fn download_locator(id: &str) -> String {
    format!("/api/presentations/{id}/download")
}

/// Body of a generate request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub options: GenerationOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default_when_fields_missing() {
        let opts: GenerationOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, GenerationOptions::default());
        assert_eq!(opts.theme, "modern");
        assert_eq!(opts.slide_count, 10);
    }

    #[test]
    fn options_accept_both_spellings() {
        let snake: GenerationOptions =
            serde_json::from_str(r#"{"theme":"business","slide_count":5,"include_images":false}"#)
                .unwrap();
        let camel: GenerationOptions =
            serde_json::from_str(r#"{"theme":"business","slideCount":5,"includeImages":false}"#)
                .unwrap();
        assert_eq!(snake, camel);
        assert_eq!(snake.slide_count, 5);
    }

    #[test]
    fn download_url_follows_id() {
        let deck = Deck::new("abc".into(), vec![], "modern".into(), Utc::now());
        assert_eq!(deck.download_url, "/api/presentations/abc/download");
    }

    #[test]
    fn slide_without_image_omits_field() {
        let slide = Slide::new("Intro", vec!["a".into()]);
        let json = serde_json::to_value(&slide).unwrap();
        assert!(json.get("image_url").is_none());
    }
}
