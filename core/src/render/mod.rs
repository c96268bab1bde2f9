//! Deck renderer: lays slides out and writes a `.pptx` per deck id.

pub mod outline;
pub mod package;

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Utc;
use slide_common::{Deck, Slide};

use crate::error::RenderError;
use crate::theme::{self, FALLBACK_THEME};
use package::{Layout, PresentationPackage};

pub use outline::{read_outline, SlideOutline};

/// Subtitle lines taken from the first slide's content.
const SUBTITLE_LINES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSlide {
    pub index: usize,
    pub reason: String,
}

#[derive(Clone)]
pub struct RenderReport {
    pub path: PathBuf,
    /// The package exactly as written to `path` by this render.
    pub bytes: Vec<u8>,
    /// Slides present in the written file.
    pub slide_count: usize,
    /// Deck indices that made it into the file.
    pub rendered: Vec<usize>,
    pub skipped: Vec<SkippedSlide>,
    /// Set when the deck itself could not be rendered and a diagnostic deck
    /// was written in its place; holds the original failure.
    pub diagnostic: Option<String>,
}

impl fmt::Debug for RenderReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderReport")
            .field("path", &self.path)
            .field("bytes", &self.bytes.len())
            .field("slide_count", &self.slide_count)
            .field("rendered", &self.rendered)
            .field("skipped", &self.skipped)
            .field("diagnostic", &self.diagnostic)
            .finish()
    }
}

struct Built {
    package: PresentationPackage,
    rendered: Vec<usize>,
    skipped: Vec<SkippedSlide>,
}

impl Built {
    /// Serialise the package. A deck with slides of which none survived
    /// has nothing to show and counts as a failed render.
    fn assemble(&self) -> Result<Vec<u8>, RenderError> {
        if self.rendered.is_empty() && !self.skipped.is_empty() {
            return Err(RenderError::Package(format!(
                "none of the {} slide(s) could be rendered",
                self.skipped.len()
            )));
        }
        self.package.to_bytes()
    }
}

pub struct Renderer {
    scratch_dir: PathBuf,
}

impl Renderer {
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Where the file for deck `id` is written. Stable across renders.
    pub fn output_path(&self, id: &str) -> PathBuf {
        let safe: String = id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.scratch_dir.join(format!("presentation-{safe}.pptx"))
    }

    /// Render `deck` to its output path, replacing any earlier render.
    ///
    /// Concurrent renders of one id each get their own bytes back; the file
    /// on disk is always a complete package from whichever finished last.
    pub async fn render(&self, deck: &Deck) -> Result<RenderReport, RenderError> {
        let path = self.output_path(&deck.id);
        let built = build(deck);
        for skipped in &built.skipped {
            tracing::warn!(
                "Skipped slide {} of deck {}: {}",
                skipped.index,
                deck.id,
                skipped.reason
            );
        }

        let (bytes, slide_count, diagnostic) = match built.assemble() {
            Ok(bytes) => (bytes, built.package.slide_count(), None),
            Err(original) => {
                let original = original.to_string();
                tracing::error!("Error generating PowerPoint file for {}: {original}", deck.id);

                let fallback = build(&diagnostic_deck(deck, &original));
                let bytes = fallback.assemble().map_err(|e| RenderError::FallbackFailed {
                    original: original.clone(),
                    fallback: e.to_string(),
                })?;
                (bytes, fallback.package.slide_count(), Some(original))
            }
        };

        self.write(&path, &bytes).await?;
        tracing::info!(
            "Rendered deck {} ({slide_count} slide(s)) to {}",
            deck.id,
            path.display()
        );

        Ok(RenderReport {
            path,
            bytes,
            slide_count,
            rendered: built.rendered,
            skipped: built.skipped,
            diagnostic,
        })
    }

    /// Write through a uniquely named temp file in the scratch directory and
    /// rename it over `path`, so readers never see a partial package.
    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), RenderError> {
        tokio::fs::create_dir_all(&self.scratch_dir).await?;
        let tmp = self
            .scratch_dir
            .join(format!(".render-{}.tmp", uuid::Uuid::new_v4()));

        let result = async {
            tokio::fs::write(&tmp, bytes).await?;
            tokio::fs::rename(&tmp, path).await
        }
        .await;
        if let Err(e) = result {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }
}

fn build(deck: &Deck) -> Built {
    let theme_name = if theme::is_known(&deck.theme) {
        deck.theme.as_str()
    } else {
        FALLBACK_THEME
    };
    let mut package = PresentationPackage::new(theme_name, theme::resolve(&deck.theme));

    let results: Vec<Result<usize, SkippedSlide>> = deck
        .slides
        .iter()
        .enumerate()
        .map(|(index, slide)| add_slide(&mut package, index, slide))
        .collect();

    let mut rendered = Vec::new();
    let mut skipped = Vec::new();
    for result in results {
        match result {
            Ok(index) => rendered.push(index),
            Err(skip) => skipped.push(skip),
        }
    }

    Built {
        package,
        rendered,
        skipped,
    }
}

/// Index 0 uses the title layout, everything after it the content layout.
fn add_slide(
    package: &mut PresentationPackage,
    index: usize,
    slide: &Slide,
) -> Result<usize, SkippedSlide> {
    check_text(&slide.title)
        .and_then(|()| slide.content.iter().try_for_each(|line| check_text(line)))
        .map_err(|reason| SkippedSlide { index, reason })?;

    if index == 0 {
        let part = package.add_slide(Layout::Title);
        part.set_title(&slide.title);
        if !slide.content.is_empty() {
            let subtitle = slide
                .content
                .iter()
                .take(SUBTITLE_LINES)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("\n");
            part.add_paragraph(&subtitle, 0);
        }
    } else {
        let part = package.add_slide(Layout::Content);
        part.set_title(&slide.title);
        for line in &slide.content {
            part.add_paragraph(line, 0);
        }
    }
    Ok(index)
}

/// Text must consist of characters XML 1.0 can carry.
fn check_text(text: &str) -> Result<(), String> {
    match text.chars().find(|&c| !is_xml_char(c)) {
        Some(c) => Err(format!(
            "contains character U+{:04X} which cannot be stored",
            c as u32
        )),
        None => Ok(()),
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r')
        || ('\u{20}'..='\u{D7FF}').contains(&c)
        || ('\u{E000}'..='\u{FFFD}').contains(&c)
        || c >= '\u{10000}'
}

fn diagnostic_deck(deck: &Deck, error: &str) -> Deck {
    let error: String = error.chars().filter(|&c| is_xml_char(c)).collect();
    Deck::new(
        deck.id.clone(),
        vec![
            Slide::new(
                "Presentation could not be rendered",
                vec![format!("Deck {}", deck.id)],
            ),
            Slide::new("Error", vec![error]),
        ],
        FALLBACK_THEME.to_string(),
        Utc::now(),
    )
}
