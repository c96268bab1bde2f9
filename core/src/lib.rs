//! Core library: turns free text into slide decks, keeps them in memory and
//! renders them to `.pptx` files.

pub mod client;
pub mod config;
pub mod error;
pub mod generator;
pub mod render;
pub mod service;
pub mod store;
pub mod theme;

pub use client::{CompletionClient, OpenAiAdapter, StaticClient};
pub use config::Config;
pub use error::{GenerationError, NotFoundError, RenderError, ServiceError};
pub use generator::Generator;
pub use render::{RenderReport, Renderer, SkippedSlide};
pub use service::{Download, SlideService};
pub use store::DeckStore;
