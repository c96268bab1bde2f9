//! Named visual styles applied when rendering.

use serde::Serialize;

/// Colours are six digit RGB hex without a leading `#`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StyleDescriptor {
    pub primary_color: &'static str,
    pub secondary_color: &'static str,
    pub text_color: &'static str,
    pub title_font: &'static str,
    pub content_font: &'static str,
}

pub const FALLBACK_THEME: &str = "modern";

const MODERN: StyleDescriptor = StyleDescriptor {
    primary_color: "0EA5E9",
    secondary_color: "7DD3FC",
    text_color: "374151",
    title_font: "Arial",
    content_font: "Arial",
};

const BUSINESS: StyleDescriptor = StyleDescriptor {
    primary_color: "1E40AF",
    secondary_color: "3B82F6",
    text_color: "1F2937",
    title_font: "Calibri",
    content_font: "Calibri",
};

const CREATIVE: StyleDescriptor = StyleDescriptor {
    primary_color: "8B5CF6",
    secondary_color: "C4B5FD",
    text_color: "4B5563",
    title_font: "Segoe UI",
    content_font: "Segoe UI",
};

const MINIMAL: StyleDescriptor = StyleDescriptor {
    primary_color: "64748B",
    secondary_color: "94A3B8",
    text_color: "334155",
    title_font: "Helvetica",
    content_font: "Helvetica",
};

static THEMES: [(&str, StyleDescriptor); 4] = [
    ("modern", MODERN),
    ("business", BUSINESS),
    ("creative", CREATIVE),
    ("minimal", MINIMAL),
];

/// Look up a theme by name. Unknown names resolve to `modern`.
pub fn resolve(name: &str) -> &'static StyleDescriptor {
    THEMES
        .iter()
        .find(|(known, _)| *known == name)
        .map_or(&MODERN, |(_, style)| style)
}

pub fn is_known(name: &str) -> bool {
    THEMES.iter().any(|(known, _)| *known == name)
}

pub fn known_themes() -> impl Iterator<Item = (&'static str, &'static StyleDescriptor)> {
    THEMES.iter().map(|(name, style)| (*name, style))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_theme_literals() {
        let modern = resolve("modern");
        assert_eq!(modern.primary_color, "0EA5E9");
        assert_eq!(modern.title_font, "Arial");

        let business = resolve("business");
        assert_eq!(business.primary_color, "1E40AF");
        assert_eq!(business.title_font, "Calibri");

        assert_eq!(resolve("creative").primary_color, "8B5CF6");
        assert_eq!(resolve("minimal").primary_color, "64748B");
    }

    #[test]
    fn unknown_names_fall_back_to_modern() {
        for name in ["", "unknown_theme", "Modern", "business "] {
            assert_eq!(resolve(name), resolve(FALLBACK_THEME), "theme {name:?}");
        }
    }

    #[test]
    fn registry_listing_matches_lookup() {
        assert_eq!(known_themes().count(), 4);
        for (name, style) in known_themes() {
            assert!(is_known(name));
            assert!(std::ptr::eq(resolve(name), style), "theme {name}");
        }
        assert!(!is_known("unknown_theme"));
    }
}
