//! Reads a rendered package back into per-slide text.

use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::package::Layout;
use crate::error::RenderError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideOutline {
    pub layout: Layout,
    pub title: String,
    /// Body (or subtitle) paragraphs; line breaks inside a paragraph are `\n`.
    pub paragraphs: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    Title,
    CenteredTitle,
    Body,
}

/// Outline of every slide in a `.pptx` produced by this crate, in order.
pub fn read_outline(bytes: &[u8]) -> Result<Vec<SlideOutline>, RenderError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut outlines = Vec::new();

    for n in 1.. {
        let xml = {
            let mut file = match archive.by_name(&format!("ppt/slides/slide{n}.xml")) {
                Ok(file) => file,
                Err(zip::result::ZipError::FileNotFound) => break,
                Err(e) => return Err(e.into()),
            };
            let mut xml = String::new();
            file.read_to_string(&mut xml)?;
            xml
        };
        outlines.push(parse_slide(&xml)?);
    }

    Ok(outlines)
}

fn placeholder_kind(e: &BytesStart<'_>) -> Result<Placeholder, RenderError> {
    let kind = e
        .try_get_attribute("type")
        .map_err(|err| RenderError::Package(err.to_string()))?;
    Ok(match kind.as_ref().map(|attr| attr.value.as_ref()) {
        Some(b"title") => Placeholder::Title,
        Some(b"ctrTitle") => Placeholder::CenteredTitle,
        _ => Placeholder::Body,
    })
}

fn parse_slide(xml: &str) -> Result<SlideOutline, RenderError> {
    let mut reader = Reader::from_str(xml);

    let mut outline = SlideOutline {
        layout: Layout::Content,
        title: String::new(),
        paragraphs: Vec::new(),
    };
    let mut placeholder = Placeholder::Body;
    let mut shape_paragraphs: Vec<String> = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"p:sp" => {
                    placeholder = Placeholder::Body;
                    shape_paragraphs.clear();
                }
                b"p:ph" => placeholder = placeholder_kind(&e)?,
                b"a:p" => current = Some(String::new()),
                b"a:t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"p:ph" => placeholder = placeholder_kind(&e)?,
                b"a:br" => {
                    if let Some(text) = current.as_mut() {
                        text.push('\n');
                    }
                }
                b"a:p" => shape_paragraphs.push(String::new()),
                _ => {}
            },
            Event::Text(t) => {
                if in_text {
                    if let Some(text) = current.as_mut() {
                        text.push_str(&t.unescape()?);
                    }
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"a:t" => in_text = false,
                b"a:p" => {
                    if let Some(text) = current.take() {
                        shape_paragraphs.push(text);
                    }
                }
                b"p:sp" => match placeholder {
                    Placeholder::Title | Placeholder::CenteredTitle => {
                        if placeholder == Placeholder::CenteredTitle {
                            outline.layout = Layout::Title;
                        }
                        outline.title = shape_paragraphs.join("\n");
                    }
                    Placeholder::Body => outline.paragraphs.append(&mut shape_paragraphs),
                },
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(outline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::package::PresentationPackage;
    use crate::theme;

    #[test]
    fn outline_matches_what_was_written() {
        let mut pres = PresentationPackage::new("modern", theme::resolve("modern"));
        let first = pres.add_slide(Layout::Title);
        first.set_title("Welcome & hello");
        first.add_paragraph("one\ntwo", 0);
        let second = pres.add_slide(Layout::Content);
        second.set_title("Agenda");
        second.add_paragraph("<first>", 0);
        second.add_paragraph("second", 0);
        pres.add_slide(Layout::Content).set_title("Empty");

        let outline = read_outline(&pres.to_bytes().unwrap()).unwrap();
        assert_eq!(
            outline,
            vec![
                SlideOutline {
                    layout: Layout::Title,
                    title: "Welcome & hello".into(),
                    paragraphs: vec!["one\ntwo".into()],
                },
                SlideOutline {
                    layout: Layout::Content,
                    title: "Agenda".into(),
                    paragraphs: vec!["<first>".into(), "second".into()],
                },
                SlideOutline {
                    layout: Layout::Content,
                    title: "Empty".into(),
                    paragraphs: vec![],
                },
            ]
        );
    }

    #[test]
    fn not_a_zip_is_an_error() {
        assert!(read_outline(b"plain text").is_err());
    }
}
