//! Office Open XML presentation package writer.
//!
//! Produces a self-contained `.pptx` with one slide master, a title layout
//! and a title-and-content layout, and a theme part derived from a
//! [`StyleDescriptor`].

use std::fmt::Write as FmtWrite;
use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::RenderError;
use crate::theme::StyleDescriptor;

/// 16:9 slide size in EMUs (914400 EMU = 1 inch).
pub const SLIDE_WIDTH: i64 = 12_192_000;
pub const SLIDE_HEIGHT: i64 = 6_858_000;

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_PKG_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// First relationship id in `presentation.xml.rels` used for slides.
const FIRST_SLIDE_REL: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Centered title with an optional subtitle.
    Title,
    /// Title with a bulleted body.
    Content,
}

impl Layout {
    fn part_number(self) -> usize {
        match self {
            Layout::Title => 1,
            Layout::Content => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Paragraph {
    lines: Vec<String>,
    level: u32,
}

impl Paragraph {
    fn new(text: &str, level: u32) -> Self {
        Self {
            lines: text.split('\n').map(str::to_string).collect(),
            level,
        }
    }
}

/// One slide being assembled.
#[derive(Debug, Clone)]
pub struct SlidePart {
    layout: Layout,
    title: Option<Paragraph>,
    body: Vec<Paragraph>,
}

impl SlidePart {
    fn new(layout: Layout) -> Self {
        Self {
            layout,
            title: None,
            body: Vec::new(),
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = Some(Paragraph::new(title, 0));
    }

    /// Append a body paragraph. On a title layout the body is the subtitle.
    pub fn add_paragraph(&mut self, text: &str, level: u32) {
        self.body.push(Paragraph::new(text, level));
    }

    pub fn paragraph_count(&self) -> usize {
        self.body.len()
    }

    fn to_xml(&self, style: &StyleDescriptor) -> Result<String, RenderError> {
        let mut xml = String::with_capacity(2048);
        xml.push_str(XML_DECL);
        write!(
            xml,
            r#"<p:sld xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld><p:spTree>"#
        )?;
        write_group_header(&mut xml);

        let (title_ph, body_ph, body_color) = match self.layout {
            Layout::Title => (
                r#"<p:ph type="ctrTitle"/>"#,
                r#"<p:ph type="subTitle" idx="1"/>"#,
                style.secondary_color,
            ),
            Layout::Content => (
                r#"<p:ph type="title"/>"#,
                r#"<p:ph idx="1"/>"#,
                style.text_color,
            ),
        };

        if let Some(title) = &self.title {
            open_shape(&mut xml, 2, "Title 1", title_ph, None)?;
            write_paragraph(&mut xml, title, style.primary_color, style.title_font)?;
            close_shape(&mut xml);
        }

        if !self.body.is_empty() {
            open_shape(&mut xml, 3, "Content Placeholder 2", body_ph, None)?;
            for paragraph in &self.body {
                write_paragraph(&mut xml, paragraph, body_color, style.content_font)?;
            }
            close_shape(&mut xml);
        }

        xml.push_str("</p:spTree></p:cSld>");
        xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
        xml.push_str("</p:sld>");
        Ok(xml)
    }
}

/// A presentation under construction.
#[derive(Debug)]
pub struct PresentationPackage {
    theme_name: String,
    style: StyleDescriptor,
    slides: Vec<SlidePart>,
}

impl PresentationPackage {
    pub fn new(theme_name: &str, style: &StyleDescriptor) -> Self {
        Self {
            theme_name: theme_name.to_string(),
            style: *style,
            slides: Vec::new(),
        }
    }

    pub fn add_slide(&mut self, layout: Layout) -> &mut SlidePart {
        self.slides.push(SlidePart::new(layout));
        let last = self.slides.len() - 1;
        &mut self.slides[last]
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Serialize every part into a zip container.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RenderError> {
        let mut parts: Vec<(String, String)> = vec![
            ("[Content_Types].xml".into(), self.content_types_xml()?),
            ("_rels/.rels".into(), package_rels_xml()?),
            ("ppt/presentation.xml".into(), self.presentation_xml()?),
            (
                "ppt/_rels/presentation.xml.rels".into(),
                self.presentation_rels_xml()?,
            ),
            ("ppt/presProps.xml".into(), pres_props_xml()?),
            ("ppt/tableStyles.xml".into(), table_styles_xml()),
            ("ppt/theme/theme1.xml".into(), self.theme_xml()?),
            (
                "ppt/slideMasters/slideMaster1.xml".into(),
                slide_master_xml()?,
            ),
            (
                "ppt/slideMasters/_rels/slideMaster1.xml.rels".into(),
                slide_master_rels_xml()?,
            ),
            (
                "ppt/slideLayouts/slideLayout1.xml".into(),
                slide_layout_xml(Layout::Title)?,
            ),
            (
                "ppt/slideLayouts/slideLayout2.xml".into(),
                slide_layout_xml(Layout::Content)?,
            ),
            (
                "ppt/slideLayouts/_rels/slideLayout1.xml.rels".into(),
                layout_rels_xml()?,
            ),
            (
                "ppt/slideLayouts/_rels/slideLayout2.xml.rels".into(),
                layout_rels_xml()?,
            ),
        ];

        for (i, slide) in self.slides.iter().enumerate() {
            let n = i + 1;
            parts.push((format!("ppt/slides/slide{n}.xml"), slide.to_xml(&self.style)?));
            parts.push((
                format!("ppt/slides/_rels/slide{n}.xml.rels"),
                slide_rels_xml(slide.layout)?,
            ));
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        for (name, xml) in &parts {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(xml.as_bytes())?;
        }
        Ok(zip.finish()?.into_inner())
    }

    fn content_types_xml(&self) -> Result<String, RenderError> {
        let mut xml = String::with_capacity(2048);
        xml.push_str(XML_DECL);
        xml.push_str(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        );
        xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
        xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);

        let pml = "application/vnd.openxmlformats-officedocument.presentationml";
        let overrides = [
            ("/ppt/presentation.xml", format!("{pml}.presentation.main+xml")),
            ("/ppt/presProps.xml", format!("{pml}.presProps+xml")),
            ("/ppt/tableStyles.xml", format!("{pml}.tableStyles+xml")),
            (
                "/ppt/theme/theme1.xml",
                "application/vnd.openxmlformats-officedocument.theme+xml".to_string(),
            ),
            (
                "/ppt/slideMasters/slideMaster1.xml",
                format!("{pml}.slideMaster+xml"),
            ),
            (
                "/ppt/slideLayouts/slideLayout1.xml",
                format!("{pml}.slideLayout+xml"),
            ),
            (
                "/ppt/slideLayouts/slideLayout2.xml",
                format!("{pml}.slideLayout+xml"),
            ),
        ];
        for (part, content_type) in &overrides {
            write!(
                xml,
                r#"<Override PartName="{part}" ContentType="{content_type}"/>"#
            )?;
        }
        for n in 1..=self.slides.len() {
            write!(
                xml,
                r#"<Override PartName="/ppt/slides/slide{n}.xml" ContentType="{pml}.slide+xml"/>"#
            )?;
        }
        xml.push_str("</Types>");
        Ok(xml)
    }

    fn presentation_xml(&self) -> Result<String, RenderError> {
        let mut xml = String::with_capacity(1024);
        xml.push_str(XML_DECL);
        write!(
            xml,
            r#"<p:presentation xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" saveSubsetFonts="1">"#
        )?;
        xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);
        if !self.slides.is_empty() {
            xml.push_str("<p:sldIdLst>");
            for i in 0..self.slides.len() {
                write!(
                    xml,
                    r#"<p:sldId id="{}" r:id="rId{}"/>"#,
                    256 + i,
                    FIRST_SLIDE_REL + i
                )?;
            }
            xml.push_str("</p:sldIdLst>");
        }
        write!(
            xml,
            r#"<p:sldSz cx="{SLIDE_WIDTH}" cy="{SLIDE_HEIGHT}"/><p:notesSz cx="6858000" cy="9144000"/>"#
        )?;
        xml.push_str("</p:presentation>");
        Ok(xml)
    }

    fn presentation_rels_xml(&self) -> Result<String, RenderError> {
        let mut rels = vec![
            (
                "rId1".to_string(),
                "slideMaster",
                "slideMasters/slideMaster1.xml".to_string(),
            ),
            ("rId2".to_string(), "theme", "theme/theme1.xml".to_string()),
            ("rId3".to_string(), "presProps", "presProps.xml".to_string()),
            ("rId4".to_string(), "tableStyles", "tableStyles.xml".to_string()),
        ];
        for i in 0..self.slides.len() {
            rels.push((
                format!("rId{}", FIRST_SLIDE_REL + i),
                "slide",
                format!("slides/slide{}.xml", i + 1),
            ));
        }
        relationships_xml(&rels)
    }

    fn theme_xml(&self) -> Result<String, RenderError> {
        let style = &self.style;
        let name = escape(self.theme_name.as_str());
        let mut xml = String::with_capacity(4096);
        xml.push_str(XML_DECL);
        write!(xml, r#"<a:theme xmlns:a="{NS_A}" name="{name}"><a:themeElements>"#)?;

        write!(xml, r#"<a:clrScheme name="{name}">"#)?;
        let colors = [
            ("dk1", style.text_color),
            ("lt1", "FFFFFF"),
            ("dk2", style.text_color),
            ("lt2", "F3F4F6"),
            ("accent1", style.primary_color),
            ("accent2", style.secondary_color),
            ("accent3", "10B981"),
            ("accent4", "F59E0B"),
            ("accent5", "EF4444"),
            ("accent6", "6366F1"),
            ("hlink", style.primary_color),
            ("folHlink", style.secondary_color),
        ];
        for (slot, color) in colors {
            write!(xml, r#"<a:{slot}><a:srgbClr val="{color}"/></a:{slot}>"#)?;
        }
        xml.push_str("</a:clrScheme>");

        write!(
            xml,
            r#"<a:fontScheme name="{name}"><a:majorFont><a:latin typeface="{}"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="{}"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme>"#,
            escape(style.title_font),
            escape(style.content_font)
        )?;

        write!(xml, r#"<a:fmtScheme name="{name}">"#)?;
        let solid = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
        write!(xml, "<a:fillStyleLst>{solid}{solid}{solid}</a:fillStyleLst>")?;
        xml.push_str("<a:lnStyleLst>");
        for width in [6350, 12700, 19050] {
            write!(xml, r#"<a:ln w="{width}">{solid}</a:ln>"#)?;
        }
        xml.push_str("</a:lnStyleLst>");
        xml.push_str("<a:effectStyleLst>");
        for _ in 0..3 {
            xml.push_str("<a:effectStyle><a:effectLst/></a:effectStyle>");
        }
        xml.push_str("</a:effectStyleLst>");
        write!(
            xml,
            "<a:bgFillStyleLst>{solid}{solid}{solid}</a:bgFillStyleLst>"
        )?;
        xml.push_str("</a:fmtScheme>");

        xml.push_str("</a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>");
        Ok(xml)
    }
}

fn write_group_header(xml: &mut String) {
    xml.push_str(r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#);
    xml.push_str(r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#);
}

/// Placeholder frame in EMUs: x, y, cx, cy.
type Frame = (i64, i64, i64, i64);

fn open_shape(
    xml: &mut String,
    id: u32,
    name: &str,
    placeholder: &str,
    frame: Option<Frame>,
) -> Result<(), RenderError> {
    write!(
        xml,
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr>{placeholder}</p:nvPr></p:nvSpPr>"#
    )?;
    match frame {
        Some((x, y, cx, cy)) => write!(
            xml,
            r#"<p:spPr><a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm></p:spPr>"#
        )?,
        None => xml.push_str("<p:spPr/>"),
    }
    xml.push_str("<p:txBody><a:bodyPr/><a:lstStyle/>");
    Ok(())
}

fn close_shape(xml: &mut String) {
    xml.push_str("</p:txBody></p:sp>");
}

fn write_paragraph(
    xml: &mut String,
    paragraph: &Paragraph,
    color: &str,
    font: &str,
) -> Result<(), RenderError> {
    write!(xml, r#"<a:p><a:pPr lvl="{}"/>"#, paragraph.level)?;
    for (i, line) in paragraph.lines.iter().enumerate() {
        if i > 0 {
            xml.push_str("<a:br/>");
        }
        write!(
            xml,
            r#"<a:r><a:rPr lang="en-US" dirty="0"><a:solidFill><a:srgbClr val="{color}"/></a:solidFill><a:latin typeface="{}"/></a:rPr><a:t>{}</a:t></a:r>"#,
            escape(font),
            escape(line.as_str())
        )?;
    }
    xml.push_str("</a:p>");
    Ok(())
}

fn relationships_xml(rels: &[(String, &str, String)]) -> Result<String, RenderError> {
    let mut xml = String::with_capacity(512);
    xml.push_str(XML_DECL);
    write!(xml, r#"<Relationships xmlns="{NS_PKG_RELS}">"#)?;
    for (id, kind, target) in rels {
        write!(
            xml,
            r#"<Relationship Id="{id}" Type="{REL_BASE}/{kind}" Target="{target}"/>"#
        )?;
    }
    xml.push_str("</Relationships>");
    Ok(xml)
}

fn package_rels_xml() -> Result<String, RenderError> {
    relationships_xml(&[(
        "rId1".to_string(),
        "officeDocument",
        "ppt/presentation.xml".to_string(),
    )])
}

fn slide_master_rels_xml() -> Result<String, RenderError> {
    relationships_xml(&[
        (
            "rId1".to_string(),
            "slideLayout",
            "../slideLayouts/slideLayout1.xml".to_string(),
        ),
        (
            "rId2".to_string(),
            "slideLayout",
            "../slideLayouts/slideLayout2.xml".to_string(),
        ),
        ("rId3".to_string(), "theme", "../theme/theme1.xml".to_string()),
    ])
}

fn layout_rels_xml() -> Result<String, RenderError> {
    relationships_xml(&[(
        "rId1".to_string(),
        "slideMaster",
        "../slideMasters/slideMaster1.xml".to_string(),
    )])
}

fn slide_rels_xml(layout: Layout) -> Result<String, RenderError> {
    relationships_xml(&[(
        "rId1".to_string(),
        "slideLayout",
        format!("../slideLayouts/slideLayout{}.xml", layout.part_number()),
    )])
}

fn pres_props_xml() -> Result<String, RenderError> {
    let mut xml = String::with_capacity(256);
    xml.push_str(XML_DECL);
    write!(
        xml,
        r#"<p:presentationPr xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"/>"#
    )?;
    Ok(xml)
}

fn table_styles_xml() -> String {
    format!(
        r#"{XML_DECL}<a:tblStyleLst xmlns:a="{NS_A}" def="{{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}}"/>"#
    )
}

const TITLE_FRAME: Frame = (838_200, 365_125, 10_515_600, 1_325_563);
const BODY_FRAME: Frame = (838_200, 1_825_625, 10_515_600, 4_351_338);
const CENTER_TITLE_FRAME: Frame = (1_524_000, 1_122_363, 9_144_000, 2_387_600);
const SUBTITLE_FRAME: Frame = (1_524_000, 3_602_038, 9_144_000, 1_655_762);

fn slide_master_xml() -> Result<String, RenderError> {
    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECL);
    write!(
        xml,
        r#"<p:sldMaster xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}">"#
    )?;
    xml.push_str(r#"<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree>"#);
    write_group_header(&mut xml);
    open_shape(
        &mut xml,
        2,
        "Title Placeholder 1",
        r#"<p:ph type="title"/>"#,
        Some(TITLE_FRAME),
    )?;
    xml.push_str("<a:p/>");
    close_shape(&mut xml);
    open_shape(
        &mut xml,
        3,
        "Text Placeholder 2",
        r#"<p:ph type="body" idx="1"/>"#,
        Some(BODY_FRAME),
    )?;
    xml.push_str("<a:p/>");
    close_shape(&mut xml);
    xml.push_str("</p:spTree></p:cSld>");

    xml.push_str(r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#);
    xml.push_str(r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/><p:sldLayoutId id="2147483650" r:id="rId2"/></p:sldLayoutIdLst>"#);

    // Theme fonts (+mj-lt / +mn-lt) and colours flow in from theme1.xml.
    xml.push_str("<p:txStyles>");
    xml.push_str(r#"<p:titleStyle><a:lvl1pPr algn="l"><a:buNone/><a:defRPr sz="4400" b="1"><a:solidFill><a:schemeClr val="accent1"/></a:solidFill><a:latin typeface="+mj-lt"/></a:defRPr></a:lvl1pPr></p:titleStyle>"#);
    xml.push_str(r#"<p:bodyStyle><a:lvl1pPr marL="228600" indent="-228600"><a:spcBef><a:spcPts val="1000"/></a:spcBef><a:buFont typeface="Arial"/><a:buChar char="&#8226;"/><a:defRPr sz="2400"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/></a:defRPr></a:lvl1pPr></p:bodyStyle>"#);
    xml.push_str(r#"<p:otherStyle><a:lvl1pPr><a:defRPr sz="1800"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/></a:defRPr></a:lvl1pPr></p:otherStyle>"#);
    xml.push_str("</p:txStyles>");

    xml.push_str("</p:sldMaster>");
    Ok(xml)
}

fn slide_layout_xml(layout: Layout) -> Result<String, RenderError> {
    let (kind, name) = match layout {
        Layout::Title => ("title", "Title Slide"),
        Layout::Content => ("obj", "Title and Content"),
    };

    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECL);
    write!(
        xml,
        r#"<p:sldLayout xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" type="{kind}" preserve="1"><p:cSld name="{name}"><p:spTree>"#
    )?;
    write_group_header(&mut xml);
    match layout {
        Layout::Title => {
            open_shape(
                &mut xml,
                2,
                "Title 1",
                r#"<p:ph type="ctrTitle"/>"#,
                Some(CENTER_TITLE_FRAME),
            )?;
            xml.push_str(r#"<a:p><a:pPr algn="ctr"/></a:p>"#);
            close_shape(&mut xml);
            open_shape(
                &mut xml,
                3,
                "Subtitle 2",
                r#"<p:ph type="subTitle" idx="1"/>"#,
                Some(SUBTITLE_FRAME),
            )?;
            xml.push_str(r#"<a:p><a:pPr marL="0" indent="0" algn="ctr"><a:buNone/></a:pPr></a:p>"#);
            close_shape(&mut xml);
        }
        Layout::Content => {
            open_shape(
                &mut xml,
                2,
                "Title 1",
                r#"<p:ph type="title"/>"#,
                Some(TITLE_FRAME),
            )?;
            xml.push_str("<a:p/>");
            close_shape(&mut xml);
            open_shape(
                &mut xml,
                3,
                "Content Placeholder 2",
                r#"<p:ph idx="1"/>"#,
                Some(BODY_FRAME),
            )?;
            xml.push_str("<a:p/>");
            close_shape(&mut xml);
        }
    }
    xml.push_str("</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>");
    Ok(xml)
}
