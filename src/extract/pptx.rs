//! Slide deck (.pptx) extractor.
//!
//! A `.pptx` file is a zip archive holding one XML part per slide under
//! `ppt/slides/slideN.xml`. Each slide's shape tree is parsed into a closed
//! [`Shape`] enum and flattened to text: paragraph runs joined by spaces,
//! table cells joined by `" | "`, groups recursed. Slides with no extractable
//! text yield no document.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::warn;
use zip::ZipArchive;

use crate::error::ExtractionError;
use crate::models::Document;

/// Closed set of shape kinds a slide can contain.
///
/// Anything that is not a text frame, table, or group extracts to empty
/// text; there is no attribute probing for unknown shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// A shape with a text frame: paragraphs of text runs.
    TextFrame { paragraphs: Vec<Vec<String>> },
    /// A table: rows of cell texts.
    Table { rows: Vec<Vec<String>> },
    /// A group shape with nested children.
    Group { children: Vec<Shape> },
    /// Pictures, connectors, charts and anything else without text.
    Other,
}

/// Extract one document per slide that has extractable text.
pub fn extract_pptx(path: &Path) -> Result<Vec<Document>, ExtractionError> {
    extract_pptx_as(path, &path.to_string_lossy())
}

/// Extract with an explicit source path.
///
/// Used for decks converted from the legacy format, where the temporary
/// converted file is deleted afterwards and citations must point at the
/// original file instead.
pub fn extract_pptx_as(path: &Path, source_path: &str) -> Result<Vec<Document>, ExtractionError> {
    let file = File::open(path)?;
    let mut archive =
        ZipArchive::new(file).map_err(|e| ExtractionError::SlideArchive(e.to_string()))?;

    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| slide_part_number(name).map(|n| (n, name.to_string())))
        .collect();
    slides.sort_by_key(|(n, _)| *n);

    let mut documents = Vec::new();
    for (number, name) in slides {
        let mut xml = String::new();
        archive
            .by_name(&name)
            .map_err(|e| ExtractionError::SlideArchive(e.to_string()))?
            .read_to_string(&mut xml)?;

        match slide_document(&xml, number, source_path) {
            Ok(Some(doc)) => documents.push(doc),
            Ok(None) => {}
            Err(e) => {
                warn!(slide = number, source = source_path, error = %e, "skipping slide");
            }
        }
    }

    Ok(documents)
}

/// Build the document for one slide, or `None` when no shape has text.
fn slide_document(
    xml: &str,
    number: u32,
    source_path: &str,
) -> Result<Option<Document>, ExtractionError> {
    let shapes = parse_shapes(xml)?;

    let texts: Vec<String> = shapes
        .iter()
        .map(shape_text)
        .filter(|t| !t.is_empty())
        .collect();

    if texts.is_empty() {
        return Ok(None);
    }

    let content = format!("=== Slide {} ===\n{}", number, texts.join("\n"));
    Ok(Some(Document::slide(content, source_path, number)))
}

/// Parse `ppt/slides/slideN.xml` entry names.
fn slide_part_number(entry_name: &str) -> Option<u32> {
    entry_name
        .strip_prefix("ppt/slides/slide")?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

/// Flatten a shape to its extractable text.
pub fn shape_text(shape: &Shape) -> String {
    match shape {
        Shape::TextFrame { paragraphs } => paragraphs
            .iter()
            .map(|runs| {
                runs.iter()
                    .map(|run| run.trim())
                    .filter(|run| !run.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Shape::Table { rows } => rows
            .iter()
            .map(|cells| {
                cells
                    .iter()
                    .map(|cell| cell.trim())
                    .filter(|cell| !cell.is_empty())
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .filter(|row| !row.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Shape::Group { children } => children
            .iter()
            .map(shape_text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Shape::Other => String::new(),
    }
}

/// Parse the slide XML into its top-level shapes.
pub fn parse_shapes(xml: &str) -> Result<Vec<Shape>, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut shapes = Vec::new();

    loop {
        match read(&mut reader)? {
            Event::Start(e) if e.local_name().as_ref() == b"spTree" => {
                parse_children(&mut reader, b"spTree", &mut shapes)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(shapes)
}

fn read<'a>(reader: &mut Reader<&'a [u8]>) -> Result<Event<'a>, ExtractionError> {
    reader
        .read_event()
        .map_err(|e| ExtractionError::SlideXml(e.to_string()))
}

fn truncated() -> ExtractionError {
    ExtractionError::SlideXml("unexpected end of slide XML".to_string())
}

/// Parse shape children until the matching end tag of `end`.
fn parse_children(
    reader: &mut Reader<&[u8]>,
    end: &[u8],
    out: &mut Vec<Shape>,
) -> Result<(), ExtractionError> {
    loop {
        match read(reader)? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                match name.as_slice() {
                    b"sp" => out.push(parse_text_frame(reader)?),
                    b"graphicFrame" => out.push(parse_graphic_frame(reader)?),
                    b"grpSp" => {
                        let mut children = Vec::new();
                        parse_children(reader, b"grpSp", &mut children)?;
                        out.push(Shape::Group { children });
                    }
                    b"pic" | b"cxnSp" => {
                        skip_subtree(reader, &name)?;
                        out.push(Shape::Other);
                    }
                    // Group/tree properties and anything unrecognized
                    _ => skip_subtree(reader, &name)?,
                }
            }
            Event::Empty(e) => {
                if matches!(e.local_name().as_ref(), b"pic" | b"cxnSp") {
                    out.push(Shape::Other);
                }
            }
            Event::End(e) if e.local_name().as_ref() == end => return Ok(()),
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
}

/// Skip everything until the matching end tag of `name`.
fn skip_subtree(reader: &mut Reader<&[u8]>, name: &[u8]) -> Result<(), ExtractionError> {
    let mut depth = 1u32;
    loop {
        match read(reader)? {
            Event::Start(e) if e.local_name().as_ref() == name => depth += 1,
            Event::End(e) if e.local_name().as_ref() == name => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
}

/// Parse a `p:sp` shape into a text frame.
fn parse_text_frame(reader: &mut Reader<&[u8]>) -> Result<Shape, ExtractionError> {
    let mut paragraphs = Vec::new();
    loop {
        match read(reader)? {
            Event::Start(e) if e.local_name().as_ref() == b"txBody" => {
                parse_tx_body(reader, &mut paragraphs)?;
            }
            Event::End(e) if e.local_name().as_ref() == b"sp" => break,
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
    Ok(Shape::TextFrame { paragraphs })
}

fn parse_tx_body(
    reader: &mut Reader<&[u8]>,
    paragraphs: &mut Vec<Vec<String>>,
) -> Result<(), ExtractionError> {
    loop {
        match read(reader)? {
            Event::Start(e) if e.local_name().as_ref() == b"p" => {
                paragraphs.push(parse_paragraph(reader)?);
            }
            Event::End(e) if e.local_name().as_ref() == b"txBody" => return Ok(()),
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
}

fn parse_paragraph(reader: &mut Reader<&[u8]>) -> Result<Vec<String>, ExtractionError> {
    let mut runs = Vec::new();
    loop {
        match read(reader)? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => {
                runs.push(read_run_text(reader)?);
            }
            Event::End(e) if e.local_name().as_ref() == b"p" => return Ok(runs),
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
}

/// Read the text content of an `a:t` element.
///
/// A run with a broken entity reference degrades to its raw text instead
/// of failing the whole slide.
fn read_run_text(reader: &mut Reader<&[u8]>) -> Result<String, ExtractionError> {
    let mut text = String::new();
    loop {
        match read(reader)? {
            Event::Text(t) => match t.unescape() {
                Ok(s) => text.push_str(&s),
                Err(e) => {
                    warn!(error = %e, "unescape failed for text run");
                    text.push_str(&String::from_utf8_lossy(t.as_ref()));
                }
            },
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c.into_inner())),
            Event::End(e) if e.local_name().as_ref() == b"t" => return Ok(text),
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
}

/// Parse a `p:graphicFrame`; only tables carry text, everything else
/// (charts, diagrams) is [`Shape::Other`].
fn parse_graphic_frame(reader: &mut Reader<&[u8]>) -> Result<Shape, ExtractionError> {
    let mut table = None;
    loop {
        match read(reader)? {
            Event::Start(e) if e.local_name().as_ref() == b"tbl" => {
                table = Some(parse_table(reader)?);
            }
            Event::End(e) if e.local_name().as_ref() == b"graphicFrame" => break,
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
    Ok(match table {
        Some(rows) => Shape::Table { rows },
        None => Shape::Other,
    })
}

fn parse_table(reader: &mut Reader<&[u8]>) -> Result<Vec<Vec<String>>, ExtractionError> {
    let mut rows = Vec::new();
    loop {
        match read(reader)? {
            Event::Start(e) if e.local_name().as_ref() == b"tr" => {
                rows.push(parse_table_row(reader)?);
            }
            Event::End(e) if e.local_name().as_ref() == b"tbl" => return Ok(rows),
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
}

fn parse_table_row(reader: &mut Reader<&[u8]>) -> Result<Vec<String>, ExtractionError> {
    let mut cells = Vec::new();
    loop {
        match read(reader)? {
            Event::Start(e) if e.local_name().as_ref() == b"tc" => {
                cells.push(parse_table_cell(reader)?);
            }
            Event::End(e) if e.local_name().as_ref() == b"tr" => return Ok(cells),
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
}

fn parse_table_cell(reader: &mut Reader<&[u8]>) -> Result<String, ExtractionError> {
    let mut texts = Vec::new();
    loop {
        match read(reader)? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => {
                texts.push(read_run_text(reader)?);
            }
            Event::End(e) if e.local_name().as_ref() == b"tc" => return Ok(texts.join(" ")),
            Event::Eof => return Err(truncated()),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn slide_xml(body: &str) -> String {
        format!("<p:sld><p:cSld><p:spTree>{}</p:spTree></p:cSld></p:sld>", body)
    }

    fn write_pptx(path: &Path, slides: &[&str]) {
        let file = File::create(path).unwrap();
        let mut writer = ZipWriter::new(file);
        for (i, xml) in slides.iter().enumerate() {
            let name = format!("ppt/slides/slide{}.xml", i + 1);
            writer
                .start_file(name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(xml.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_text_frame_runs_joined_with_spaces() {
        let xml = slide_xml(
            "<p:sp><p:txBody>\
             <a:p><a:r><a:t> Hello </a:t></a:r><a:r><a:t>world</a:t></a:r></a:p>\
             <a:p><a:r><a:t></a:t></a:r></a:p>\
             </p:txBody></p:sp>",
        );
        let shapes = parse_shapes(&xml).unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shape_text(&shapes[0]), "Hello world");
    }

    #[test]
    fn test_table_rows_joined_with_pipes() {
        let xml = slide_xml(
            "<p:graphicFrame><a:graphic><a:graphicData><a:tbl>\
             <a:tr>\
             <a:tc><a:txBody><a:p><a:r><a:t>Name</a:t></a:r></a:p></a:txBody></a:tc>\
             <a:tc><a:txBody><a:p><a:r><a:t>City</a:t></a:r></a:p></a:txBody></a:tc>\
             </a:tr>\
             <a:tr>\
             <a:tc><a:txBody><a:p><a:r><a:t>Ada</a:t></a:r></a:p></a:txBody></a:tc>\
             <a:tc><a:txBody><a:p><a:r><a:t></a:t></a:r></a:p></a:txBody></a:tc>\
             </a:tr>\
             </a:tbl></a:graphicData></a:graphic></p:graphicFrame>",
        );
        let shapes = parse_shapes(&xml).unwrap();
        assert_eq!(shape_text(&shapes[0]), "Name | City\nAda");
    }

    #[test]
    fn test_group_shapes_recursed() {
        let xml = slide_xml(
            "<p:grpSp>\
             <p:nvGrpSpPr><p:cNvPr id=\"2\" name=\"g\"/></p:nvGrpSpPr>\
             <p:sp><p:txBody><a:p><a:r><a:t>inner</a:t></a:r></a:p></p:txBody></p:sp>\
             <p:pic/>\
             </p:grpSp>",
        );
        let shapes = parse_shapes(&xml).unwrap();
        assert_eq!(shapes.len(), 1);
        match &shapes[0] {
            Shape::Group { children } => {
                assert_eq!(children.len(), 2);
                assert_eq!(children[1], Shape::Other);
            }
            other => panic!("expected group, got {:?}", other),
        }
        assert_eq!(shape_text(&shapes[0]), "inner");
    }

    #[test]
    fn test_pictures_extract_to_empty_text() {
        let xml = slide_xml("<p:pic><p:nvPicPr/></p:pic>");
        let shapes = parse_shapes(&xml).unwrap();
        assert_eq!(shapes, vec![Shape::Other]);
        assert_eq!(shape_text(&shapes[0]), "");
    }

    #[test]
    fn test_slide_marker_and_numbering() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.pptx");
        write_pptx(
            &path,
            &[&slide_xml(
                "<p:sp><p:txBody><a:p><a:r><a:t>title</a:t></a:r></a:p></p:txBody></p:sp>",
            )],
        );

        let docs = extract_pptx(&path).unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0].content.starts_with("=== Slide 1 ===\n"));
        assert_eq!(docs[0].slide_number, Some(1));
        assert!(docs[0].source_path.ends_with("deck.pptx"));
    }

    #[test]
    fn test_empty_slide_yields_no_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.pptx");
        let with_text =
            slide_xml("<p:sp><p:txBody><a:p><a:r><a:t>content</a:t></a:r></a:p></p:txBody></p:sp>");
        // Slide 2 holds only a table with empty cells.
        let empty_table = slide_xml(
            "<p:graphicFrame><a:graphic><a:graphicData><a:tbl>\
             <a:tr><a:tc><a:txBody><a:p><a:r><a:t> </a:t></a:r></a:p></a:txBody></a:tc></a:tr>\
             </a:tbl></a:graphicData></a:graphic></p:graphicFrame>",
        );
        write_pptx(&path, &[&with_text, &empty_table, &with_text]);

        let docs = extract_pptx(&path).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].slide_number, Some(1));
        assert_eq!(docs[1].slide_number, Some(3));
    }

    #[test]
    fn test_not_a_zip_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.pptx");
        std::fs::write(&path, "plain text, not a zip").unwrap();

        assert!(extract_pptx(&path).is_err());
    }
}
