//! Knowledge folder loading.
//!
//! Scans a single directory (no recursion) and turns every supported file
//! into a [`SourceDocument`]. The file kind is decided by a case-sensitive
//! suffix match on the file name:
//!
//! | Suffix            | Extraction                                  |
//! |-------------------|---------------------------------------------|
//! | `.pdf`            | page text joined with a single space        |
//! | `.txt`            | whole file, strict UTF-8                    |
//! | `.docx`, `.doc`   | body paragraphs joined with newlines        |
//! | `.xlsx`, `.xls`   | first sheet rendered as a plain text table  |
//!
//! Anything else is skipped. A supported file that cannot be read is an
//! error for the whole load.

use crate::types::{AppError, Result, SourceDocument};
use calamine::{open_workbook_auto, Data, Reader as _};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, instrument};

/// What a file in the knowledge folder is, judged by its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Text,
    Word,
    Spreadsheet,
    Unsupported,
}

impl DocumentKind {
    /// Classify a file name. Matching is case-sensitive, so `NOTES.TXT`
    /// is unsupported.
    pub fn from_file_name(name: &str) -> Self {
        if name.ends_with(".pdf") {
            DocumentKind::Pdf
        } else if name.ends_with(".txt") {
            DocumentKind::Text
        } else if name.ends_with(".docx") || name.ends_with(".doc") {
            DocumentKind::Word
        } else if name.ends_with(".xlsx") || name.ends_with(".xls") {
            DocumentKind::Spreadsheet
        } else {
            DocumentKind::Unsupported
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, DocumentKind::Unsupported)
    }
}

/// Ensure `folder` exists, then load every supported file directly inside it.
///
/// Documents come back sorted by file name so index ids are stable across
/// runs. Subdirectories and unsupported files are ignored.
///
/// # Errors
///
/// Returns [`AppError::Document`] if the folder cannot be created or read,
/// or if any supported file fails to extract.
#[instrument(fields(folder = %folder.display()))]
pub fn load_documents(folder: &Path) -> Result<Vec<SourceDocument>> {
    fs::create_dir_all(folder).map_err(|e| {
        AppError::Document(format!(
            "Failed to create knowledge folder {}: {}",
            folder.display(),
            e
        ))
    })?;

    let read_dir = fs::read_dir(folder).map_err(|e| {
        AppError::Document(format!("Failed to read {}: {}", folder.display(), e))
    })?;

    let mut files = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| AppError::Document(e.to_string()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        files.push((name, path));
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));

    let mut documents = Vec::new();
    for (name, path) in files {
        let kind = DocumentKind::from_file_name(&name);
        if !kind.is_supported() {
            debug!(file = %name, "Skipping unsupported file");
            continue;
        }

        let text = extract_text(&path, kind)?;
        debug!(file = %name, ?kind, chars = text.chars().count(), "Loaded document");
        documents.push(SourceDocument { text, source: name });
    }

    info!(count = documents.len(), "Loaded knowledge documents");
    Ok(documents)
}

/// Extract plain text from one file of a known kind.
///
/// Errors are [`AppError::Document`] and name the file.
pub fn extract_text(path: &Path, kind: DocumentKind) -> Result<String> {
    match kind {
        DocumentKind::Pdf => extract_pdf(path),
        DocumentKind::Text => extract_txt(path),
        DocumentKind::Word => extract_docx(path),
        DocumentKind::Spreadsheet => extract_spreadsheet(path),
        DocumentKind::Unsupported => Err(document_error(path, "unsupported file type")),
    }
}

fn document_error(path: &Path, err: impl std::fmt::Display) -> AppError {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    AppError::Document(format!("{}: {}", name, err))
}

fn extract_pdf(path: &Path) -> Result<String> {
    let pages = pdf_extract::extract_text_by_pages(path).map_err(|e| document_error(path, e))?;
    Ok(pages.join(" "))
}

fn extract_txt(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| document_error(path, e))?;
    String::from_utf8(bytes).map_err(|e| document_error(path, format!("not valid UTF-8: {}", e)))
}

// ============= Word =============

fn extract_docx(path: &Path) -> Result<String> {
    let file = fs::File::open(path).map_err(|e| document_error(path, e))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| document_error(path, format!("not a Word document: {}", e)))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| document_error(path, format!("missing document body: {}", e)))?
        .read_to_string(&mut xml)
        .map_err(|e| document_error(path, e))?;
    docx_body_text(&xml).map_err(|e| document_error(path, format!("malformed document body: {}", e)))
}

/// Collect top-level body paragraphs from `word/document.xml`.
///
/// Paragraph text is the concatenation of its `w:t` runs, with `w:tab`
/// as a tab and `w:br` as a line break. Paragraphs inside tables are not
/// part of the body text.
pub fn docx_body_text(xml: &str) -> quick_xml::Result<String> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_paragraph = false;
    let mut in_text = false;
    let mut table_depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:tbl" => table_depth += 1,
                b"w:p" if table_depth == 0 => {
                    in_paragraph = true;
                    current.clear();
                }
                b"w:t" => in_text = in_paragraph,
                _ => {}
            },
            Event::Empty(e) if in_paragraph => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push('\n'),
                // <w:p/> is an empty paragraph; nested ones can't occur
                _ => {}
            },
            Event::Empty(e) if table_depth == 0 && e.name().as_ref() == b"w:p" => {
                paragraphs.push(String::new());
            }
            Event::Text(t) if in_text => {
                let text = t.unescape()?;
                current.push_str(&text);
            }
            Event::CData(t) if in_text => {
                current.push_str(&String::from_utf8_lossy(&t));
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                b"w:p" if in_paragraph && table_depth == 0 => {
                    in_paragraph = false;
                    paragraphs.push(std::mem::take(&mut current));
                }
                b"w:t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

// ============= Spreadsheets =============

fn extract_spreadsheet(path: &Path) -> Result<String> {
    let mut workbook = open_workbook_auto(path).map_err(|e| document_error(path, e))?;
    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| document_error(path, "workbook has no sheets"))?;
    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| document_error(path, e))?;

    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    Ok(format_table(&rows))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(f) if f.fract() == 0.0 && f.is_finite() => format!("{:.1}", f),
        other => other.to_string(),
    }
}

/// Render rows as a right-aligned text table.
///
/// The first row is the header. Empty header cells become `Unnamed: N`
/// and empty data cells `NaN`. Columns are separated by one space and
/// padded to their widest cell. No row index is printed.
pub fn format_table(rows: &[Vec<String>]) -> String {
    let Some((header, body)) = rows.split_first() else {
        return String::new();
    };

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return String::new();
    }

    let header: Vec<String> = (0..columns)
        .map(|i| match header.get(i) {
            Some(h) if !h.is_empty() => h.clone(),
            _ => format!("Unnamed: {}", i),
        })
        .collect();

    let body: Vec<Vec<String>> = body
        .iter()
        .map(|row| {
            (0..columns)
                .map(|i| match row.get(i) {
                    Some(v) if !v.is_empty() => v.clone(),
                    _ => "NaN".to_string(),
                })
                .collect()
        })
        .collect();

    let widths: Vec<usize> = (0..columns)
        .map(|i| {
            std::iter::once(&header[i])
                .chain(body.iter().map(|r| &r[i]))
                .map(|s| s.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let render = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:>width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join(" ")
    };

    std::iter::once(render(&header))
        .chain(body.iter().map(|r| render(r)))
        .collect::<Vec<_>>()
        .join("\n")
}
