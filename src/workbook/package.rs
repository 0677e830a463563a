//! OOXML package access: zip parts and relationships.

use std::io::{Cursor, Read, Write};

use roxmltree::Document;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::xml;
use super::WorkbookError;

/// One zip entry of the package.
#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub data: Vec<u8>,
}

/// All parts of an xlsx file, in their original archive order.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: Vec<Part>,
}

impl Package {
    /// Reads every part, inflating at most `max_unpacked_bytes` in total.
    ///
    /// Sizes declared in the archive are not trusted; a package whose parts
    /// inflate past the limit is rejected as [`WorkbookError::TooLarge`].
    pub fn read(bytes: &[u8], max_unpacked_bytes: u64) -> Result<Self, WorkbookError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| WorkbookError::Parse(format!("not a zip archive: {}", e)))?;

        let mut parts = Vec::with_capacity(archive.len());
        let mut remaining = max_unpacked_bytes;
        for index in 0..archive.len() {
            let entry = archive
                .by_index(index)
                .map_err(|e| WorkbookError::Parse(e.to_string()))?;
            if entry.is_dir() {
                continue;
            }

            let name = entry.name().to_string();
            let mut data = Vec::new();
            entry
                .take(remaining.saturating_add(1))
                .read_to_end(&mut data)
                .map_err(|e| WorkbookError::Parse(format!("{}: {}", name, e)))?;

            let size = data.len() as u64;
            if size > remaining {
                return Err(WorkbookError::TooLarge(format!(
                    "parts inflate past {} bytes at {}",
                    max_unpacked_bytes, name
                )));
            }
            remaining -= size;

            parts.push(Part { name, data });
        }

        Ok(Self { parts })
    }

    pub fn write(&self) -> Result<Vec<u8>, WorkbookError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for part in &self.parts {
            writer
                .start_file(part.name.as_str(), options)
                .map_err(|e| WorkbookError::Write(e.to_string()))?;
            writer
                .write_all(&part.data)
                .map_err(|e| WorkbookError::Write(e.to_string()))?;
        }

        let cursor = writer
            .finish()
            .map_err(|e| WorkbookError::Write(e.to_string()))?;
        Ok(cursor.into_inner())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|p| p.name.as_str())
    }

    /// Part names are compared ASCII case-insensitively.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.find(name).map(|i| self.parts[i].data.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// The part decoded as UTF-8 XML text.
    pub fn part_text(&self, name: &str) -> Result<Option<&str>, WorkbookError> {
        self.part(name).map(|data| xml::decode_text(name, data)).transpose()
    }

    /// Like [`Package::part_text`], but a missing part is an error.
    pub fn require_text(&self, name: &str) -> Result<&str, WorkbookError> {
        self.part_text(name)?
            .ok_or_else(|| WorkbookError::Parse(format!("missing part {}", name)))
    }

    /// Replaces the contents of an existing part. Returns false if absent.
    pub fn replace(&mut self, name: &str, data: Vec<u8>) -> bool {
        match self.find(name) {
            Some(i) => {
                self.parts[i].data = data;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Part> {
        self.find(name).map(|i| self.parts.remove(i))
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.parts
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))
    }
}

/// An entry of a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
}

impl Relationship {
    /// Relationship types are matched by their last path segment so that
    /// both transitional and strict OOXML namespaces resolve.
    pub fn is_kind(&self, kind: &str) -> bool {
        self.rel_type.rsplit('/').next() == Some(kind)
    }
}

pub fn parse_relationships(name: &str, text: &str) -> Result<Vec<Relationship>, WorkbookError> {
    let doc = Document::parse(text).map_err(|e| xml::parse_error(name, e))?;

    Ok(doc
        .descendants()
        .filter(|n| n.has_tag_name("Relationship"))
        .filter(|n| n.attribute("TargetMode") != Some("External"))
        .filter_map(|n| {
            Some(Relationship {
                id: n.attribute("Id")?.to_string(),
                rel_type: n.attribute("Type")?.to_string(),
                target: n.attribute("Target")?.to_string(),
            })
        })
        .collect())
}

/// `xl/workbook.xml` -> `xl/_rels/workbook.xml.rels`
pub fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolves a relationship target against the part that owns the `.rels`.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize(absolute.split('/'));
    }

    let base = source_part
        .rsplit_once('/')
        .map(|(dir, _)| dir)
        .unwrap_or("");
    normalize(base.split('/').chain(target.split('/')))
}

fn normalize<'a>(segments: impl Iterator<Item = &'a str>) -> String {
    let mut out: Vec<&str> = Vec::new();
    for segment in segments {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out.join("/")
}
