use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use termdiff_core::{Result, TermdiffError};

/// One `<trans-unit>` keyed by its `resname` attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XliffUnit {
    pub key: String,
    pub source: String,
    pub target: String,
}

/// A parsed XLIFF 1.2 document with the languages declared on its `<file>`
/// element. Language codes are stored lowercased.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XliffDocument {
    pub path: PathBuf,
    pub source_language: String,
    pub target_language: String,
    pub units: Vec<XliffUnit>,
}

impl XliffDocument {
    /// Resolve the value for a locale under the source/target asymmetry:
    /// the source language reads `<source>`, the target language `<target>`.
    pub fn value_for(&self, key: &str, locale: &str) -> Option<&str> {
        let unit = self.units.iter().find(|u| u.key == key)?;
        if locale.eq_ignore_ascii_case(&self.source_language) {
            Some(unit.source.as_str())
        } else if !self.target_language.is_empty()
            && locale.eq_ignore_ascii_case(&self.target_language)
        {
            Some(unit.target.as_str())
        } else {
            None
        }
    }
}

pub fn parse_xliff_file(path: &Path) -> Result<XliffDocument> {
    let xml = std::fs::read_to_string(path)?;
    parse_xliff_str(&xml, path)
}

/// Extract `resname`-keyed units and the declared languages. Units without a
/// `resname` are skipped. Malformed XML aborts the whole document.
pub fn parse_xliff_str(xml: &str, path: &Path) -> Result<XliffDocument> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut doc = XliffDocument {
        path: PathBuf::from(path),
        source_language: "en".to_string(),
        target_language: String::new(),
        units: Vec::new(),
    };

    let mut current_key: Option<String> = None;
    let mut current_source = String::new();
    let mut current_target = String::new();
    // Which of source/target we are directly inside, if any.
    let mut text_slot: Option<bool> = None;
    let mut depth_in_slot = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.name();
                match name.local_name().as_ref() {
                    b"file" => {
                        for attr in e.attributes().flatten() {
                            let val = attr
                                .unescape_value()
                                .map_err(|e| TermdiffError::Xml(format!("{e}")))?;
                            match attr.key.local_name().as_ref() {
                                b"source-language" => {
                                    doc.source_language = val.to_lowercase();
                                }
                                b"target-language" => {
                                    doc.target_language = val.to_lowercase();
                                }
                                _ => {}
                            }
                        }
                    }
                    b"trans-unit" => {
                        current_key = None;
                        current_source.clear();
                        current_target.clear();
                        for attr in e.attributes().flatten() {
                            if attr.key.local_name().as_ref() == b"resname" {
                                let val = attr
                                    .unescape_value()
                                    .map_err(|e| TermdiffError::Xml(format!("{e}")))?;
                                if !val.is_empty() {
                                    current_key = Some(val.into_owned());
                                }
                            }
                        }
                    }
                    b"source" if current_key.is_some() => {
                        text_slot = Some(true);
                        depth_in_slot = 0;
                    }
                    b"target" if current_key.is_some() => {
                        text_slot = Some(false);
                        depth_in_slot = 0;
                    }
                    _ => {
                        if text_slot.is_some() {
                            depth_in_slot += 1;
                        }
                    }
                }
            }
            Ok(Event::End(e)) => match e.name().local_name().as_ref() {
                b"trans-unit" => {
                    if let Some(key) = current_key.take() {
                        doc.units.push(XliffUnit {
                            key,
                            source: std::mem::take(&mut current_source),
                            target: std::mem::take(&mut current_target),
                        });
                    }
                }
                b"source" | b"target" if depth_in_slot == 0 => {
                    text_slot = None;
                }
                _ => {
                    if text_slot.is_some() && depth_in_slot > 0 {
                        depth_in_slot -= 1;
                    }
                }
            },
            Ok(Event::Text(t)) => {
                // Only direct text of <source>/<target>, not inline markup.
                if depth_in_slot == 0 {
                    if let Some(is_source) = text_slot {
                        let text = t
                            .unescape()
                            .map_err(|e| TermdiffError::Xml(format!("{e}")))?;
                        if is_source {
                            current_source.push_str(&text);
                        } else {
                            current_target.push_str(&text);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(TermdiffError::Xml(format!("{path:?}: {e}")).into()),
            _ => {}
        }
        buf.clear();
    }

    Ok(doc)
}
