//! Suite definition files
//!
//! A suite definition file (SDF) lists the schemes a physics suite runs:
//!
//! ```text
//! <suite name="FV3_test" version="1">
//!   <init>suite_init_scheme</init>
//!   <group name="physics">
//!     <subcycle loop="2">
//!       <scheme>scheme_a</scheme>
//!       <scheme>scheme_b</scheme>
//!     </subcycle>
//!   </group>
//!   <finalize>suite_finalize_scheme</finalize>
//! </suite>
//! ```
//!
//! The call tree is the flattened execution order: groups in order, each
//! subcycle repeated `loop` times.

use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::Serialize;

use crate::error::{Result, TrackError};

/// Schemes executed together, `loop_count` times in a row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subcycle {
    pub loop_count: u32,
    pub schemes: Vec<String>,
}

/// A named group of subcycles
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub name: String,
    pub subcycles: Vec<Subcycle>,
}

/// A parsed suite definition
///
/// Immutable once parsed; the call tree is always non-empty.
#[derive(Debug, Clone, Serialize)]
pub struct Suite {
    sdf_name: PathBuf,
    name: String,
    groups: Vec<Group>,
    init: Option<String>,
    finalize: Option<String>,
    call_tree: Vec<String>,
}

impl Suite {
    /// Read and parse a suite definition file
    pub fn parse<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("reading suite definition file {}", path.display());

        let content = fs::read_to_string(path)
            .map_err(|e| TrackError::suite_definition(path, e.to_string()))?;

        Self::from_xml(path, &content)
    }

    /// Parse suite definition XML; `sdf_name` is only used for reporting
    pub fn from_xml<P: AsRef<Path>>(sdf_name: P, xml: &str) -> Result<Self> {
        let sdf_name = sdf_name.as_ref();
        let mut builder = SuiteBuilder::default();
        builder
            .read(xml)
            .map_err(|reason| TrackError::suite_definition(sdf_name, reason))?;

        let Some(name) = builder.name else {
            return Err(TrackError::suite_definition(sdf_name, "no <suite> element"));
        };

        let mut suite = Suite {
            sdf_name: sdf_name.to_path_buf(),
            name,
            groups: builder.groups,
            init: builder.init,
            finalize: builder.finalize,
            call_tree: vec![],
        };

        suite.call_tree = suite.make_call_tree();
        if suite.call_tree.is_empty() {
            return Err(TrackError::suite_definition(
                sdf_name,
                format!("suite '{}' does not call any schemes", suite.name),
            ));
        }

        tracing::debug!(
            suite = %suite.name,
            groups = suite.groups.len(),
            "call tree: {:?}",
            suite.call_tree
        );

        Ok(suite)
    }

    /// Flatten groups and subcycles into execution order
    pub fn make_call_tree(&self) -> Vec<String> {
        let mut call_tree = vec![];
        for group in &self.groups {
            for subcycle in &group.subcycles {
                for _ in 0..subcycle.loop_count {
                    call_tree.extend(subcycle.schemes.iter().cloned());
                }
            }
        }
        call_tree
    }

    /// Suite name from the `<suite name=..>` attribute
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the definition file
    pub fn sdf_name(&self) -> &Path {
        &self.sdf_name
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn call_tree(&self) -> &[String] {
        &self.call_tree
    }

    /// Suite-level init scheme, not part of the call tree
    pub fn init_scheme(&self) -> Option<&str> {
        self.init.as_deref()
    }

    /// Suite-level finalize scheme, not part of the call tree
    pub fn finalize_scheme(&self) -> Option<&str> {
        self.finalize.as_deref()
    }
}

#[derive(Debug, Default)]
struct SuiteBuilder {
    name: Option<String>,
    groups: Vec<Group>,
    init: Option<String>,
    finalize: Option<String>,
    stack: Vec<String>,
    /// Text of the innermost open element, joined across comments
    text: String,
}

impl SuiteBuilder {
    fn read(&mut self, xml: &str) -> std::result::Result<(), String> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => self.open(&e)?,
                Ok(Event::Empty(e)) => {
                    self.open(&e)?;
                    self.close()?;
                }
                Ok(Event::End(_)) => self.close()?,
                Ok(Event::Text(t)) => {
                    let text = t.unescape().map_err(|e| e.to_string())?;
                    self.text(text.trim())?;
                }
                Ok(Event::CData(c)) => self.text(String::from_utf8_lossy(&c).trim())?,
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(format!("malformed XML: {}", e)),
            }
        }

        if let Some(open) = self.stack.last() {
            return Err(format!("unclosed element <{}>", open));
        }
        Ok(())
    }

    fn open(&mut self, element: &BytesStart) -> std::result::Result<(), String> {
        let tag = String::from_utf8_lossy(element.name().as_ref()).into_owned();
        let parent = self.stack.last().map(String::as_str);

        match (parent, tag.as_str()) {
            (None, "suite") => {
                self.name = Some(required_attribute(element, "suite", "name")?);
            }
            (Some("suite"), "group") => {
                let name = required_attribute(element, "group", "name")?;
                self.groups.push(Group {
                    name,
                    subcycles: vec![],
                });
            }
            (Some("suite"), "init") | (Some("suite"), "finalize") => {}
            (Some("group"), "subcycle") => {
                let loop_count = match attribute(element, "loop")? {
                    None => 1,
                    Some(value) => match value.trim().parse::<u32>() {
                        Ok(0) | Err(_) => {
                            return Err(format!(
                                "subcycle loop '{}' is not a positive integer",
                                value
                            ))
                        }
                        Ok(n) => n,
                    },
                };
                if let Some(group) = self.groups.last_mut() {
                    group.subcycles.push(Subcycle {
                        loop_count,
                        schemes: vec![],
                    });
                }
            }
            (Some("subcycle"), "scheme") => {}
            (None, other) => {
                return Err(format!("expected <suite> root element, found <{}>", other));
            }
            (Some(parent), other) => {
                return Err(format!("unexpected element <{}> inside <{}>", other, parent));
            }
        }

        self.text.clear();
        self.stack.push(tag);
        Ok(())
    }

    fn close(&mut self) -> std::result::Result<(), String> {
        let tag = self
            .stack
            .pop()
            .ok_or_else(|| "unbalanced closing tag".to_string())?;

        let text = std::mem::take(&mut self.text);

        match tag.as_str() {
            "scheme" | "init" | "finalize" if text.is_empty() => {
                return Err(format!("empty <{}> element", tag));
            }
            "scheme" => {
                let subcycle = self
                    .groups
                    .last_mut()
                    .and_then(|group| group.subcycles.last_mut())
                    .ok_or_else(|| format!("scheme '{}' outside of a subcycle", text))?;
                subcycle.schemes.push(text);
            }
            "init" => self.init = Some(text),
            "finalize" => self.finalize = Some(text),
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str) -> std::result::Result<(), String> {
        if text.is_empty() {
            return Ok(());
        }

        match self.stack.last().map(String::as_str) {
            Some("scheme" | "init" | "finalize") => {
                self.text.push_str(text);
                Ok(())
            }
            Some(other) => Err(format!("unexpected text '{}' inside <{}>", text, other)),
            None => Err(format!("unexpected text '{}' outside <suite>", text)),
        }
    }
}

fn attribute(element: &BytesStart, key: &str) -> std::result::Result<Option<String>, String> {
    let Some(attr) = element.try_get_attribute(key).map_err(|e| e.to_string())? else {
        return Ok(None);
    };
    let value = attr.unescape_value().map_err(|e| e.to_string())?;
    Ok(Some(value.into_owned()))
}

fn required_attribute(
    element: &BytesStart,
    tag: &str,
    key: &str,
) -> std::result::Result<String, String> {
    match attribute(element, key)? {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(format!("<{}> element is missing the '{}' attribute", tag, key)),
    }
}
