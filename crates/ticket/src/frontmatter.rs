// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! YAML front matter split and render
//!
//! A document is `---\n<yaml>\n---\n<body>`. Splitting is line-oriented so a
//! `---` inside the body is harmless. Typed entities deserialize from the
//! preamble with a flattened `extras` map catching unknown keys.

use crate::TicketError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A split document: raw preamble mapping plus body text.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub preamble: serde_yaml::Mapping,
    pub body: String,
}

/// Split a document into preamble mapping and body.
pub fn split(text: &str) -> Result<Document, TicketError> {
    let rest = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
        .ok_or(TicketError::MissingPreamble)?;

    let mut yaml_len = None;
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            yaml_len = Some((offset, offset + line.len()));
            break;
        }
        offset += line.len();
    }
    let (yaml_end, body_start) = yaml_len.ok_or(TicketError::UnterminatedPreamble)?;

    let preamble: serde_yaml::Mapping = serde_yaml::from_str(&rest[..yaml_end])?;
    Ok(Document {
        preamble,
        body: rest[body_start..].to_string(),
    })
}

/// Parse a document into a typed preamble plus body.
pub fn parse<T: DeserializeOwned>(text: &str) -> Result<(T, String), TicketError> {
    let doc = split(text)?;
    let entity = serde_yaml::from_value(serde_yaml::Value::Mapping(doc.preamble))?;
    Ok((entity, doc.body))
}

/// Render a typed preamble and body back into a document.
pub fn render<T: Serialize>(entity: &T, body: &str) -> Result<String, TicketError> {
    let yaml = serde_yaml::to_string(entity)?;
    let mut out = String::with_capacity(yaml.len() + body.len() + 8);
    out.push_str("---\n");
    out.push_str(&yaml);
    if !yaml.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("---\n");
    out.push_str(body);
    Ok(out)
}

#[cfg(test)]
#[path = "frontmatter_tests.rs"]
mod tests;
