// File: src/front_matter.rs
// Purpose: TOML header block at the top of page and layout templates

use folio_router::LayoutChoice;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Line that opens and closes a front matter block
pub const DELIMITER: &str = "+++";

/// Declarations a template makes about itself
///
/// ```text
/// +++
/// title = "About us"
/// layout = "none"
/// [slots]
/// scripts = "<script src=\"/chart.js\"></script>"
/// +++
/// <h1>About</h1>
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FrontMatter {
    #[serde(default)]
    pub title: Option<String>,

    /// `"none"`, `"default"` or a layout id
    #[serde(default)]
    pub layout: Option<String>,

    #[serde(default)]
    pub redirect: Option<String>,

    /// Extra layout slots, e.g. page-level scripts
    #[serde(default)]
    pub slots: BTreeMap<String, String>,
}

impl FrontMatter {
    pub fn layout_choice(&self) -> Option<LayoutChoice> {
        self.layout.as_deref().map(LayoutChoice::parse)
    }
}

/// Splits a template into its front matter and body
///
/// Sources without an opening `+++` line, or whose block is never closed,
/// are returned whole with empty front matter.
pub fn split(source: &str) -> Result<(FrontMatter, &str), toml::de::Error> {
    let Some(header_and_body) = strip_opening(source) else {
        return Ok((FrontMatter::default(), source));
    };

    let mut offset = 0;
    for line in header_and_body.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let header = &header_and_body[..offset];
            let body = &header_and_body[offset + line.len()..];
            return Ok((toml::from_str(header)?, body));
        }
        offset += line.len();
    }

    Ok((FrontMatter::default(), source))
}

fn strip_opening(source: &str) -> Option<&str> {
    let rest = source.trim_start_matches('\u{feff}').strip_prefix(DELIMITER)?;
    rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))
}
