// SPDX-License-Identifier: MPL-2.0

//! Core types for frame processing results

use chrono::{DateTime, Local};

/// A decoded symbol
#[derive(Debug, Clone, PartialEq)]
pub struct QrDetection {
    /// Decoded text
    pub content: String,
}

/// The outcome of a successful scan
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    pub text: String,
    /// Set when the text parses as an absolute URL
    pub link: Option<url::Url>,
    pub scanned_at: DateTime<Local>,
}

impl ScanResult {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let link = parse_link(&text);
        Self {
            text,
            link,
            scanned_at: Local::now(),
        }
    }

    pub fn is_link(&self) -> bool {
        self.link.is_some()
    }
}

/// Absolute URL contained in `text`, if the whole text is one
///
/// Relative references and bare host names are not links; leading and
/// trailing whitespace is ignored.
pub fn parse_link(text: &str) -> Option<url::Url> {
    url::Url::parse(text.trim()).ok()
}
