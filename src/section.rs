//! Section location: finds the `post_install` block in a Podfile.
//!
//! A section starts at the start marker (anywhere on a line) and runs,
//! across lines, to the first line that is exactly the closing marker.
//! The span ends before that line's newline, so surrounding bytes are
//! untouched by a replacement.

use regex::Regex;

/// Start marker of the CocoaPods post-install hook.
pub const POST_INSTALL_MARKER: &str = "post_install do |installer|";

/// Line that closes a top-level Ruby block.
pub const CLOSING_MARKER: &str = "end";

/// A located section, as byte offsets into the searched content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionMatch {
    /// Starting byte offset (inclusive)
    pub byte_start: usize,
    /// Ending byte offset (exclusive)
    pub byte_end: usize,
    /// Text of the section at [byte_start, byte_end)
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct SectionLocator {
    regex: Regex,
}

impl SectionLocator {
    /// Build a locator for a section opened by `start` and closed by a line
    /// consisting solely of `end`. Both markers are matched literally.
    pub fn new(start: &str, end: &str) -> Result<Self, regex::Error> {
        let pattern = format!(
            r"(?ms){}.*?^{}$",
            regex::escape(start),
            regex::escape(end)
        );
        Ok(Self {
            regex: Regex::new(&pattern)?,
        })
    }

    /// Locator for `post_install do |installer|` ... `end`.
    pub fn post_install() -> Result<Self, regex::Error> {
        Self::new(POST_INSTALL_MARKER, CLOSING_MARKER)
    }

    /// Find the first section in `content`.
    ///
    /// Later sections, if any, are ignored.
    pub fn locate(&self, content: &str) -> Option<SectionMatch> {
        self.regex.find(content).map(|m| SectionMatch {
            byte_start: m.start(),
            byte_end: m.end(),
            text: m.as_str().to_string(),
        })
    }
}
