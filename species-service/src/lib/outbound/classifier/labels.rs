use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::Path;

/// Class names indexed by model output position.
///
/// Positions without a name render as `class_<index>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labels(Vec<String>);

impl Labels {
    pub fn from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        fs::read_to_string(path).map(|text| Self::parse(&text))
    }

    /// One label per line; surrounding whitespace is dropped, blank lines keep
    /// their slot so indices stay aligned.
    pub fn parse(text: &str) -> Self {
        Self(text.lines().map(|line| line.trim().to_string()).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn name(&self, index: usize) -> Cow<'_, str> {
        match self.0.get(index) {
            Some(label) if !label.is_empty() => Cow::Borrowed(label),
            _ => Cow::Owned(format!("class_{index}")),
        }
    }
}
