use serde::{Deserialize, Serialize};

/// Deepest sub-timeline nesting the renderer accepts.
pub const MAX_TIMELINE_DEPTH: usize = 8;

/// Literal separator used by the legacy single-string description form.
pub const LEGACY_SENTENCE_SEPARATOR: &str = ". ";

/// One node of a career timeline: a job, a role or a milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub date: String,
    pub title: String,
    #[serde(default)]
    pub description: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<Event>,
}

impl Event {
    pub fn new(date: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            title: title.into(),
            description: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn with_description<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.description = lines.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_events(mut self, events: Vec<Event>) -> Self {
        self.events = events;
        self
    }
}

/// Description as it appears in timeline data files. Older files store a
/// single paragraph instead of pre-segmented lines.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawDescription {
    Lines(Vec<String>),
    Paragraph(String),
}

impl Default for RawDescription {
    fn default() -> Self {
        Self::Lines(Vec::new())
    }
}

/// Timeline entry exactly as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawEvent {
    pub date: String,
    pub title: String,
    #[serde(default)]
    pub description: RawDescription,
    #[serde(default)]
    pub events: Option<Vec<RawEvent>>,
}

/// Split a paragraph on the literal `". "` separator.
///
/// Lossy: abbreviations and decimals are split too.
pub fn split_sentences(paragraph: &str) -> Vec<String> {
    if paragraph.is_empty() {
        return Vec::new();
    }
    paragraph
        .split(LEGACY_SENTENCE_SEPARATOR)
        .map(str::to_string)
        .collect()
}
