//! Front-matter extraction for markdown documents.
//!
//! Two delimiters are recognised: YAML-like `---` blocks parsed line by line
//! (`key: value`) and TOML `+++` blocks parsed with the `toml` crate. Both end
//! up in the same JSON value model so later pipeline stages do not care which
//! syntax the author used.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use super::error::DomainError;

/// Key/value metadata at the head of a markdown document. Key order follows
/// the source document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frontmatter(Map<String, Value>);

impl Frontmatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for Frontmatter {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Frontmatter {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontmatterFormat {
    Yaml,
    Toml,
}

/// A markdown source split into its metadata and body.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitDocument<'a> {
    pub frontmatter: Frontmatter,
    pub format: Option<FrontmatterFormat>,
    pub body: &'a str,
}

/// Split `content` into frontmatter and body. Documents without a
/// recognised frontmatter block get an empty mapping and the whole input as
/// body.
pub fn split_document(content: &str) -> Result<SplitDocument<'_>, DomainError> {
    let Some((raw, body, format)) = detect_frontmatter(content) else {
        return Ok(SplitDocument {
            frontmatter: Frontmatter::new(),
            format: None,
            body: content,
        });
    };

    let frontmatter = match format {
        FrontmatterFormat::Yaml => parse_yaml_like(raw),
        FrontmatterFormat::Toml => parse_toml(raw)?,
    };

    Ok(SplitDocument {
        frontmatter,
        format: Some(format),
        body,
    })
}

fn detect_frontmatter(content: &str) -> Option<(&str, &str, FrontmatterFormat)> {
    let trimmed = content.trim_start();

    for (fence, format) in [
        ("---", FrontmatterFormat::Yaml),
        ("+++", FrontmatterFormat::Toml),
    ] {
        let Some(rest) = trimmed.strip_prefix(fence) else {
            continue;
        };
        if !rest.starts_with(['\n', '\r']) {
            continue;
        }
        let closing = format!("\n{fence}");
        if let Some(end) = rest.find(&closing) {
            let raw = rest[..end].trim();
            let after = &rest[end + closing.len()..];
            let body = after
                .strip_prefix("\r\n")
                .or_else(|| after.strip_prefix('\n'))
                .unwrap_or(after);
            return Some((raw, body.trim_start_matches(['\n', '\r']), format));
        }
    }

    None
}

fn parse_yaml_like(content: &str) -> Frontmatter {
    let mut frontmatter = Frontmatter::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            frontmatter.insert(key, parse_yaml_value(value.trim()));
        }
    }

    frontmatter
}

/// Scalar and flow-sequence values of the YAML subset used in post headers.
fn parse_yaml_value(s: &str) -> Value {
    if s.is_empty() || s == "~" || s.eq_ignore_ascii_case("null") {
        return Value::Null;
    }
    if s.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if s.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Some(unquoted) = unquote(s) {
        return Value::String(unquoted.to_string());
    }
    if let Ok(n) = s.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(n) = s.parse::<f64>()
        && let Some(num) = Number::from_f64(n)
    {
        return Value::Number(num);
    }
    if let Some(inner) = s.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
        return Value::Array(
            inner
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(parse_yaml_value)
                .collect(),
        );
    }

    Value::String(s.to_string())
}

fn unquote(s: &str) -> Option<&str> {
    ['"', '\''].into_iter().find_map(|quote| {
        s.strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
    })
}

fn parse_toml(content: &str) -> Result<Frontmatter, DomainError> {
    let table: toml::Table = toml::from_str(content)
        .map_err(|err| DomainError::validation(format!("invalid TOML frontmatter: {err}")))?;

    Ok(table
        .into_iter()
        .map(|(key, value)| (key, toml_to_json(value)))
        .collect())
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}
