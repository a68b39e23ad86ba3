//! Field access over the two encodings of a DescribeJobFlows response.
//!
//! The status types are built once against [`StatusSource`]; this module
//! supplies the XML element implementation ([`XmlSource`]) and the decoded
//! JSON map implementation ([`MapSource`]). Paths use the XML form
//! (`ExecutionStatusDetail/State`) in both cases.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::xml::XmlElement;

/// One instance group record with normalised (snake_case) field names.
pub type InstanceGroup = Map<String, Value>;

/// Read access to one job flow or step record.
pub trait StatusSource: Sized {
    /// Trimmed text at `path`; empty when the field is absent.
    fn text(&self, path: &str) -> String;

    /// Timestamp at `path`; `None` for the encoding's absent sentinel.
    fn timestamp(&self, path: &str) -> Option<DateTime<Utc>>;

    /// The records of a list field (e.g. `Steps`), in wire order.
    fn items(&self, list: &str) -> Vec<Self>;

    /// Instance group records under `Instances/InstanceGroups`.
    fn instance_groups(&self) -> Vec<InstanceGroup>;

    /// Like [`text`](Self::text), but `None` when empty.
    fn optional_text(&self, path: &str) -> Option<String> {
        Some(self.text(path)).filter(|s| !s.is_empty())
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty() && *s != ".")
}

// ── XML ─────────────────────────────────────────────────────────────────

/// A `<member>` element of a DescribeJobFlows response.
#[derive(Debug, Clone, Copy)]
pub struct XmlSource<'a>(pub &'a XmlElement);

impl<'a> StatusSource for XmlSource<'a> {
    fn text(&self, path: &str) -> String {
        self.0.text_at(path).trim().to_string()
    }

    /// Empty text is the absent sentinel.
    fn timestamp(&self, path: &str) -> Option<DateTime<Utc>> {
        let raw = self.text(path);
        if raw.is_empty() {
            return None;
        }
        parse_xml_timestamp(&raw)
    }

    fn items(&self, list: &str) -> Vec<Self> {
        self.0
            .find_all(&format!("{}/member", list))
            .into_iter()
            .map(XmlSource)
            .collect()
    }

    // Instance groups are only read from the map encoding.
    fn instance_groups(&self) -> Vec<InstanceGroup> {
        Vec::new()
    }
}

/// Parse an ISO-8601 timestamp; offsets are honoured, naive values are UTC.
pub fn parse_xml_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    log::warn!("Ignoring unparseable timestamp '{}'", raw);
    None
}

// ── Map ─────────────────────────────────────────────────────────────────

/// A job flow or step object from a JSON-decoded response.
#[derive(Debug, Clone, Copy)]
pub struct MapSource<'a>(pub &'a Value);

impl<'a> MapSource<'a> {
    fn lookup(&self, path: &str) -> Option<&'a Value> {
        segments(path).try_fold(self.0, |value, key| value.get(key))
    }
}

impl<'a> StatusSource for MapSource<'a> {
    fn text(&self, path: &str) -> String {
        match self.lookup(path) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.trim().to_string(),
            Some(other) => other.to_string().trim().to_string(),
        }
    }

    /// Epoch seconds; zero (or a missing/non-numeric value) is the absent sentinel.
    fn timestamp(&self, path: &str) -> Option<DateTime<Utc>> {
        let seconds = self.lookup(path).map(epoch_seconds).unwrap_or(0);
        if seconds == 0 {
            return None;
        }
        Utc.timestamp_opt(seconds, 0).single()
    }

    fn items(&self, list: &str) -> Vec<Self> {
        self.lookup(list)
            .and_then(Value::as_array)
            .map(|items| items.iter().map(MapSource).collect())
            .unwrap_or_default()
    }

    fn instance_groups(&self) -> Vec<InstanceGroup> {
        self.lookup("Instances/InstanceGroups")
            .and_then(Value::as_array)
            .map(|groups| {
                groups
                    .iter()
                    .filter_map(Value::as_object)
                    .map(normalize_keys)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Integer seconds from a JSON number (floats truncate) or a numeric string
/// (leading integer part, as `"1388534400abc"` → 1388534400). Anything else is 0.
pub fn epoch_seconds(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => leading_integer(s.trim()),
        _ => 0,
    }
}

fn leading_integer(s: &str) -> i64 {
    let digits_start = usize::from(s.starts_with('-') || s.starts_with('+'));
    let end = s[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map(|i| i + digits_start)
        .unwrap_or(s.len());
    s[..end].parse().unwrap_or(0)
}

// ── Key normalisation ───────────────────────────────────────────────────

lazy_static! {
    static ref ACRONYM_BOUNDARY: Regex =
        Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("acronym boundary pattern");
    static ref WORD_BOUNDARY: Regex =
        Regex::new(r"([a-z0-9])([A-Z])").expect("word boundary pattern");
}

/// `InstanceGroupId` → `instance_group_id`, `EC2InstanceId` → `ec2_instance_id`.
///
/// Splits an uppercase run from a following capitalised word first, then a
/// lowercase letter or digit from a following capital, then lower-cases.
pub fn underscore(key: &str) -> String {
    let split_acronyms = ACRONYM_BOUNDARY.replace_all(key, "${1}_${2}");
    WORD_BOUNDARY
        .replace_all(&split_acronyms, "${1}_${2}")
        .to_lowercase()
}

fn normalize_keys(record: &Map<String, Value>) -> InstanceGroup {
    record
        .iter()
        .map(|(k, v)| (underscore(k), v.clone()))
        .collect()
}
