use std::collections::BTreeSet;
use std::str::FromStr;

use regex::Regex;
use serde_json::Value;

use cell::Point;
use errors::*;

/// A coordinate extraction strategy: a pure probe of one record layout.
pub type ExtractPoint = fn(&Value) -> Option<Point>;

/// Extraction strategies in priority order. The first one yielding a well-formed pair wins.
pub const EXTRACTION_STRATEGIES: [ExtractPoint; 3] =
    [point_from_coordinates, point_from_geometry, point_from_geo];

/// Returns the tweet body of a record line.
///
/// Harvested rows wrap the tweet under `doc`; bare tweets are their own body.
pub fn tweet_body(record: &Value) -> &Value {
    match record.get("doc") {
        Some(doc) if doc.is_object() => doc,
        _ => record,
    }
}

fn pair(value: Option<&Value>) -> Option<(f64, f64)> {
    let array = value?.as_array()?;
    if array.len() != 2 {
        return None;
    }
    let first = array[0].as_f64()?;
    let second = array[1].as_f64()?;
    if first.is_finite() && second.is_finite() {
        Some((first, second))
    } else {
        None
    }
}

/// `coordinates.coordinates` on the tweet body, in (x, y) order.
pub fn point_from_coordinates(record: &Value) -> Option<Point> {
    let coordinates = tweet_body(record).get("coordinates")?;
    pair(coordinates.get("coordinates")).map(|(x, y)| Point::new(x, y))
}

/// `value.geometry.coordinates` on the row, in (x, y) order.
pub fn point_from_geometry(record: &Value) -> Option<Point> {
    let geometry = record.get("value")?.get("geometry")?;
    pair(geometry.get("coordinates")).map(|(x, y)| Point::new(x, y))
}

/// The deprecated `geo.coordinates` field on the tweet body, stored as (y, x).
pub fn point_from_geo(record: &Value) -> Option<Point> {
    let geo = tweet_body(record).get("geo")?;
    pair(geo.get("coordinates")).map(|(y, x)| Point::new(x, y))
}

/// Tries every extraction strategy in order.
pub fn extract_point(record: &Value) -> Option<Point> {
    EXTRACTION_STRATEGIES
        .iter()
        .filter_map(|strategy| strategy(record))
        .next()
}

/// Where hashtags are read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashtagSource {
    /// The structured `entities.hashtags[].text` list.
    Entities,
    /// Tokens of the free `text` field that look like tags.
    Text,
}

impl Default for HashtagSource {
    fn default() -> Self {
        HashtagSource::Entities
    }
}

impl FromStr for HashtagSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "entities" => Ok(HashtagSource::Entities),
            "text" => Ok(HashtagSource::Text),
            _ => Err(format!("Unknown hashtag source: {}", s).into()),
        }
    }
}

/// Lowercases a tag and gives it a single leading `#`.
pub fn normalise_hashtag(tag: &str) -> Option<String> {
    let bare = tag.trim().trim_start_matches('#');
    if bare.is_empty() {
        return None;
    }
    Some(format!("#{}", bare.to_lowercase()))
}

/// `HashtagExtractor` pulls the case-normalised, deduplicated hashtag set out of a record.
#[derive(Clone, Debug)]
pub struct HashtagExtractor {
    source: HashtagSource,
    token_pattern: Regex,
}

impl HashtagExtractor {
    pub fn new(source: HashtagSource) -> Self {
        HashtagExtractor {
            source,
            // A literal pattern; compilation cannot fail.
            token_pattern: Regex::new(r"^#(\w+)").unwrap(),
        }
    }

    pub fn source(&self) -> HashtagSource {
        self.source
    }

    pub fn extract(&self, record: &Value) -> BTreeSet<String> {
        let body = tweet_body(record);
        match self.source {
            HashtagSource::Entities => self.from_entities(body),
            HashtagSource::Text => self.from_text(body),
        }
    }

    fn from_entities(&self, body: &Value) -> BTreeSet<String> {
        let hashtags = body.get("entities")
            .and_then(|entities| entities.get("hashtags"))
            .and_then(Value::as_array);

        match hashtags {
            Some(list) => {
                list.iter()
                    .filter_map(|tag| tag.get("text").and_then(Value::as_str))
                    .filter_map(normalise_hashtag)
                    .collect()
            }
            None => BTreeSet::new(),
        }
    }

    fn from_text(&self, body: &Value) -> BTreeSet<String> {
        let text = match body.get("text").and_then(Value::as_str) {
            Some(text) => text,
            None => return BTreeSet::new(),
        };

        text.split_whitespace()
            .filter_map(|token| self.token_pattern.captures(token))
            .filter_map(|captures| captures.get(1))
            .filter_map(|tag| normalise_hashtag(tag.as_str()))
            .collect()
    }
}
