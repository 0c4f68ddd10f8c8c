use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use crate::foundation::error::{ReelError, ReelResult};

/// Body text: one string, or one display line per entry.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Lines(Vec<String>),
}

impl Content {
    /// Units used by the dynamic hold policy: lines for multi-line content, words otherwise.
    pub fn unit_count(&self) -> usize {
        match self {
            Self::Text(s) => s.split_whitespace().count(),
            Self::Lines(lines) => lines.len(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ImageSpec {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

/// Value half of a dataset entry. Only `content` is required.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RumorValue {
    pub content: Content,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surtitle_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_class: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageSpec>,
}

impl RumorValue {
    pub fn new(content: Content) -> Self {
        Self {
            content,
            surtitle: None,
            surtitle_class: None,
            title: None,
            title_class: None,
            subtitle: None,
            subtitle_class: None,
            content_class: None,
            images: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ContentRecord {
    pub key: String,
    #[serde(flatten)]
    pub value: RumorValue,
}

impl ContentRecord {
    /// Explicit title, or the key.
    pub fn title(&self) -> &str {
        self.value.title.as_deref().unwrap_or(&self.key)
    }
}

/// Read-only rumor dataset keyed by title, in file order.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    records: Vec<ContentRecord>,
    index: HashMap<String, usize>,
}

impl Dataset {
    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            ReelError::validation(format!("open dataset JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn from_reader(mut r: impl Read) -> ReelResult<Self> {
        let mut s = String::new();
        r.read_to_string(&mut s)
            .map_err(|e| ReelError::validation(format!("read dataset JSON: {e}")))?;
        Self::from_json_str(&s)
    }

    /// Parse and validate. Entries without `content` are rejected here rather than at
    /// display time.
    pub fn from_json_str(s: &str) -> ReelResult<Self> {
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(s)?;
        let mut records = Vec::with_capacity(map.len());
        for (key, raw) in map {
            let value: RumorValue = serde_json::from_value(raw)
                .map_err(|e| ReelError::validation(format!("rumor '{key}': {e}")))?;
            records.push(ContentRecord { key, value });
        }
        Self::from_records(records)
    }

    pub fn from_records(records: Vec<ContentRecord>) -> ReelResult<Self> {
        if records.is_empty() {
            return Err(ReelError::validation("dataset must contain at least one rumor"));
        }
        let mut index = HashMap::with_capacity(records.len());
        for (i, rec) in records.iter().enumerate() {
            if rec.key.trim().is_empty() {
                return Err(ReelError::validation(format!(
                    "rumor #{i} has an empty key"
                )));
            }
            for img in &rec.value.images {
                if img.src.trim().is_empty() {
                    return Err(ReelError::validation(format!(
                        "rumor '{}' has an image with an empty src",
                        rec.key
                    )));
                }
            }
            if index.insert(rec.key.clone(), i).is_some() {
                return Err(ReelError::validation(format!(
                    "duplicate rumor key '{}'",
                    rec.key
                )));
            }
        }
        Ok(Self { records, index })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ContentRecord> {
        self.index.get(key).map(|&i| &self.records[i])
    }

    /// First record in file order.
    pub fn first(&self) -> Option<&ContentRecord> {
        self.records.first()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.records.iter().map(|r| r.key.as_str())
    }

    pub fn records(&self) -> &[ContentRecord] {
        &self.records
    }
}
