//! catrec-schemas
//!
//! Wire types shared by every catrec crate: catalog records and their
//! configurable options.
//!
//! The remote update endpoint replaces a record's whole option list, so every
//! type here keeps the fields it does not interpret (`extra`) and writes them
//! back unchanged. Dropping them would silently strip data on the next write.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ---------------------------------------------------------------------------
// Option kind
// ---------------------------------------------------------------------------

/// Kind of a configurable option as reported by the catalog.
///
/// Serialized as the catalog's upper-case identifier. Kinds this crate does
/// not know are kept, upper-cased, in [`OptionKind::Other`], so matching is
/// case-insensitive for every kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OptionKind {
    Select,
    Radio,
    Checkbox,
    Size,
    Swatches,
    TextField,
    TextArea,
    Date,
    Files,
    Other(String),
}

impl OptionKind {
    pub fn as_str(&self) -> &str {
        match self {
            OptionKind::Select => "SELECT",
            OptionKind::Radio => "RADIO",
            OptionKind::Checkbox => "CHECKBOX",
            OptionKind::Size => "SIZE",
            OptionKind::Swatches => "SWATCHES",
            OptionKind::TextField => "TEXTFIELD",
            OptionKind::TextArea => "TEXTAREA",
            OptionKind::Date => "DATE",
            OptionKind::Files => "FILES",
            OptionKind::Other(s) => s.as_str(),
        }
    }

    /// `true` for kinds whose value is picked from `choices`.
    pub fn has_choices(&self) -> bool {
        matches!(
            self,
            OptionKind::Select
                | OptionKind::Radio
                | OptionKind::Checkbox
                | OptionKind::Size
                | OptionKind::Swatches
        )
    }

    pub fn parse(s: &str) -> Self {
        let upper = s.trim().to_ascii_uppercase();
        match upper.as_str() {
            "SELECT" => OptionKind::Select,
            "RADIO" => OptionKind::Radio,
            "CHECKBOX" => OptionKind::Checkbox,
            "SIZE" => OptionKind::Size,
            "SWATCHES" => OptionKind::Swatches,
            "TEXTFIELD" => OptionKind::TextField,
            "TEXTAREA" => OptionKind::TextArea,
            "DATE" => OptionKind::Date,
            "FILES" => OptionKind::Files,
            _ => OptionKind::Other(upper),
        }
    }
}

impl From<String> for OptionKind {
    fn from(s: String) -> Self {
        OptionKind::parse(&s)
    }
}

impl From<OptionKind> for String {
    fn from(k: OptionKind) -> Self {
        k.as_str().to_string()
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Option
// ---------------------------------------------------------------------------

/// One selectable value of a choice-bearing option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChoice {
    pub text: String,
    /// Price modifiers and anything else the catalog attaches to a choice.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OptionChoice {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            extra: Map::new(),
        }
    }
}

/// A named configuration field on a record.
///
/// `name` is the matching key. The catalog does not enforce uniqueness; the
/// rule engine treats it as unique within one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOption {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: OptionKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<OptionChoice>,
    /// Zero-based index into `choices`. Meaningful only when `choices` is non-empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_choice: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProductOption {
    pub fn new(name: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            choices: Vec::new(),
            default_choice: None,
            extra: Map::new(),
        }
    }

    pub fn with_choices<S: AsRef<str>>(mut self, texts: &[S]) -> Self {
        self.choices = texts.iter().map(|t| OptionChoice::new(t.as_ref())).collect();
        self
    }

    pub fn with_default_choice(mut self, idx: Option<u32>) -> Self {
        self.default_choice = idx;
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Catalog ids arrive as JSON numbers; they are kept opaque as strings.
fn id_from_number_or_string<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Num(u64),
        Str(String),
    }

    Ok(match RawId::deserialize(de)? {
        RawId::Num(n) => n.to_string(),
        RawId::Str(s) => s,
    })
}

/// One entry of a list page.
///
/// `options` is `Some` only when the list call embedded the option list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSummary {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: String,
    #[serde(rename = "name", default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<ProductOption>>,
}

/// A record with its current option list, as returned by the detail call.
///
/// `options == None` means the catalog omitted the list entirely, which is
/// different from an empty list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: String,
    #[serde(rename = "name", default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<ProductOption>>,
}

impl From<RecordSummary> for Record {
    fn from(s: RecordSummary) -> Self {
        Self {
            id: s.id,
            label: s.label,
            options: s.options,
        }
    }
}

/// One page of a filtered list call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPage {
    pub items: Vec<RecordSummary>,
    /// Total matching records, when the catalog reports it.
    pub total: Option<u64>,
    pub has_more: bool,
}

impl RecordPage {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: Some(0),
            has_more: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
