//! # Label Records
//!
//! Normalized, preset-independent projection of one source entity.
//!
//! Source records arrive as already-fetched JSON whose field names differ by
//! record kind (`foreName`/`surname` on orders, `name` on ceremonies,
//! `toName` on institutions). [`project`] collapses them onto one shape so
//! layout and rendering never branch on the source kind or on nullability.
//!
//! ## Example
//!
//! ```
//! use regalia_labels::record::{project, RecordKind};
//! use serde_json::json;
//!
//! let record = project(
//!     &json!({"foreName": "Ada", "surname": "Lovelace", "phone": null}),
//!     RecordKind::Order,
//! );
//! assert_eq!(record.name, "Ada Lovelace");
//! assert_eq!(record.phone, "");
//! ```

mod project;

pub use project::{project, project_all};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which backend shape a source record has.
///
/// Resolved once at the projector boundary; nothing downstream re-derives it.
/// Deserializes through [`RecordKind::parse`], so JSON accepts the same
/// aliases and casing as the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum RecordKind {
    /// Individual gown order.
    Order,
    /// Bulk order for a graduation ceremony.
    Ceremony,
    /// Institutional row (school, college, department).
    Institution,
    /// Internal management form.
    Internal,
}

impl TryFrom<String> for RecordKind {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        RecordKind::parse(&s).ok_or_else(|| format!("unknown record kind '{}'", s))
    }
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Order,
        RecordKind::Ceremony,
        RecordKind::Institution,
        RecordKind::Internal,
    ];

    /// Stable slug used in filenames and APIs.
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Order => "order",
            RecordKind::Ceremony => "ceremony",
            RecordKind::Institution => "institution",
            RecordKind::Internal => "internal",
        }
    }

    /// Parse a kind name, accepting the aliases the console uses.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "order" | "individual" => Some(RecordKind::Order),
            "ceremony" | "bulk" => Some(RecordKind::Ceremony),
            "institution" | "institutional" => Some(RecordKind::Institution),
            "internal" | "management" => Some(RecordKind::Internal),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized label.
///
/// Every field is a trimmed string; absent source values are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRecord {
    /// Source identifier, used to derive stable card keys.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    /// City, region and postcode on one line.
    #[serde(default)]
    pub city: String,
    /// For-the-attention-of line.
    #[serde(default)]
    pub attention: String,
    #[serde(default)]
    pub phone: String,
    /// Identifying code for bulk variants; empty for individual orders.
    #[serde(default)]
    pub code: String,
}

impl LabelRecord {
    /// True when every printable field is empty.
    pub fn is_blank(&self) -> bool {
        [
            &self.name,
            &self.address_line1,
            &self.address_line2,
            &self.city,
            &self.attention,
            &self.phone,
            &self.code,
        ]
        .iter()
        .all(|f| f.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_aliases() {
        assert_eq!(RecordKind::parse("individual"), Some(RecordKind::Order));
        assert_eq!(RecordKind::parse("BULK"), Some(RecordKind::Ceremony));
        assert_eq!(RecordKind::parse("institutional"), Some(RecordKind::Institution));
        assert_eq!(RecordKind::parse("management"), Some(RecordKind::Internal));
        assert_eq!(RecordKind::parse("temp-123"), None);
    }

    #[test]
    fn test_kind_serde_aliases() {
        let kind: RecordKind = serde_json::from_str("\"bulk\"").unwrap();
        assert_eq!(kind, RecordKind::Ceremony);
        let kind: RecordKind = serde_json::from_str("\"BULK\"").unwrap();
        assert_eq!(kind, RecordKind::Ceremony);
        let kind: RecordKind = serde_json::from_str("\" Individual \"").unwrap();
        assert_eq!(kind, RecordKind::Order);
        assert!(serde_json::from_str::<RecordKind>("\"wholesale\"").is_err());
        assert_eq!(serde_json::to_string(&RecordKind::Institution).unwrap(), "\"institution\"");
    }

    #[test]
    fn test_blank_record() {
        assert!(LabelRecord::default().is_blank());
        let record = LabelRecord {
            phone: "01234".to_string(),
            ..Default::default()
        };
        assert!(!record.is_blank());
    }
}
