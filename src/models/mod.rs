pub mod fields;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use self::fields::FieldKey;

/// One row of the invoices table as returned by NocoDB.
///
/// Columns other than the identity and timestamps are kept raw so that
/// both spellings of a dual-key field survive; read them through
/// [`InvoiceRecord::get`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(rename = "CreatedAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "UpdatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl InvoiceRecord {
    pub fn get<T: DeserializeOwned>(&self, key: FieldKey) -> Option<T> {
        fields::resolve(Some(self), &key.candidates())
    }

    pub fn value(&self, key: FieldKey) -> Option<&Value> {
        fields::resolve_value(Some(self), &key.candidates())
    }

    /// String field with empty values treated as missing.
    pub fn text(&self, key: FieldKey) -> Option<String> {
        self.get::<String>(key).filter(|s| !s.is_empty())
    }

    pub fn number(&self, key: FieldKey) -> Option<f64> {
        self.get::<f64>(key)
    }

    pub fn status(&self) -> InvoiceStatus {
        InvoiceStatus::from_raw(self.get::<String>(fields::STATUS).as_deref())
    }

    pub fn po_status(&self) -> Option<PoStatus> {
        self.get::<String>(fields::PO_STATUS)
            .as_deref()
            .and_then(PoStatus::from_raw)
    }

    pub fn has_po_number(&self) -> bool {
        fields::is_truthy(self.value(fields::PURCHASE_ORDER_NUMBER))
    }

    pub fn line_items(&self) -> Vec<LineItem> {
        LineItem::parse_list(self.get::<String>(fields::LINE_ITEMS).as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceStatus {
    PendingValidation,
    PendingPo,
    Validated,
    Rejected,
    Paid,
    Unknown,
}

impl InvoiceStatus {
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw {
            Some("pending_validation") => InvoiceStatus::PendingValidation,
            Some("pending_po") => InvoiceStatus::PendingPo,
            Some("validated") => InvoiceStatus::Validated,
            Some("rejected") => InvoiceStatus::Rejected,
            Some("paid") => InvoiceStatus::Paid,
            _ => InvoiceStatus::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InvoiceStatus::PendingValidation => "To review",
            InvoiceStatus::PendingPo => "Pending PO",
            InvoiceStatus::Validated => "Validated",
            InvoiceStatus::Rejected => "Rejected",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoStatus {
    Linked,
    Missing,
    NotRequired,
}

impl PoStatus {
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw {
            "linked" => Some(PoStatus::Linked),
            "missing" => Some(PoStatus::Missing),
            "not_required" => Some(PoStatus::NotRequired),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub line_number: Option<i64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit_price: Option<f64>,
    #[serde(default)]
    pub total: Option<f64>,
}

impl LineItem {
    /// Decodes the `Line_Items` payload; anything unreadable yields no items.
    pub fn parse_list(raw: Option<&str>) -> Vec<LineItem> {
        let Some(raw) = raw.filter(|r| !r.is_empty()) else {
            return Vec::new();
        };
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            Ok(_) => Vec::new(),
            Err(err) => {
                tracing::debug!("Unreadable line items payload: {}", err);
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    MissingPo,
    LowConfidence,
    NeedsReview,
    ValidationError,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::MissingPo => "missing-po",
            IssueKind::LowConfidence => "low-confidence",
            IssueKind::NeedsReview => "needs-review",
            IssueKind::ValidationError => "validation-error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub title: String,
    pub description: String,
    pub kind: IssueKind,
}

impl Issue {
    pub fn new(kind: IssueKind, title: &str, description: impl Into<String>) -> Self {
        Issue {
            id: kind.as_str().to_string(),
            title: title.to_string(),
            description: description.into(),
            kind,
        }
    }
}

/// Business actions exposed by the workflow webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Validate,
    Review,
    RequestPo,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Validate => "validate",
            Action::Review => "review",
            Action::RequestPo => "request-po",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Action::Validate => "Validate",
            Action::Review => "Mark to Review",
            Action::RequestPo => "Request PO",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtherEmail {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub received_at: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingLog {
    #[serde(rename = "Id")]
    pub id: i64,
    #[serde(default)]
    pub invoice_id: Option<i64>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub total_rows: Option<u64>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub page_size: Option<u64>,
    #[serde(default)]
    pub is_first_page: Option<bool>,
    #[serde(default)]
    pub is_last_page: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub list: Vec<T>,
    #[serde(rename = "pageInfo", default)]
    pub page_info: PageInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub sort: Option<String>,
    pub filter: Option<String>,
}

impl ListQuery {
    /// Query pairs as NocoDB expects them; zero limit/offset are left out.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset.filter(|o| *o > 0) {
            pairs.push(("offset", offset.to_string()));
        }
        if let Some(sort) = self.sort.as_ref().filter(|s| !s.is_empty()) {
            pairs.push(("sort", sort.clone()));
        }
        if let Some(filter) = self.filter.as_ref().filter(|w| !w.is_empty()) {
            pairs.push(("where", filter.clone()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub nocodb_url: String,
    pub nocodb_token: String,
    pub webhook_url: String,
    pub page_size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_keeps_both_spellings() {
        let rec: InvoiceRecord = serde_json::from_value(json!({
            "Id": 12,
            "CreatedAt": "2024-03-01 10:00:00",
            "Subtotal HT": 100.0,
            "Supplier_Name": "ACME"
        }))
        .unwrap();
        assert_eq!(rec.id, 12);
        assert_eq!(rec.created_at.as_deref(), Some("2024-03-01 10:00:00"));
        assert_eq!(rec.number(fields::SUBTOTAL_HT), Some(100.0));
        assert_eq!(rec.text(fields::SUPPLIER_NAME).as_deref(), Some("ACME"));
        assert!(!rec.fields.contains_key("Id"));
    }

    #[test]
    fn test_line_items_fallbacks() {
        assert!(LineItem::parse_list(None).is_empty());
        assert!(LineItem::parse_list(Some("not json")).is_empty());
        assert!(LineItem::parse_list(Some("{\"a\":1}")).is_empty());

        let items = LineItem::parse_list(Some(
            r#"[{"line_number":1,"description":"Paper","quantity":2,"unit_price":3.5,"total":7}]"#,
        ));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].description, "Paper");
        assert_eq!(items[0].total, Some(7.0));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(InvoiceStatus::from_raw(Some("pending_po")).label(), "Pending PO");
        assert_eq!(InvoiceStatus::from_raw(Some("archived")), InvoiceStatus::Unknown);
        assert_eq!(InvoiceStatus::from_raw(None).label(), "Unknown");
    }

    #[test]
    fn test_list_query_pairs() {
        let query = ListQuery {
            limit: Some(50),
            offset: Some(0),
            sort: Some("-CreatedAt".to_string()),
            filter: None,
        };
        assert_eq!(
            query.to_pairs(),
            vec![("limit", "50".to_string()), ("sort", "-CreatedAt".to_string())]
        );
    }

    #[test]
    fn test_issue_kind_serializes_kebab_case() {
        let issue = Issue::new(IssueKind::MissingPo, "t", "d");
        let value = serde_json::to_value(&issue).unwrap();
        assert_eq!(value["kind"], "missing-po");
        assert_eq!(value["id"], "missing-po");
    }
}
