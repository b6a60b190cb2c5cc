use serde_json::Value;

use crate::models::fields::{self, is_truthy};
use crate::models::{Action, InvoiceRecord, Issue, IssueKind, PoStatus};
use crate::utils::format_quantity;

pub const LOW_CONFIDENCE_THRESHOLD: f64 = 70.0;
const DEFAULT_CONFIDENCE: f64 = 100.0;

/// Confidence used for the low-confidence check and the "no issues" banner.
///
/// A non-null `Confidence_Score` is authoritative even when it is not a
/// number; the extraction confidence is only read when the score is absent.
pub fn effective_confidence(record: &InvoiceRecord) -> f64 {
    record
        .value(fields::CONFIDENCE_SCORE)
        .or_else(|| record.value(fields::EXTRACTION_CONFIDENCE))
        .map(confidence_from)
        .unwrap_or(DEFAULT_CONFIDENCE)
}

fn confidence_from(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(DEFAULT_CONFIDENCE),
        Value::String(s) => s.trim().parse().unwrap_or(DEFAULT_CONFIDENCE),
        _ => DEFAULT_CONFIDENCE,
    }
}

pub fn is_missing_po(record: &InvoiceRecord) -> bool {
    record.po_status() == Some(PoStatus::Missing) || !record.has_po_number()
}

/// Issues for one record, in display order.
pub fn derive_issues(record: &InvoiceRecord) -> Vec<Issue> {
    let mut issues = Vec::new();

    if is_missing_po(record) {
        issues.push(Issue::new(
            IssueKind::MissingPo,
            "Missing Purchase Order",
            "No PO number found in the invoice. A purchase order may be required for validation.",
        ));
    }

    let confidence = effective_confidence(record);
    if confidence < LOW_CONFIDENCE_THRESHOLD {
        issues.push(Issue::new(
            IssueKind::LowConfidence,
            "Low Extraction Confidence",
            format!(
                "The AI extraction confidence is {}%. Manual review recommended to verify extracted data.",
                format_quantity(confidence)
            ),
        ));
    }

    if is_truthy(record.value(fields::NEEDS_REVIEW)) {
        issues.push(Issue::new(
            IssueKind::NeedsReview,
            "Manual Review Required",
            "This invoice has been flagged for manual review due to potential data quality issues.",
        ));
    }

    if let Some(issue) = validation_issue(record) {
        issues.push(issue);
    }

    issues
}

// Malformed JSON surfaces the raw text while a well-formed empty list is
// silent. Kept as-is pending product review.
fn validation_issue(record: &InvoiceRecord) -> Option<Issue> {
    // the column is usually JSON text, but NocoDB may hand back the array itself
    let raw = match record.value(fields::VALIDATION_ERRORS)? {
        Value::String(s) if s.is_empty() => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Array(errors)) if !errors.is_empty() => {
            let joined = errors
                .iter()
                .map(|error| match error {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(". ");
            Some(Issue::new(IssueKind::ValidationError, "Validation Errors", joined))
        }
        Ok(_) => None,
        Err(_) => Some(Issue::new(IssueKind::ValidationError, "Validation Error", raw)),
    }
}

/// Actions the reviewer may trigger for `record`.
pub fn available_actions(record: &InvoiceRecord) -> Vec<Action> {
    let mut actions = vec![Action::Validate, Action::Review];
    if is_missing_po(record) {
        actions.push(Action::RequestPo);
    }
    actions
}
