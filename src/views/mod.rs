//! Text renderers for the terminal dashboard.
//!
//! Every function here is a pure projection of store state and derived
//! issues; none of them fetch or mutate anything.

use std::fmt::Write as _;

use crate::models::fields;
use crate::models::{
    Action, InvoiceRecord, IssueKind, LineItem, OtherEmail, PoStatus, ProcessingLog,
};
use crate::services::issues::{available_actions, derive_issues, effective_confidence};
use crate::services::store::StoreSnapshot;
use crate::utils::{
    fit, format_amount, format_date, format_optional_amount, format_quantity, EMPTY,
};

pub const TITLE: &str = "Invoice Control (AI POC)";

fn or_empty(value: Option<String>) -> String {
    value.unwrap_or_else(|| EMPTY.to_string())
}

pub fn po_badge(record: &InvoiceRecord) -> Option<&'static str> {
    if record.has_po_number() {
        return Some("Linked");
    }
    match record.po_status() {
        Some(PoStatus::Linked) => Some("Linked"),
        Some(PoStatus::Missing) => Some("Missing PO"),
        Some(PoStatus::NotRequired) => Some("Not Required"),
        None => None,
    }
}

/// Pre-tax amount: the stored subtotal, else total minus tax.
pub fn amount_ht(record: &InvoiceRecord) -> f64 {
    record.number(fields::SUBTOTAL_HT).unwrap_or_else(|| {
        record.number(fields::TOTAL_AMOUNT).unwrap_or(0.0)
            - record.number(fields::TAX_AMOUNT).unwrap_or(0.0)
    })
}

pub fn has_issue(record: &InvoiceRecord, kind: IssueKind) -> bool {
    derive_issues(record).iter().any(|issue| issue.kind == kind)
}

pub fn render_list(snapshot: &StoreSnapshot, filter: Option<IssueKind>) -> String {
    if snapshot.is_loading() {
        return "Loading invoices...\n".to_string();
    }
    if let Some(error) = snapshot.error() {
        return format!("! {}\n", error);
    }

    let rows: Vec<&InvoiceRecord> = snapshot
        .invoices
        .iter()
        .filter(|record| filter.map_or(true, |kind| has_issue(record, kind)))
        .collect();
    if rows.is_empty() {
        return "No invoices found\n".to_string();
    }

    let selected_id = snapshot.selected.as_ref().map(|s| s.id);
    let mut out = String::new();
    for record in rows {
        let marker = if Some(record.id) == selected_id { ">" } else { " " };
        let supplier = record
            .text(fields::SUPPLIER_NAME)
            .unwrap_or_else(|| "Unknown Supplier".to_string());
        let currency = record.text(fields::CURRENCY);
        let amount = format_amount(
            record.number(fields::TOTAL_AMOUNT).unwrap_or(0.0),
            currency.as_deref(),
        );
        let _ = writeln!(
            out,
            "{} #{:<6} {} {:>16}  {}",
            marker,
            record.id,
            fit(&supplier, 32),
            amount,
            record.status().label()
        );
    }
    out
}

pub fn render_details(record: &InvoiceRecord) -> String {
    let currency = record.text(fields::CURRENCY);
    let currency = currency.as_deref();
    let po = or_empty(record.text(fields::PURCHASE_ORDER_NUMBER));
    let po = match po_badge(record) {
        Some(badge) => format!("{} [{}]", po, badge),
        None => po,
    };

    let grid = [
        ("Supplier", or_empty(record.text(fields::SUPPLIER_NAME))),
        ("Invoice Number", or_empty(record.text(fields::INVOICE_NUMBER))),
        (
            "Invoice Date",
            format_date(record.text(fields::INVOICE_DATE).as_deref()),
        ),
        (
            "Amount (TTC)",
            format_optional_amount(record.number(fields::TOTAL_AMOUNT), currency),
        ),
        ("PO Number", po),
        ("Amount (HT)", format_amount(amount_ht(record), currency)),
        ("Due Date", format_date(record.text(fields::DUE_DATE).as_deref())),
        (
            "Tax Amount (TVA)",
            format_optional_amount(record.number(fields::TAX_AMOUNT), currency),
        ),
    ];

    let mut out = String::from("Extracted Data\n");
    for (label, value) in grid.iter() {
        let _ = writeln!(out, "  {} {}", fit(label, 18), value);
    }
    out.push('\n');
    out.push_str(&render_line_items(&record.line_items(), currency));
    out
}

pub fn render_line_items(items: &[LineItem], currency: Option<&str>) -> String {
    let mut out = String::from("Line Items\n");
    if items.is_empty() {
        out.push_str("  No line items available\n");
        return out;
    }
    let _ = writeln!(
        out,
        "  {} {:>8} {:>14} {:>14}",
        fit("Description", 36),
        "Qty",
        "Unit Price",
        "Amount"
    );
    for item in items {
        let description = if item.description.is_empty() {
            EMPTY
        } else {
            item.description.as_str()
        };
        let _ = writeln!(
            out,
            "  {} {:>8} {:>14} {:>14}",
            fit(description, 36),
            item.quantity.map(format_quantity).unwrap_or_else(|| EMPTY.to_string()),
            format_optional_amount(item.unit_price, currency),
            format_optional_amount(item.total, currency)
        );
    }
    out
}

pub fn render_document(snapshot: &StoreSnapshot) -> String {
    let mut out = String::from("Invoice Document\n");
    if snapshot.is_loading() {
        out.push_str("  Loading...\n");
        return out;
    }
    let selected = snapshot.selected.as_ref();
    match selected.and_then(|record| record.text(fields::PDF_URL)) {
        Some(url) => {
            let _ = writeln!(out, "  {}", url);
        }
        None => {
            let headline = if selected.is_some() {
                "No PDF Available"
            } else {
                "No Invoice Selected"
            };
            let number = selected
                .and_then(|record| record.text(fields::INVOICE_NUMBER))
                .unwrap_or_else(|| "No invoice selected".to_string());
            let _ = writeln!(out, "  {}\n  {}", headline, number);
        }
    }
    out
}

pub fn render_issues(record: &InvoiceRecord, pending: Option<Action>) -> String {
    let mut out = String::from("Detected Issues (AI)\n");
    let issues = derive_issues(record);
    if issues.is_empty() {
        let _ = writeln!(
            out,
            "  ✓ No Issues Detected\n    The AI analysis found no issues with this invoice. Confidence: {}%",
            format_quantity(effective_confidence(record))
        );
    } else {
        for issue in &issues {
            let _ = writeln!(out, "  ! {}\n    {}", issue.title, issue.description);
        }
    }

    let actions = available_actions(record)
        .into_iter()
        .map(|action| {
            if pending == Some(action) {
                format!("[{} …]", action.label())
            } else {
                format!("[{}]", action.label())
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    let _ = writeln!(out, "\n  {}", actions);
    out
}

/// The whole page: list on top, then the selected invoice.
pub fn render_dashboard(snapshot: &StoreSnapshot, pending: Option<Action>) -> String {
    let mut out = format!("{}\n{}\n", TITLE, "=".repeat(TITLE.chars().count()));
    out.push_str(&render_list(snapshot, None));
    out.push('\n');
    out.push_str(&render_document(snapshot));
    if let Some(record) = snapshot.selected.as_ref() {
        out.push('\n');
        out.push_str(&render_details(record));
        out.push('\n');
        out.push_str(&render_issues(record, pending));
    }
    out
}

pub fn render_logs(logs: &[ProcessingLog]) -> String {
    if logs.is_empty() {
        return "No processing logs\n".to_string();
    }
    let mut out = String::new();
    for log in logs {
        let invoice = log
            .invoice_id
            .map(|id| format!("#{}", id))
            .unwrap_or_else(|| EMPTY.to_string());
        let _ = writeln!(
            out,
            "{} {} {} {}",
            fit(&format_date(log.created_at.as_deref()), 14),
            fit(&invoice, 8),
            fit(log.action.as_deref().unwrap_or(EMPTY), 14),
            log.message.as_deref().unwrap_or("")
        );
    }
    out
}

pub fn render_emails(emails: &[OtherEmail]) -> String {
    if emails.is_empty() {
        return "No other emails\n".to_string();
    }
    let mut out = String::new();
    for email in emails {
        let _ = writeln!(
            out,
            "#{:<6} {} {} {} {}",
            email.id,
            fit(&format_date(email.received_at.as_deref()), 14),
            fit(email.sender.as_deref().unwrap_or(EMPTY), 28),
            fit(email.category.as_deref().unwrap_or(EMPTY), 12),
            email.subject.as_deref().unwrap_or(EMPTY)
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::store::LoadState;
    use serde_json::json;

    fn record(value: serde_json::Value) -> InvoiceRecord {
        serde_json::from_value(value).unwrap()
    }

    fn snapshot(invoices: Vec<InvoiceRecord>, selected: Option<usize>) -> StoreSnapshot {
        StoreSnapshot {
            load_state: LoadState::Ready,
            selected: selected.map(|i| invoices[i].clone()),
            invoices,
        }
    }

    #[test]
    fn test_list_marks_selection_and_falls_back_on_supplier() {
        let snap = snapshot(
            vec![
                record(json!({"Id": 1, "Supplier_Name": "ACME", "Total_Amount": 12.5, "Status": "validated"})),
                record(json!({"Id": 2})),
            ],
            Some(0),
        );
        let out = render_list(&snap, None);
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("> #1"));
        assert!(lines[0].contains("12,50\u{a0}€"));
        assert!(lines[0].ends_with("Validated"));
        assert!(lines[1].contains("Unknown Supplier"));
        assert!(lines[1].contains("0,00\u{a0}€"));
        assert!(lines[1].ends_with("Unknown"));
    }

    #[test]
    fn test_list_states() {
        let mut snap = snapshot(vec![], None);
        assert_eq!(render_list(&snap, None), "No invoices found\n");
        snap.load_state = LoadState::Loading;
        assert_eq!(render_list(&snap, None), "Loading invoices...\n");
        snap.load_state = LoadState::Errored("boom".to_string());
        assert_eq!(render_list(&snap, None), "! boom\n");
    }

    #[test]
    fn test_list_filtered_by_issue() {
        let snap = snapshot(
            vec![
                record(json!({"Id": 1, "Purchase_Order_Number": "PO-1"})),
                record(json!({"Id": 2})),
            ],
            None,
        );
        let out = render_list(&snap, Some(IssueKind::MissingPo));
        assert!(!out.contains("#1 "));
        assert!(out.contains("#2 "));
    }

    #[test]
    fn test_amount_ht_prefers_subtotal() {
        assert_eq!(
            amount_ht(&record(json!({"Id": 1, "Subtotal HT": 80.0, "Total_Amount": 100.0}))),
            80.0
        );
        assert_eq!(
            amount_ht(&record(json!({"Id": 1, "Total_Amount": 120.0, "Tax_Amount": 20.0}))),
            100.0
        );
    }

    #[test]
    fn test_po_badge() {
        assert_eq!(po_badge(&record(json!({"Id": 1, "Purchase_Order_Number": "PO"}))), Some("Linked"));
        assert_eq!(po_badge(&record(json!({"Id": 1, "PO_Status": "missing"}))), Some("Missing PO"));
        assert_eq!(
            po_badge(&record(json!({"Id": 1, "PO_Status": "not_required"}))),
            Some("Not Required")
        );
        assert_eq!(po_badge(&record(json!({"Id": 1}))), None);
    }

    #[test]
    fn test_details_render_missing_values_and_line_items() {
        let out = render_details(&record(json!({
            "Id": 1,
            "Supplier_Name": "ACME",
            "Invoice_Date": "2024-01-12",
            "Line_Items": "oops"
        })));
        assert!(out.contains("ACME"));
        assert!(out.contains("12 janv. 2024"));
        assert!(out.contains("Invoice Number     —"));
        assert!(out.contains("No line items available"));
    }

    #[test]
    fn test_document_preview_states() {
        let snap = snapshot(vec![], None);
        assert!(render_document(&snap).contains("No Invoice Selected"));

        let snap = snapshot(vec![record(json!({"Id": 1, "Invoice_Number": "F-9"}))], Some(0));
        let out = render_document(&snap);
        assert!(out.contains("No PDF Available"));
        assert!(out.contains("F-9"));

        let snap = snapshot(
            vec![record(json!({"Id": 1, "PDF_B2_URL": "https://files.example/f.pdf"}))],
            Some(0),
        );
        assert!(render_document(&snap).contains("https://files.example/f.pdf"));
    }

    #[test]
    fn test_issues_panel_positive_confirmation() {
        let out = render_issues(
            &record(json!({"Id": 1, "Purchase_Order_Number": "PO-1", "Confidence_Score": 88})),
            None,
        );
        assert!(out.contains("No Issues Detected"));
        assert!(out.contains("Confidence: 88%"));
        assert!(out.contains("[Validate] [Mark to Review]"));
        assert!(!out.contains("Request PO"));
    }

    #[test]
    fn test_issues_panel_lists_issues_and_pending_action() {
        let out = render_issues(&record(json!({"Id": 1})), Some(Action::RequestPo));
        assert!(out.contains("Missing Purchase Order"));
        assert!(out.contains("[Request PO …]"));
    }

    #[test]
    fn test_dashboard_includes_all_panels() {
        let snap = snapshot(vec![record(json!({"Id": 1, "Supplier_Name": "ACME"}))], Some(0));
        let out = render_dashboard(&snap, None);
        assert!(out.starts_with(TITLE));
        assert!(out.contains("Invoice Document"));
        assert!(out.contains("Extracted Data"));
        assert!(out.contains("Detected Issues (AI)"));
    }
}
