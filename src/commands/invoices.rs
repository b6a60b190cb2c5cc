use anyhow::{anyhow, Result};

use crate::models::fields;
use crate::models::IssueKind;
use crate::services::state::AppState;
use crate::views;

pub async fn list_invoices(issue: Option<IssueKind>, state: &AppState) -> Result<String> {
    state.load().await?;
    Ok(views::render_list(&state.store.snapshot(), issue))
}

pub async fn open_invoice_file(id: Option<i64>, state: &AppState) -> Result<String> {
    state.load().await?;
    let invoice = state.resolve_invoice(id).await?;
    let url = invoice
        .text(fields::PDF_URL)
        .ok_or_else(|| anyhow!("Invoice {} has no PDF", invoice.id))?;
    open::that(&url).map_err(|e| anyhow!("Open {}: {}", url, e))?;
    Ok(format!("Opened {}\n", url))
}

pub async fn list_processing_logs(
    invoice_id: Option<i64>,
    limit: u32,
    state: &AppState,
) -> Result<String> {
    let logs = state
        .nocodb
        .list_processing_logs(Some(limit), None, invoice_id)
        .await?;
    Ok(views::render_logs(&logs.list))
}
