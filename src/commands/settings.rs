use anyhow::{anyhow, Result};
use std::fmt::Write as _;

use crate::models::ListQuery;
use crate::services::nocodb::InvoiceSource;
use crate::services::state::AppState;

fn mask(token: &str) -> String {
    if token.is_empty() {
        return "(not set)".to_string();
    }
    let tail: String = token
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{}", tail)
}

pub fn get_settings(state: &AppState) -> String {
    let settings = &state.settings;
    let mut out = String::new();
    let _ = writeln!(out, "NocoDB URL     {}", settings.nocodb_url);
    let _ = writeln!(out, "NocoDB token   {}", mask(&settings.nocodb_token));
    let _ = writeln!(out, "Webhook URL    {}", settings.webhook_url);
    let _ = writeln!(out, "Page size      {}", settings.page_size);
    out
}

/// Verifies the backing store answers with the configured token.
pub async fn test_connection(state: &AppState) -> Result<String> {
    let query = ListQuery {
        limit: Some(1),
        ..ListQuery::default()
    };
    let page = state
        .nocodb
        .list_invoices(&query)
        .await
        .map_err(|e| anyhow!("Connection failed: {}", e))?;
    let total = page
        .page_info
        .total_rows
        .map(|n| n.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    Ok(format!("Connected to {} ({} invoices)\n", state.settings.nocodb_url, total))
}
