use anyhow::{bail, Result};

use crate::models::Action;
use crate::services::issues::available_actions;
use crate::services::state::AppState;
use crate::views;

pub async fn run_action(action: Action, id: Option<i64>, state: &AppState) -> Result<String> {
    state.load().await?;
    let invoice = state.resolve_invoice(id).await?;

    if !available_actions(&invoice).contains(&action) {
        bail!(
            "'{}' is not offered for invoice {}: a purchase order is already linked",
            action.label(),
            invoice.id
        );
    }

    state.dispatcher.dispatch(action, invoice.id).await?;

    let snapshot = state.store.snapshot();
    if let Some(error) = snapshot.error() {
        tracing::warn!("Action accepted but refresh failed: {}", error);
    }
    let refreshed = snapshot
        .invoices
        .iter()
        .find(|record| record.id == invoice.id)
        .unwrap_or(&invoice);

    Ok(format!(
        "{} sent for invoice {}\n\n{}",
        action.label(),
        invoice.id,
        views::render_issues(refreshed, state.dispatcher.pending())
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Settings;
    use mockito::Matcher;

    const INVOICES_PATH: &str = "/api/v2/tables/mhb90l86e3msa85/records";

    fn settings(url: &str) -> Settings {
        Settings {
            nocodb_url: url.to_string(),
            nocodb_token: "tok".to_string(),
            webhook_url: format!("{}/hook", url),
            page_size: 50,
        }
    }

    #[tokio::test]
    async fn test_validate_posts_and_reloads() {
        let mut server = mockito::Server::new_async().await;
        let list = server
            .mock("GET", INVOICES_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"list":[{"Id":7,"Purchase_Order_Number":"PO-1","Confidence_Score":90}],"pageInfo":{}}"#,
            )
            .expect(2)
            .create_async()
            .await;
        let hook = server
            .mock("POST", "/hook/invoice/validate")
            .match_body(Matcher::Json(serde_json::json!({"invoiceId": 7})))
            .with_status(200)
            .create_async()
            .await;

        let state = AppState::new(settings(&server.url()));
        let out = run_action(Action::Validate, Some(7), &state).await.unwrap();

        hook.assert_async().await;
        list.assert_async().await;
        assert!(out.starts_with("Validate sent for invoice 7"));
        assert!(out.contains("No Issues Detected"));
    }

    #[tokio::test]
    async fn test_request_po_refused_when_po_linked() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", INVOICES_PATH)
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"list":[{"Id":7,"Purchase_Order_Number":"PO-1"}],"pageInfo":{}}"#)
            .create_async()
            .await;
        let hook = server
            .mock("POST", "/hook/invoice/request-po")
            .expect(0)
            .create_async()
            .await;

        let state = AppState::new(settings(&server.url()));
        let err = run_action(Action::RequestPo, None, &state).await.unwrap_err();

        hook.assert_async().await;
        assert!(err.to_string().contains("not offered"));
    }

    #[tokio::test]
    async fn test_load_failure_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", INVOICES_PATH)
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let state = AppState::new(settings(&server.url()));
        let err = run_action(Action::Validate, None, &state).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to load invoices: NocoDB API error: 503 Service Unavailable"
        );
    }
}
