use anyhow::Result;

use crate::services::state::AppState;
use crate::services::store::StoreSnapshot;
use crate::views;

pub async fn show_dashboard(id: Option<i64>, state: &AppState) -> Result<String> {
    state.load().await?;
    let selected = state.resolve_invoice(id).await?;

    let snapshot = state.store.snapshot();
    let snapshot = StoreSnapshot {
        selected: Some(selected),
        ..snapshot
    };
    Ok(views::render_dashboard(&snapshot, state.dispatcher.pending()))
}
