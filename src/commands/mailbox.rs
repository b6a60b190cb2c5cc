use anyhow::Result;

use crate::services::state::AppState;
use crate::views;

pub async fn list_other_emails(limit: u32, offset: u32, state: &AppState) -> Result<String> {
    let emails = state
        .nocodb
        .list_other_emails(Some(limit), Some(offset))
        .await?;
    Ok(views::render_emails(&emails.list))
}
