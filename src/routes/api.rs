use axum::{
    extract::{ConnectInfo, State},
    http::HeaderMap,
    response::IntoResponse,
    Form,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::agents::compose_impact_message;
use crate::error::IssueError;
use crate::gate;
use crate::pdf;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct IssueForm {
    name: String,
}

/// Gate check, message generation, font provisioning, render, delivery,
/// counter increment - in that order. The increment happens only after the
/// document rendered; generation and font failures never abort the flow.
pub async fn issue_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Form(form): Form<IssueForm>,
) -> Result<impl IntoResponse, IssueError> {
    let name = form.name.trim().to_string();
    if name.is_empty() {
        return Err(IssueError::EmptyName);
    }

    let key = gate::client_key(&headers, Some(peer));
    let record = state.store.load(&key).await;
    if gate::is_blocked(record.count) {
        tracing::info!("Issuance blocked for key {} (count {})", key, record.count);
        return Err(IssueError::Blocked);
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .expect("Failed to create HTTP client");

    let impact = compose_impact_message(
        &client,
        state.config.textgen_api_key.as_deref(),
        &name,
    )
    .await;

    // Font provisioning must settle before any text layout: its outcome
    // selects native-script versus transliterated rendering.
    let bundle = pdf::fonts::provision(&client).await;

    let issue_date = chrono::Local::now().format("%d.%m.%Y").to_string();
    let mut request = pdf::CertificateRequest::new(&name, &issue_date, &impact);
    request.certificate_no = Some(gate::generate_certificate_no());

    let rendered = pdf::render(&request, &bundle)?;

    let record = state.store.record_issue(&key).await?;
    tracing::info!(
        "Issued certificate {} for key {} (count now {})",
        rendered.file_name,
        key,
        record.count
    );

    Ok(axum::response::Response::builder()
        .header("Content-Type", "application/pdf")
        .header(
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", rendered.file_name),
        )
        .body(axum::body::Body::from(rendered.bytes))
        .unwrap()
        .into_response())
}

pub async fn remaining(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let key = gate::client_key(&headers, Some(peer));
    let record = state.store.load(&key).await;

    axum::Json(serde_json::json!({
        "count": record.count,
        "remaining": gate::remaining(record.count),
        "blocked": gate::is_blocked(record.count),
    }))
}
