use axum::{
    extract::{ConnectInfo, Query, State},
    http::HeaderMap,
    response::{Html, IntoResponse},
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tera::Context;

use crate::flow::IssueState;
use crate::gate;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct IndexQuery {
    state: Option<String>,
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(query): Query<IndexQuery>,
) -> impl IntoResponse {
    let key = gate::client_key(&headers, Some(peer));
    let record = state.store.load(&key).await;

    let mut issue_state = query
        .state
        .as_deref()
        .map(IssueState::from_query)
        .unwrap_or(IssueState::Idle);
    if gate::is_blocked(record.count) {
        issue_state = issue_state.blocked();
    }

    let mut ctx = Context::new();
    ctx.insert("remaining", &gate::remaining(record.count));
    ctx.insert("blocked", &matches!(issue_state, IssueState::Blocked));
    ctx.insert("banner", issue_state.banner());
    render_template("index.html", ctx).await
}

async fn render_template(name: &str, ctx: Context) -> Html<String> {
    let tera = crate::templates::get_tera();
    let rendered = tera
        .render(name, &ctx)
        .unwrap_or_else(|_| format!("Template error: {}", name));
    Html(rendered)
}
