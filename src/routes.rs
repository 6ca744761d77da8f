//! Route definitions.
//!
//! - `GET /` redirects to the project homepage
//! - `GET /healthcheck`
//! - `GET /ograph/` (also `/oembed`) returns the oEmbed record of a cached post
//! - `GET /{*url}` embeds or redirects to the post at `url`

use axum::extract::{Query, State};
use axum::http::{HeaderMap, Uri, header};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;
use embedit_dispatch::{OEmbed, Outcome};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthcheck", get(healthcheck))
        .route("/ograph/", get(oembed))
        .route("/oembed", get(oembed))
        .route("/{*url}", get(embed))
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Redirect {
    Redirect::temporary(&state.repo)
}

async fn healthcheck() -> &'static str {
    "i am alive!"
}

#[derive(Debug, Deserialize)]
struct OEmbedQuery {
    author_name: Option<String>,
    url: String,
}

async fn oembed(State(state): State<AppState>, Query(query): Query<OEmbedQuery>) -> Result<Json<OEmbed>, ApiError> {
    let record = state.dispatcher.oembed(&query.url, query.author_name.as_deref()).await?;
    Ok(Json(record))
}

async fn embed(State(state): State<AppState>, headers: HeaderMap, uri: Uri) -> Result<Response, ApiError> {
    // The raw path, not the decoded wildcard: the target keeps its own escaping and query.
    let target = uri.path_and_query().map_or_else(|| uri.path(), |pq| pq.as_str());
    let user_agent = headers.get(header::USER_AGENT).and_then(|value| value.to_str().ok());
    Ok(match state.dispatcher.dispatch(target, user_agent).await? {
        Outcome::Redirect(location) => Redirect::temporary(&location).into_response(),
        Outcome::Embed(resolved) => {
            let href = state.oembed_href(&resolved);
            Html(state.renderer.render(&resolved.metadata, &href)?).into_response()
        },
    })
}
