use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::articles::{ContentResolver, FallbackTable};
use crate::config::store::TableNames;
use crate::guides::GuideCatalog;
use crate::page::{ArticlePage, ArticlePageView, CityGuidePage, PageContext};
use crate::render::RenderState;
use crate::search::{self, ArticleSummary, ALL_CATEGORIES};
use crate::store::SharedStore;
use crate::subscribe::{SubscribeOutcome, SubscriptionRequest, SubscriptionWriter};
use crate::venues::VenueResolver;

#[derive(Clone)]
pub struct AppState {
    pages: PageContext,
    subscriptions: Arc<SubscriptionWriter>,
    guides: Arc<GuideCatalog>,
}

impl AppState {
    /// Wire resolvers over one shared store.
    pub fn new(
        store: SharedStore,
        tables: &TableNames,
        timeout: Duration,
        fallback: FallbackTable,
        guides: GuideCatalog,
    ) -> Self {
        let venues = VenueResolver::new(store.clone(), tables.clone(), timeout);
        let articles = ContentResolver::new(store.clone(), tables, Arc::new(fallback), timeout);
        let subscriptions = SubscriptionWriter::new(store, &tables.subscribers, timeout);
        Self {
            pages: PageContext {
                venues: Arc::new(venues),
                articles: Arc::new(articles),
            },
            subscriptions: Arc::new(subscriptions),
            guides: Arc::new(guides),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/guides", get(list_guides))
        .route("/guides/{slug}", get(guide_page))
        .route("/articles", get(list_articles))
        .route("/articles/{slug}", get(article_page))
        .route("/subscribe", post(subscribe))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
struct GuideLink {
    slug: String,
    title: String,
}

async fn list_guides(State(state): State<AppState>) -> Json<Vec<GuideLink>> {
    let out = state
        .guides
        .iter()
        .map(|g| GuideLink {
            slug: g.slug.clone(),
            title: g.title.clone(),
        })
        .collect::<Vec<_>>();
    Json(out)
}

#[derive(serde::Serialize)]
struct NotFoundOut {
    state: &'static str,
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(NotFoundOut { state: "not_found" })).into_response()
}

async fn guide_page(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let Some(spec) = state.guides.get(&slug) else {
        return not_found();
    };
    let page = CityGuidePage::mount(spec.clone());
    page.load(state.pages.venues.clone()).await;
    Json(page.view()).into_response()
}

#[derive(serde::Deserialize)]
struct ArticleListParams {
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

#[derive(serde::Serialize)]
struct ArticleListOut {
    query: String,
    category: String,
    categories: Vec<String>,
    #[serde(flatten)]
    results: RenderState<Vec<ArticleSummary>>,
}

async fn list_articles(
    State(state): State<AppState>,
    Query(p): Query<ArticleListParams>,
) -> Json<ArticleListOut> {
    let all = state.pages.articles.summaries().await;
    let query = p.q.unwrap_or_default();
    let category = p
        .category
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| ALL_CATEGORIES.to_string());

    let hits = search::filter(&all, &query, &category);
    Json(ArticleListOut {
        categories: search::categories(&all),
        results: RenderState::from_items(hits),
        query,
        category,
    })
}

async fn article_page(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let page = ArticlePage::mount(&slug);
    page.load(&state.pages).await;
    match page.view() {
        ArticlePageView::Redirect { url } => Redirect::temporary(&url).into_response(),
        view @ ArticlePageView::NotFound => (StatusCode::NOT_FOUND, Json(view)).into_response(),
        view => Json(view).into_response(),
    }
}

#[derive(serde::Serialize)]
struct SubscribeOut {
    outcome: SubscribeOutcome,
    success: bool,
    message: &'static str,
}

/// Unreadable bodies are a `failure` outcome like any other, never axum's rejection.
async fn subscribe(
    State(state): State<AppState>,
    body: Result<Json<SubscriptionRequest>, JsonRejection>,
) -> Json<SubscribeOut> {
    let outcome = match body {
        Ok(Json(req)) => state.subscriptions.subscribe(&req).await,
        Err(rejection) => {
            tracing::warn!(target: "api", status = %rejection.status(), error = %rejection.body_text(), "unreadable subscribe request");
            SubscribeOutcome::Failure
        }
    };
    Json(SubscribeOut {
        outcome,
        success: outcome.is_success(),
        message: outcome.message(),
    })
}
