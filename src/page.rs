// src/page.rs
//! Page templates: city guide pages and article pages.
//!
//! A page owns its slots. Each venue category loads in its own task and
//! settles its own slot, in whatever order the store answers. The article
//! page starts its related-venue fan-out only after the article itself is
//! known. Tasks are never cancelled; after `unmount` their results are dropped.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::articles::{ArticleRecord, ArticleResolution, ContentResolver};
use crate::guides::GuideSpec;
use crate::render::{Mount, RenderState, Slot};
use crate::venues::{LocationScope, Venue, VenueCategory, VenueResolver};

/// Resolvers a page needs. Cheap to clone.
#[derive(Clone)]
pub struct PageContext {
    pub venues: Arc<VenueResolver>,
    pub articles: Arc<ContentResolver>,
}

// ------------------------------------------------------------
// City guide page
// ------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VenueSectionView {
    pub category: VenueCategory,
    #[serde(flatten)]
    pub state: RenderState<Vec<Venue>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityGuideView {
    pub slug: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    pub scope: LocationScope,
    pub sections: Vec<VenueSectionView>,
}

pub struct CityGuidePage {
    spec: GuideSpec,
    mount: Mount,
    slots: Vec<(VenueCategory, Slot<Vec<Venue>>)>,
}

impl CityGuidePage {
    /// All category slots start in `Loading`.
    pub fn mount(spec: GuideSpec) -> Self {
        let mount = Mount::new();
        let mut slots: Vec<(VenueCategory, Slot<Vec<Venue>>)> = Vec::new();
        for &category in &spec.categories {
            if slots.iter().any(|(c, _)| *c == category) {
                continue;
            }
            let name = match category {
                VenueCategory::Retailer => "retailers",
                VenueCategory::Lodging => "lodgings",
            };
            slots.push((category, Slot::new(name, &mount)));
        }
        Self { spec, mount, slots }
    }

    /// Issue one query per category; each task settles its own slot.
    /// Dropping the returned handles detaches the tasks.
    pub fn start(&self, venues: Arc<VenueResolver>) -> Vec<JoinHandle<()>> {
        self.slots
            .iter()
            .map(|(category, slot)| {
                let category = *category;
                let slot = slot.clone();
                let venues = venues.clone();
                let query = self.spec.query_for(category);
                tokio::spawn(async move {
                    let res = venues
                        .resolve_category(&query.scope, category, query.limit, &query.require)
                        .await;
                    slot.deliver(RenderState::from_result(slot.name(), res));
                })
            })
            .collect()
    }

    /// Start and wait until every slot has settled.
    pub async fn load(&self, venues: Arc<VenueResolver>) {
        for h in self.start(venues) {
            if let Err(e) = h.await {
                tracing::error!(target: "page", guide = %self.spec.slug, error = %e, "venue task failed");
            }
        }
        // a panicked task leaves its slot loading; show it as empty instead
        for (_, slot) in &self.slots {
            if slot.is_loading() {
                slot.deliver(RenderState::Empty);
            }
        }
    }

    pub fn unmount(&self) {
        self.mount.unmount();
    }

    pub fn view(&self) -> CityGuideView {
        CityGuideView {
            slug: self.spec.slug.clone(),
            title: self.spec.title.clone(),
            intro: self.spec.intro.clone(),
            scope: self.spec.scope.clone(),
            sections: self
                .slots
                .iter()
                .map(|(category, slot)| VenueSectionView {
                    category: *category,
                    state: slot.snapshot(),
                })
                .collect(),
        }
    }
}

// ------------------------------------------------------------
// Article page
// ------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ArticlePageView {
    Loading,
    NotFound,
    Redirect {
        url: String,
    },
    Ready {
        article: Box<ArticleRecord>,
        related: RenderState<Vec<Venue>>,
    },
}

#[derive(Clone)]
pub struct ArticlePage {
    slug: String,
    mount: Mount,
    article: Slot<ArticleResolution>,
    related: Slot<Vec<Venue>>,
}

impl ArticlePage {
    pub fn mount(slug: &str) -> Self {
        let mount = Mount::new();
        Self {
            slug: slug.to_string(),
            article: Slot::new("article", &mount),
            related: Slot::new("related_venues", &mount),
            mount,
        }
    }

    /// Resolve the article, then (only if it renders inline) its related venues.
    pub async fn load(&self, ctx: &PageContext) {
        let resolution = ctx.articles.resolve(&self.slug).await;
        let related_ids = match &resolution {
            ArticleResolution::Inline(rec) => Some(rec.related.clone()),
            ArticleResolution::Redirect(_) | ArticleResolution::NotFound => None,
        };
        if !self.article.deliver(RenderState::Populated(resolution)) {
            return;
        }

        let Some(ids) = related_ids else {
            self.related.deliver(RenderState::Empty);
            return;
        };
        if ids.is_empty() {
            self.related.deliver(RenderState::Empty);
            return;
        }
        let res = ctx.venues.resolve_related(&ids).await;
        self.related
            .deliver(RenderState::from_result(self.related.name(), res));
    }

    /// Load in the background; the handle may be dropped.
    pub fn start(&self, ctx: PageContext) -> JoinHandle<()> {
        let page = self.clone();
        tokio::spawn(async move { page.load(&ctx).await })
    }

    pub fn unmount(&self) {
        self.mount.unmount();
    }

    pub fn view(&self) -> ArticlePageView {
        match self.article.snapshot() {
            RenderState::Loading => ArticlePageView::Loading,
            RenderState::Empty | RenderState::Populated(ArticleResolution::NotFound) => {
                ArticlePageView::NotFound
            }
            RenderState::Populated(ArticleResolution::Redirect(url)) => {
                ArticlePageView::Redirect { url }
            }
            RenderState::Populated(ArticleResolution::Inline(article)) => ArticlePageView::Ready {
                article: Box::new(article),
                related: self.related.snapshot(),
            },
        }
    }
}
