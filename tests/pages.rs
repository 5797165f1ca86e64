// tests/pages.rs
mod common;

use std::sync::Arc;
use std::time::Duration;

use destination_guide::guides::{GuideCatalog, GuideSpec};
use destination_guide::page::{ArticlePage, ArticlePageView, CityGuidePage};
use destination_guide::render::RenderState;
use destination_guide::store::memory::MemoryStore;
use destination_guide::store::SharedStore;
use destination_guide::venues::{Venue, VenueCategory};
use serde_json::json;

fn denver() -> GuideSpec {
    GuideCatalog::seed().get("denver").cloned().expect("denver guide")
}

fn slugs(state: &RenderState<Vec<Venue>>) -> Vec<String> {
    state
        .populated()
        .map(|v| v.iter().map(|x| x.slug.clone()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn guide_sections_start_loading_and_settle() {
    let mem = Arc::new(common::store());
    let store: SharedStore = mem.clone();
    let venues = Arc::new(common::venue_resolver(store));

    let page = CityGuidePage::mount(denver());
    let before = page.view();
    assert_eq!(before.sections.len(), 2);
    assert!(before.sections.iter().all(|s| s.state.is_loading()));

    page.load(venues).await;
    let view = page.view();
    assert_eq!(view.sections[0].category, VenueCategory::Retailer);
    assert_eq!(
        slugs(&view.sections[0].state),
        vec!["peak-leaf", "green-door", "mile-high-meds"]
    );
    assert_eq!(view.sections[1].category, VenueCategory::Lodging);
    assert_eq!(slugs(&view.sections[1].state), vec!["lodo-lofts", "the-patio-inn"]);
}

#[tokio::test]
async fn one_empty_category_leaves_the_other_populated() {
    let t = common::tables();
    let store: SharedStore =
        Arc::new(MemoryStore::new().with_table(&t.retailers, common::retailers()));
    let venues = Arc::new(common::venue_resolver(store));

    let page = CityGuidePage::mount(denver());
    page.load(venues).await;
    let view = page.view();
    assert_eq!(slugs(&view.sections[0].state).len(), 3);
    assert_eq!(view.sections[1].state, RenderState::Empty);
}

#[tokio::test]
async fn store_outage_renders_empty_sections() {
    let mem = Arc::new(common::store());
    mem.set_offline(true);
    let store: SharedStore = mem.clone();

    let page = CityGuidePage::mount(denver());
    page.load(Arc::new(common::venue_resolver(store))).await;
    assert!(page
        .view()
        .sections
        .iter()
        .all(|s| s.state == RenderState::Empty));
}

#[tokio::test(start_paused = true)]
async fn slow_store_times_out_into_empty_sections() {
    let mem = Arc::new(common::store().with_delay(Duration::from_secs(45)));
    let store: SharedStore = mem.clone();

    let page = CityGuidePage::mount(denver());
    page.load(Arc::new(common::venue_resolver(store))).await;
    assert!(page
        .view()
        .sections
        .iter()
        .all(|s| s.state == RenderState::Empty));
}

#[tokio::test(start_paused = true)]
async fn results_after_unmount_are_dropped() {
    let mem = Arc::new(common::store().with_delay(Duration::from_secs(2)));
    let store: SharedStore = mem.clone();

    let page = CityGuidePage::mount(denver());
    let handles = page.start(Arc::new(common::venue_resolver(store)));
    page.unmount();
    for h in handles {
        h.await.unwrap();
    }
    assert_eq!(mem.select_count(), 2);
    assert!(page.view().sections.iter().all(|s| s.state.is_loading()));
}

#[tokio::test]
async fn duplicate_categories_share_one_section() {
    let mem = Arc::new(common::store());
    let store: SharedStore = mem.clone();
    let mut spec = denver();
    spec.categories = vec![VenueCategory::Retailer, VenueCategory::Retailer];

    let page = CityGuidePage::mount(spec);
    page.load(Arc::new(common::venue_resolver(store))).await;
    assert_eq!(page.view().sections.len(), 1);
    assert_eq!(mem.select_count(), 1);
}

#[tokio::test]
async fn article_page_loads_related_venues_after_the_article() {
    let mem = Arc::new(common::store());
    let store: SharedStore = mem.clone();
    let ctx = common::page_context(store);

    let page = ArticlePage::mount("denver-weekend");
    assert_eq!(page.view(), ArticlePageView::Loading);
    page.load(&ctx).await;

    let ArticlePageView::Ready { article, related } = page.view() else {
        panic!("expected ready article page");
    };
    assert_eq!(article.title, "A Weekend in Denver");
    // id 999 dangles and is skipped
    assert_eq!(slugs(&related), vec!["peak-leaf", "lodo-lofts"]);
}

#[tokio::test]
async fn article_without_related_ids_skips_the_fan_out() {
    let mem = Arc::new(common::store());
    let store: SharedStore = mem.clone();
    let ctx = common::page_context(store);

    let page = ArticlePage::mount("first-visit-denver-dispensaries");
    page.load(&ctx).await;
    let ArticlePageView::Ready { related, .. } = page.view() else {
        panic!("expected ready article page");
    };
    assert_eq!(related, RenderState::Empty);
    assert_eq!(mem.select_count(), 1);
}

#[tokio::test]
async fn redirect_and_not_found_pages() {
    let mem = Arc::new(common::store());
    let store: SharedStore = mem.clone();
    let ctx = common::page_context(store);

    let ext = ArticlePage::mount("colorado-cannabis-laws");
    ext.load(&ctx).await;
    assert_eq!(
        ext.view(),
        ArticlePageView::Redirect {
            url: "https://cannabis.colorado.gov/".into()
        }
    );

    let missing = ArticlePage::mount("secret-draft");
    missing.load(&ctx).await;
    assert_eq!(missing.view(), ArticlePageView::NotFound);
}

#[tokio::test]
async fn unmounted_article_page_stays_loading() {
    let mem = Arc::new(common::store());
    let store: SharedStore = mem.clone();
    let ctx = common::page_context(store);

    let page = ArticlePage::mount("denver-weekend");
    let handle = page.start(ctx);
    page.unmount();
    handle.await.unwrap();
    assert_eq!(page.view(), ArticlePageView::Loading);
}

#[test]
fn view_serializes_with_state_tags() {
    let v = serde_json::to_value(ArticlePageView::Redirect { url: "https://x.test/".into() }).unwrap();
    assert_eq!(v, json!({"state": "redirect", "url": "https://x.test/"}));
    let s = serde_json::to_value(RenderState::<Vec<u8>>::Empty).unwrap();
    assert_eq!(s, json!({"state": "empty"}));
}
