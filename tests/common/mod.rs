// tests/common/mod.rs
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use destination_guide::articles::{ContentResolver, FallbackArticle, FallbackTable};
use destination_guide::config::store::TableNames;
use destination_guide::guides::GuideCatalog;
use destination_guide::page::PageContext;
use destination_guide::store::memory::MemoryStore;
use destination_guide::store::SharedStore;
use destination_guide::venues::VenueResolver;
use destination_guide::AppState;
use serde_json::{json, Value};

pub const TIMEOUT: Duration = Duration::from_secs(10);

pub fn tables() -> TableNames {
    TableNames::default()
}

pub fn retailers() -> Vec<Value> {
    vec![
        json!({"id": 1, "slug": "green-door", "name": "Green Door", "city": "Denver", "state": "CO",
               "address": "1 Colfax Ave, Denver, CO", "rating": 4.5, "images": ["gd.jpg"],
               "is_recreational": true, "is_medical": false}),
        json!({"id": 2, "slug": "mile-high-meds", "name": "Mile High Meds", "city": "denver", "state": "CO",
               "address": "22 Broadway, Denver, CO", "rating": null, "images": [],
               "is_recreational": false, "is_medical": true}),
        json!({"id": 3, "slug": "peak-leaf", "name": "Peak Leaf", "city": "Denver", "state": "CO",
               "address": "300 Larimer St, Denver, CO", "rating": 4.9, "images": ["pl.jpg"],
               "is_recreational": true, "is_medical": true}),
        json!({"id": 4, "slug": "flatiron-flower", "name": "Flatiron Flower", "city": "Boulder", "state": "CO",
               "address": "9 Pearl St, Boulder, CO", "rating": 4.7, "images": [],
               "is_recreational": true, "is_medical": false}),
        json!({"id": 5, "slug": "denver-in-name-only", "name": "Denver Cannabis Co", "city": "Denver", "state": "PA",
               "address": "5 Main St, Denver, PA", "rating": 3.9, "images": [],
               "is_recreational": false, "is_medical": true}),
    ]
}

pub fn lodgings() -> Vec<Value> {
    vec![
        json!({"id": 101, "slug": "the-patio-inn", "name": "The Patio Inn",
               "address": "10 Market St, Denver, CO", "rating": 4.2, "images": ["inn.jpg"],
               "is_cannabis_friendly": true}),
        json!({"id": 102, "slug": "lodo-lofts", "name": "LoDo Lofts",
               "address": "77 Wynkoop St, Denver, CO", "rating": 4.8, "images": [],
               "is_cannabis_friendly": false}),
        json!({"id": 103, "slug": "boulder-bnb", "name": "Boulder BnB",
               "address": "3 Canyon Blvd, Boulder, CO", "rating": null, "images": [],
               "is_cannabis_friendly": true}),
    ]
}

pub fn articles() -> Vec<Value> {
    vec![
        json!({"slug": "denver-weekend", "title": "A Weekend in Denver", "status": "published",
               "excerpt": "Two days, five dispensaries, one great brunch.",
               "published_at": "2024-05-10T09:00:00Z", "read_time": 8,
               "author_name": "Sam Rivera", "author_avatar": "/a/sam.png",
               "hero_image": "/h/denver.jpg", "category": "Guides", "tags": ["Denver", "Weekend"],
               "body": {"introduction": "Pack light.",
                        "sections": [{"title": "Day one", "content": "<p>LoDo</p>", "icon": "map-pin"}],
                        "safetyTips": ["Stay hydrated"]},
               "related_dispensary_ids": [3, 999], "related_hotel_ids": [102]}),
        // same slug as a fallback entry: persisted must win in full
        json!({"slug": "first-visit-denver-dispensaries", "title": "First Visit (2024 edition)",
               "status": "published", "excerpt": "Updated for 2024.",
               "published_at": "2024-06-01", "read_time": "4 min read",
               "author_name": "Store Author", "author_avatar": "", "hero_image": "",
               "category": "News", "tags": [], "body": null}),
        // drafts are invisible
        json!({"slug": "cannabis-friendly-hotels-explained", "title": "DRAFT hotels", "status": "draft",
               "excerpt": "not ready", "published_at": "2024-07-01", "category": "Drafts"}),
        json!({"slug": "secret-draft", "title": "Unreleased", "status": "draft"}),
        json!({"slug": "broken-body", "title": "Broken Body", "status": "published",
               "published_at": "2024-01-15T12:00:00Z", "category": "Guides", "body": "{oops"}),
    ]
}

pub fn store() -> MemoryStore {
    let t = tables();
    MemoryStore::new()
        .with_table(&t.retailers, retailers())
        .with_table(&t.lodgings, lodgings())
        .with_table(&t.articles, articles())
        .with_unique(&t.subscribers, "email")
}

pub fn fallback() -> FallbackTable {
    FallbackTable::seed()
}

pub fn fallback_with(entries: Vec<Value>) -> FallbackTable {
    let items: Vec<FallbackArticle> = entries
        .into_iter()
        .map(|v| serde_json::from_value(v).expect("fallback fixture"))
        .collect();
    FallbackTable::new(items)
}

pub fn venue_resolver(store: SharedStore) -> VenueResolver {
    VenueResolver::new(store, tables(), TIMEOUT)
}

pub fn content_resolver(store: SharedStore, fallback: FallbackTable) -> ContentResolver {
    ContentResolver::new(store, &tables(), Arc::new(fallback), TIMEOUT)
}

pub fn page_context(store: SharedStore) -> PageContext {
    PageContext {
        venues: Arc::new(venue_resolver(store.clone())),
        articles: Arc::new(content_resolver(store, fallback())),
    }
}

pub fn app_state(store: SharedStore) -> AppState {
    AppState::new(store, &tables(), TIMEOUT, fallback(), GuideCatalog::seed())
}
