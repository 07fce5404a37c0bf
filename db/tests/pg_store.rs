//! Runs `PgSubscriptionStore` against a real Postgres.
//!
//! Skipped unless `TEST_DATABASE_URL` points at a database the tests may
//! migrate. Every test works under its own fresh user ids so runs can share
//! one database.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use common::dates::MonthYear;
use db::{
    PgSubscriptionStore, SubscriptionStore,
    dtos::subscription::{CostFilter, SubscriptionFilter},
    models::subscription::Subscription,
};
use sqlx::PgPool;
use uuid::Uuid;

async fn store() -> Option<PgSubscriptionStore> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return None;
    };
    let pool = PgPool::connect(&url).await.expect("connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("apply migrations");
    Some(PgSubscriptionStore::new(Arc::new(pool)))
}

fn my(s: &str) -> MonthYear {
    s.parse().unwrap()
}

// whole seconds so values survive the round trip through timestamptz
fn at(hours: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hours)
}

fn subscription(
    user_id: Uuid,
    service_name: &str,
    price: i32,
    start: &str,
    end: Option<&str>,
    created_hours: i64,
) -> Subscription {
    Subscription {
        id: Uuid::new_v4(),
        service_name: service_name.to_string(),
        price,
        user_id,
        start_date: my(start),
        end_date: end.map(my),
        created_at: at(created_hours),
        updated_at: at(created_hours),
    }
}

fn window(user_id: Uuid, service_name: Option<&str>, start: &str, end: &str) -> CostFilter {
    CostFilter {
        user_id: Some(user_id),
        service_name: service_name.map(str::to_string),
        window_start: my(start),
        window_end: my(end),
    }
}

async fn total(store: &PgSubscriptionStore, filter: CostFilter) -> i64 {
    store.total_cost(&filter).await.unwrap()
}

fn user_filter(user_id: Uuid) -> SubscriptionFilter {
    SubscriptionFilter {
        user_id: Some(user_id),
        ..Default::default()
    }
}

#[tokio::test]
async fn total_cost_counts_inclusive_months_of_the_overlap() {
    let Some(store) = store().await else { return };
    let user = Uuid::new_v4();

    for sub in [
        subscription(user, "Netflix", 100, "01-2024", Some("12-2024"), 0),
        subscription(user, "Spotify", 200, "06-2024", None, 1),
        subscription(user, "Kinopoisk", 300, "01-2023", Some("12-2023"), 2),
    ] {
        store.insert(&sub).await.unwrap();
    }

    assert_eq!(total(&store, window(user, None, "01-2024", "12-2024")).await, 2600);
    assert_eq!(total(&store, window(user, Some("Netflix"), "01-2024", "12-2024")).await, 1200);
    assert_eq!(total(&store, window(user, Some("Netflix"), "01-2024", "06-2024")).await, 600);
    assert_eq!(total(&store, window(user, Some("Spotify"), "01-2024", "12-2024")).await, 1400);
    assert_eq!(total(&store, window(user, Some("Kinopoisk"), "01-2024", "12-2024")).await, 0);
    // 2 months of Kinopoisk, 2 of Netflix, none of Spotify
    assert_eq!(total(&store, window(user, None, "11-2023", "02-2024")).await, 800);
    // open-ended rows run through the window end
    assert_eq!(total(&store, window(user, None, "01-2025", "03-2025")).await, 600);
    assert_eq!(total(&store, window(Uuid::new_v4(), None, "01-2024", "12-2024")).await, 0);
}

#[tokio::test]
async fn list_intersects_filters_newest_first() {
    let Some(store) = store().await else { return };
    let user = Uuid::new_v4();
    let other = Uuid::new_v4();

    let oldest = subscription(user, "Netflix", 100, "01-2024", None, 0);
    let middle = subscription(user, "Netflix", 100, "02-2024", None, 1);
    let newest = subscription(user, "Netflix", 100, "03-2024", None, 2);
    for sub in [
        &oldest,
        &middle,
        &newest,
        &subscription(user, "Spotify", 100, "01-2024", None, 3),
        &subscription(other, "Netflix", 100, "01-2024", None, 4),
    ] {
        store.insert(sub).await.unwrap();
    }

    let filter = SubscriptionFilter {
        user_id: Some(user),
        service_name: Some("Netflix".to_string()),
        ..Default::default()
    };
    let ids: Vec<Uuid> = store
        .list(&filter)
        .await
        .unwrap()
        .into_iter()
        .map(|sub| sub.id)
        .collect();
    assert_eq!(ids, vec![newest.id, middle.id, oldest.id]);

    let page = store
        .list(&SubscriptionFilter {
            limit: Some(1),
            offset: Some(1),
            ..filter
        })
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, middle.id);
}

#[tokio::test]
async fn equal_creation_times_order_by_id_descending() {
    let Some(store) = store().await else { return };
    let user = Uuid::new_v4();

    let a = subscription(user, "Netflix", 100, "01-2024", None, 5);
    let b = subscription(user, "Netflix", 100, "01-2024", None, 5);
    store.insert(&a).await.unwrap();
    store.insert(&b).await.unwrap();

    let listed = store.list(&user_filter(user)).await.unwrap();
    let mut expected = vec![a.id, b.id];
    expected.sort_by(|x, y| y.cmp(x));
    assert_eq!(listed.iter().map(|s| s.id).collect::<Vec<_>>(), expected);
}

#[tokio::test]
async fn update_rewrites_mutable_columns_only() {
    let Some(store) = store().await else { return };
    let user = Uuid::new_v4();

    let original = subscription(user, "Netflix", 100, "01-2024", Some("12-2024"), 0);
    store.insert(&original).await.unwrap();

    let changed = Subscription {
        service_name: "Netflix Premium".to_string(),
        price: 250,
        start_date: my("03-2024"),
        end_date: None,
        updated_at: at(10),
        user_id: Uuid::new_v4(),
        created_at: at(99),
        ..original.clone()
    };
    let updated = store.update(&changed).await.unwrap().expect("live row");

    assert_eq!(updated.id, original.id);
    assert_eq!(updated.user_id, original.user_id);
    assert_eq!(updated.created_at, original.created_at);
    assert_eq!(updated.service_name, "Netflix Premium");
    assert_eq!(updated.price, 250);
    assert_eq!(updated.start_date, my("03-2024"));
    assert_eq!(updated.end_date, None);
    assert_eq!(updated.updated_at, at(10));

    let fetched = store.get_by_id(original.id).await.unwrap();
    assert_eq!(fetched, Some(updated));
}

#[tokio::test]
async fn soft_deleted_rows_disappear_from_every_read() {
    let Some(store) = store().await else { return };
    let user = Uuid::new_v4();

    let kept = subscription(user, "Netflix", 100, "01-2024", Some("12-2024"), 0);
    let gone = subscription(user, "Spotify", 200, "06-2024", None, 1);
    store.insert(&kept).await.unwrap();
    store.insert(&gone).await.unwrap();

    assert!(store.soft_delete(gone.id).await.unwrap());
    assert!(!store.soft_delete(gone.id).await.unwrap());
    assert!(!store.soft_delete(Uuid::new_v4()).await.unwrap());

    assert_eq!(store.get_by_id(gone.id).await.unwrap(), None);
    assert_eq!(store.update(&gone).await.unwrap(), None);

    let listed = store.list(&user_filter(user)).await.unwrap();
    assert_eq!(listed, vec![kept]);

    let total = store
        .total_cost(&window(user, None, "01-2024", "12-2024"))
        .await
        .unwrap();
    assert_eq!(total, 1200);
}
