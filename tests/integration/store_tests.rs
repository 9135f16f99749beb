//! Postgres store tests
//!
//! Run against a scratch database with
//! `DATABASE_URL=postgres://... cargo test --test store_tests -- --ignored`.
//! Every test creates its own actors and books, so reruns against the same
//! database do not interfere.

use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::postgres::PgPoolOptions;

use shelfwise_server::{
    models::{actor::NewActor, book::NewBook},
    repository::{Repository, Store},
    AppError,
};

const CONTENDERS: usize = 16;

async fn connect() -> Option<Repository> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };
    let pool = PgPoolOptions::new()
        .max_connections(CONTENDERS as u32 + 4)
        .connect(&url)
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    Some(Repository::new(pool))
}

fn unique(label: &str) -> String {
    format!(
        "{}-{}",
        label,
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    )
}

async fn actor(store: &Repository, label: &str) -> i32 {
    let name = unique(label);
    store
        .actors_create(&NewActor {
            email: format!("{}@example.org", name.to_lowercase()),
            name,
            password_hash: "not-a-real-hash".to_string(),
        })
        .await
        .unwrap()
        .id
}

async fn book(store: &Repository, copies: i32) -> i32 {
    store
        .books_create(&NewBook {
            title: unique("The Left Hand of Darkness"),
            author: "Ursula K. Le Guin".to_string(),
            genre: "Science Fiction".to_string(),
            publisher: "Ace Books".to_string(),
            published_date: Utc::now() - Duration::days(365 * 50),
            available_copies: copies,
        })
        .await
        .unwrap()
        .id
}

async fn copies(store: &Repository, book_id: i32) -> i32 {
    store.books_get_by_id(book_id).await.unwrap().available_copies
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_last_copy_goes_to_exactly_one_contender() {
    let Some(store) = connect().await else { return };
    let book_id = book(&store, 1).await;

    let mut actors = Vec::with_capacity(CONTENDERS);
    for i in 0..CONTENDERS {
        actors.push(actor(&store, &format!("reader{}", i)).await);
    }

    let store = Arc::new(store);
    let mut handles = Vec::with_capacity(CONTENDERS);
    for actor_id in actors {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let now = Utc::now();
            store
                .reservations_create(actor_id, book_id, now, now + Duration::days(14))
                .await
        }));
    }

    let mut granted = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok((reservation, book)) => {
                assert_eq!(reservation.book_id, book_id);
                assert_eq!(book.available_copies, 0);
                granted += 1;
            }
            Err(AppError::Unavailable(_)) => refused += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(granted, 1);
    assert_eq!(refused, CONTENDERS - 1);
    assert_eq!(copies(&store, book_id).await, 0);
    assert_eq!(
        store.reservations_list_by_book(book_id).await.unwrap().len(),
        1
    );
}

#[tokio::test]
#[ignore]
async fn test_second_return_leaves_copies_alone() {
    let Some(store) = connect().await else { return };
    let reader = actor(&store, "reader").await;
    let stranger = actor(&store, "stranger").await;
    let book_id = book(&store, 2).await;

    let now = Utc::now();
    let (reservation, book) = store
        .reservations_create(reader, book_id, now, now + Duration::days(14))
        .await
        .unwrap();
    assert_eq!(book.available_copies, 1);

    let result = store
        .reservations_return(stranger, reservation.id, Utc::now())
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert_eq!(copies(&store, book_id).await, 1);

    let (returned, book) = store
        .reservations_return(reader, reservation.id, Utc::now())
        .await
        .unwrap();
    assert!(returned.returned_at.is_some());
    assert_eq!(book.available_copies, 2);

    let result = store
        .reservations_return(reader, reservation.id, Utc::now())
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert_eq!(copies(&store, book_id).await, 2);
}

#[tokio::test]
#[ignore]
async fn test_missing_or_inactive_book_is_not_reservable() {
    let Some(store) = connect().await else { return };
    let reader = actor(&store, "reader").await;
    let now = Utc::now();
    let due = now + Duration::days(14);

    let result = store.reservations_create(reader, i32::MAX, now, due).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let book_id = book(&store, 3).await;
    store.books_deactivate(book_id).await.unwrap();

    let result = store.reservations_create(reader, book_id, now, due).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert_eq!(copies(&store, book_id).await, 3);
    assert!(store
        .reservations_list_by_book(book_id)
        .await
        .unwrap()
        .is_empty());
    assert!(store
        .reservations_list_by_actor(reader, false)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
#[ignore]
async fn test_copy_comes_back_to_deactivated_book() {
    let Some(store) = connect().await else { return };
    let reader = actor(&store, "reader").await;
    let book_id = book(&store, 1).await;

    let now = Utc::now();
    let (reservation, _) = store
        .reservations_create(reader, book_id, now, now + Duration::days(14))
        .await
        .unwrap();
    store.books_deactivate(book_id).await.unwrap();

    let (_, book) = store
        .reservations_return(reader, reservation.id, Utc::now())
        .await
        .unwrap();
    assert!(!book.is_active);
    assert_eq!(book.available_copies, 1);
}
