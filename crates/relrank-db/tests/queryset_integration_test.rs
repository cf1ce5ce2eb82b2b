//! PostgreSQL queryset tests.
//!
//! Require a running database with the `pg_trgm` extension available:
//! `DATABASE_URL=... cargo test -p relrank-db -- --ignored`

use relrank_core::{Comparator, Expr, OrderBy, QuerySet};
use relrank_db::test_fixtures::{FixtureProduct, ProductTable};

async fn seeded() -> ProductTable {
    dotenvy::dotenv().ok();
    let table = ProductTable::create()
        .await
        .expect("Failed to create product table");
    table
        .insert(&[
            FixtureProduct::new(1, "Apple iPhone").with_brand("Apple"),
            FixtureProduct::new(2, "Samsung Galaxy").with_brand("Samsung"),
            FixtureProduct::new(3, "Apple iPad").inactive(),
            FixtureProduct::new(4, "100% Apple Juice"),
        ])
        .await
        .expect("Failed to seed products");
    table
}

fn id_of(record: &relrank_core::ScoredRecord) -> i64 {
    record.get("id").and_then(|v| v.as_i64()).unwrap()
}

#[tokio::test]
#[ignore]
async fn test_fetch_plain_table() {
    let table = seeded().await;

    let records = table
        .queryset()
        .unwrap()
        .order_by(vec![OrderBy::asc(Expr::field("id"))])
        .unwrap()
        .fetch(&table.pool)
        .await
        .unwrap();

    assert_eq!(records.len(), 4);
    assert_eq!(records[0].get("name").and_then(|v| v.as_str()), Some("Apple iPhone"));
    assert!(records[0].scores.is_empty());

    table.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn test_alive_and_active_filters() {
    let table = seeded().await;
    table.soft_delete(2).await.unwrap();

    let qs = table.queryset().unwrap().alive().active();
    let records = qs.fetch(&table.pool).await.unwrap();
    let mut ids: Vec<i64> = records.iter().map(id_of).collect();
    ids.sort();

    assert_eq!(ids, vec![1, 4]);
    assert_eq!(qs.count(&table.pool).await.unwrap(), 2);

    table.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn test_annotation_filter_and_wildcard_escaping() {
    let table = seeded().await;

    let records = table
        .queryset()
        .unwrap()
        .annotate(
            "hit",
            Expr::when(
                Expr::field("name").icontains("100%"),
                Expr::float(1.0),
                Expr::float(0.0),
            ),
        )
        .unwrap()
        .filter(Expr::column("hit").compare(Comparator::Gt, Expr::float(0.0)))
        .unwrap()
        .fetch(&table.pool)
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(id_of(&records[0]), 4);
    assert_eq!(records[0].score("hit"), Some(1.0));

    table.cleanup().await;
}

#[tokio::test]
#[ignore]
async fn test_trigram_similarity_and_json_path() {
    let table = seeded().await;

    let records = table
        .queryset()
        .unwrap()
        .annotate(
            "brand_similarity",
            Expr::TrigramSimilarity {
                text: Box::new(Expr::field("meta__brand").cast_text()),
                query: Box::new(Expr::text("apple")),
            }
            .or_zero(),
        )
        .unwrap()
        .order_by(vec![
            OrderBy::desc(Expr::column("brand_similarity")),
            OrderBy::asc(Expr::field("id")),
        ])
        .unwrap()
        .limit(1)
        .fetch(&table.pool)
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(id_of(&records[0]), 1);
    assert_eq!(records[0].score("brand_similarity"), Some(1.0));

    table.cleanup().await;
}
