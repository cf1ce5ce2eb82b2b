//! Ranked search behavior, evaluated with the in-memory backend.

use relrank_core::{
    columns, Comparator, Error, OrderDirection, QuerySet, ScoredRecord, SearchConfig,
    VectorField, VectorWeight,
};
use relrank_db::MemoryQuerySet;
use relrank_search::{search, RankedSearchBuilder};
use serde_json::json;

fn phones() -> MemoryQuerySet {
    MemoryQuerySet::new(vec![
        json!({"id": 1, "name": "Apple iPhone"}),
        json!({"id": 2, "name": "Samsung Galaxy"}),
        json!({"id": 3, "name": "Apple iPad"}),
    ])
}

fn catalog() -> MemoryQuerySet {
    MemoryQuerySet::new(vec![
        json!({"id": 10, "name": "Pineapple Juice", "sku": "PJ-01", "description": "Fresh pineapple juice", "meta": {"brand": "Tropic"}}),
        json!({"id": 11, "name": "Apple", "sku": "AP-01", "description": "A red apple", "meta": {"brand": "Orchard"}}),
        json!({"id": 12, "name": "Apple iPhone", "sku": "IP-15", "description": "Phone made by Apple", "meta": {"brand": "Apple"}}),
        json!({"id": 13, "name": "Samsung Galaxy", "sku": "SG-24", "description": "Android phone", "meta": {"brand": "Samsung"}}),
        json!({"id": 14, "name": "Green Apple Soda", "sku": "GA-02", "description": null, "meta": {}}),
    ])
}

fn ids(records: &[ScoredRecord]) -> Vec<i64> {
    records
        .iter()
        .map(|r| r.get("id").and_then(|v| v.as_i64()).unwrap())
        .collect()
}

fn full_config() -> SearchConfig {
    SearchConfig::new()
        .with_icontains_fields(["name", "sku"])
        .with_trigram_fields(["name"])
        .with_word_trigram_fields(["name"])
        .with_vector_fields(vec![
            VectorField::new("name"),
            VectorField::new("description").with_weight(VectorWeight::C),
        ])
        .with_startswith_fields(["name"])
}

#[test]
fn test_contains_scenario() {
    let config = SearchConfig::new().with_icontains_fields(["name"]);
    let results = search(phones(), "apple", &config)
        .unwrap()
        .evaluate()
        .unwrap();

    assert_eq!(ids(&results), vec![1, 3]);
    for record in &results {
        assert_eq!(record.score(columns::ICONTAINS_RANK), Some(0.5));
        assert_eq!(record.match_count(), 1);
        assert_eq!(record.search_rank(), 0.5);
        assert_eq!(record.order_rank(), 0.5);
        assert!((record.composite_rank() - 0.6).abs() < 1e-9);
    }
}

#[test]
fn test_empty_query_is_pass_through() {
    let config = full_config();
    for query in ["", "   ", "\t\n"] {
        let qs = search(catalog(), query, &config).unwrap();
        assert!(!qs.is_refined());
        assert!(qs.annotation_names().is_empty());

        let results = qs.evaluate().unwrap();
        assert_eq!(ids(&results), vec![10, 11, 12, 13, 14]);
        assert!(results.iter().all(|r| !r.is_ranked()));
    }
}

#[test]
fn test_no_signal_groups_is_pass_through() {
    let config = SearchConfig::new()
        .with_icontains_fields(Vec::<String>::new())
        .with_trigram_fields(Vec::<String>::new())
        .with_vector_fields(Vec::new())
        .with_startswith_fields(Vec::<String>::new());

    let qs = search(catalog(), "apple", &config).unwrap();
    assert!(!qs.is_refined());
    assert_eq!(ids(&qs.evaluate().unwrap()), vec![10, 11, 12, 13, 14]);
}

#[test]
fn test_results_pass_the_gate() {
    let config = full_config();
    let results = search(catalog(), "apple", &config)
        .unwrap()
        .evaluate()
        .unwrap();

    assert!(!results.is_empty());
    for record in &results {
        assert!(record.search_rank() >= config.threshold);
    }
    assert!(!ids(&results).contains(&13));
}

#[test]
fn test_custom_comparator_gate() {
    let config = SearchConfig::new()
        .with_icontains_fields(["name"])
        .with_comparator(Comparator::Lt)
        .with_threshold(0.35);
    let results = search(phones(), "apple", &config)
        .unwrap()
        .evaluate()
        .unwrap();

    assert_eq!(ids(&results), vec![2]);
    assert!(results[0].search_rank() < 0.35);
}

#[test]
fn test_raising_threshold_never_grows_results() {
    let mut previous = usize::MAX;
    for threshold in [0.0, 0.1, 0.35, 0.5, 0.9, 1.5, 2.0] {
        let config = full_config().with_threshold(threshold);
        let count = search(catalog(), "apple juice", &config)
            .unwrap()
            .evaluate()
            .unwrap()
            .len();
        assert!(
            count <= previous,
            "threshold {} returned {} records, more than {}",
            threshold,
            count,
            previous
        );
        previous = count;
    }
}

#[test]
fn test_exact_match_ranks_first() {
    let config = SearchConfig::new()
        .with_icontains_fields(["name"])
        .with_trigram_fields(["name"])
        .with_startswith_fields(["name"]);
    let results = search(catalog(), "  APPLE ", &config)
        .unwrap()
        .evaluate()
        .unwrap();

    let order = ids(&results);
    assert_eq!(order[0], 11);
    let exact = results[0].composite_rank();
    assert!(results.iter().all(|r| r.composite_rank() <= exact));
}

#[test]
fn test_prefix_bonus_clears_gate_above_one() {
    let config = SearchConfig::new()
        .with_startswith_fields(["name"])
        .with_threshold(1.0);
    let results = search(catalog(), "apple", &config)
        .unwrap()
        .evaluate()
        .unwrap();

    assert_eq!(ids(&results), vec![11, 12]);
    assert_eq!(results[0].search_rank(), 1.5);
    assert!((results[0].composite_rank() - 1.6).abs() < 1e-9);
}

#[test]
fn test_unmatched_record_scores_zero() {
    let config = SearchConfig::new()
        .with_icontains_fields(["name"])
        .with_trigram_fields(["sku"])
        .with_threshold(0.0);
    let results = search(catalog(), "galaxy", &config)
        .unwrap()
        .evaluate()
        .unwrap();

    let juice = results.iter().find(|r| r.get("id") == Some(&json!(10))).unwrap();
    assert_eq!(juice.match_count(), 0);
    assert_eq!(juice.order_rank(), 0.0);
    assert_eq!(juice.composite_rank(), 0.0);
    assert_eq!(ids(&results)[0], 13);
}

#[test]
fn test_identical_calls_identical_output() {
    let config = full_config().with_threshold(0.0);
    let first = search(catalog(), "apple phone", &config)
        .unwrap()
        .evaluate()
        .unwrap();
    let second = search(catalog(), "apple phone", &config)
        .unwrap()
        .evaluate()
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_ties_break_on_id() {
    let base = MemoryQuerySet::new(vec![
        json!({"id": 3, "name": "Apple C"}),
        json!({"id": 1, "name": "Apple A"}),
        json!({"id": 2, "name": "Apple B"}),
    ]);
    let config = SearchConfig::new().with_icontains_fields(["name"]);
    let results = search(base, "apple", &config).unwrap().evaluate().unwrap();
    assert_eq!(ids(&results), vec![1, 2, 3]);
}

#[test]
fn test_without_tie_breaker_keeps_input_order() {
    let base = MemoryQuerySet::new(vec![
        json!({"name": "Apple C"}),
        json!({"name": "Apple A"}),
    ]);
    let config = SearchConfig::new()
        .with_icontains_fields(["name"])
        .with_tie_breaker(None);
    let results = search(base, "apple", &config).unwrap().evaluate().unwrap();
    assert_eq!(results[0].get("name"), Some(&json!("Apple C")));
}

#[test]
fn test_ascending_direction() {
    let config = SearchConfig::new()
        .with_icontains_fields(["name"])
        .with_startswith_fields(["name"])
        .with_order_direction(OrderDirection::Ascending);
    let results = search(catalog(), "apple", &config)
        .unwrap()
        .evaluate()
        .unwrap();

    let composite: Vec<f64> = results.iter().map(|r| r.composite_rank()).collect();
    assert!(composite.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(ids(&results), vec![10, 14, 11, 12]);
}

#[test]
fn test_word_trigram_columns_per_token() {
    let config = SearchConfig::new()
        .with_word_trigram_fields(["name"])
        .with_threshold(0.5);
    let results = search(catalog(), "samsung, galaxy!", &config)
        .unwrap()
        .evaluate()
        .unwrap();

    assert_eq!(ids(&results), vec![13]);
    assert_eq!(results[0].score("name_word_similarity_0"), Some(1.0));
    assert_eq!(results[0].score("name_word_similarity_1"), Some(1.0));
    assert_eq!(results[0].match_count(), 2);
}

#[test]
fn test_vector_rank_uses_field_weight() {
    let config = SearchConfig::new()
        .with_vector_fields(vec![
            VectorField::new("name"),
            VectorField::new("description").with_weight(VectorWeight::D),
        ])
        .with_threshold(0.1);
    let results = search(catalog(), "phone", &config)
        .unwrap()
        .evaluate()
        .unwrap();

    // only descriptions mention "phone" as a word
    assert_eq!(ids(&results), vec![12, 13]);
    assert_eq!(results[0].score(columns::RANK), Some(0.2));
}

#[test]
fn test_nested_field_path() {
    let config = SearchConfig::new().with_icontains_fields(["meta__brand"]);
    let results = search(catalog(), "apple", &config)
        .unwrap()
        .evaluate()
        .unwrap();
    assert_eq!(ids(&results), vec![12]);
}

#[test]
fn test_unknown_field_is_construction_error() {
    let config = SearchConfig::new().with_trigram_fields(["colour"]);
    let result = search(catalog(), "red", &config);
    assert!(matches!(result, Err(Error::UnknownField(field)) if field == "colour"));
}

#[test]
fn test_builder_reusable_across_collections() {
    let config = SearchConfig::new().with_icontains_fields(["name"]);
    let builder = RankedSearchBuilder::new(&config);

    let a = builder.apply(phones(), "apple").unwrap().evaluate().unwrap();
    let b = builder.apply(phones(), "samsung").unwrap().evaluate().unwrap();
    assert_eq!(ids(&a), vec![1, 3]);
    assert_eq!(ids(&b), vec![2]);
}

#[test]
fn test_contains_scenario_without_ids() {
    let base = MemoryQuerySet::new(vec![
        json!({"name": "Apple iPhone"}),
        json!({"name": "Samsung Galaxy"}),
        json!({"name": "Apple iPad"}),
    ]);
    let config = SearchConfig::new().with_icontains_fields(["name"]);
    let results = search(base, "apple", &config).unwrap().evaluate().unwrap();

    let names: Vec<&str> = results
        .iter()
        .map(|r| r.get("name").and_then(|v| v.as_str()).unwrap())
        .collect();
    assert_eq!(names, vec!["Apple iPhone", "Apple iPad"]);
    for record in &results {
        assert_eq!(record.order_rank(), 0.5);
        assert!((record.composite_rank() - 0.6).abs() < 1e-9);
    }
}

#[test]
fn test_contains_and_prefix_average_with_bonus() {
    let config = SearchConfig::new()
        .with_icontains_fields(["name"])
        .with_startswith_fields(["name"]);
    let results = search(catalog(), "apple", &config)
        .unwrap()
        .evaluate()
        .unwrap();

    let exact = results
        .iter()
        .find(|r| r.get("id") == Some(&json!(11)))
        .unwrap();
    assert_eq!(exact.match_count(), 2);
    assert_eq!(exact.search_rank(), 1.5);
    assert!((exact.order_rank() - 1.0).abs() < 1e-9);
    assert!((exact.score(columns::BONUS_TO_SUM).unwrap() - 0.2).abs() < 1e-9);
    assert!((exact.composite_rank() - 1.2).abs() < 1e-9);
}

#[test]
fn test_field_bonus_minimum_withholds_bonus() {
    let config = SearchConfig::new()
        .with_icontains_fields(["name"])
        .with_trigram_fields(["name"])
        .with_bonus_icontains(0.8)
        .with_field_bonus(0.25, 0.5);
    let results = search(catalog(), "apple", &config)
        .unwrap()
        .evaluate()
        .unwrap();

    let phone = results
        .iter()
        .find(|r| r.get("id") == Some(&json!(12)))
        .unwrap();
    let trigram = phone.score("name_similarity").unwrap();
    assert!(trigram > 0.0 && trigram <= 0.5);

    // both columns count towards the average, only the contains column earns a bonus
    assert_eq!(phone.match_count(), 2);
    assert!((phone.score(columns::BONUS_TO_SUM).unwrap() - 0.25).abs() < 1e-9);
    assert!((phone.order_rank() - (0.8 + trigram) / 2.0).abs() < 1e-9);
    assert!((phone.composite_rank() - (phone.order_rank() + 0.25)).abs() < 1e-9);
}

#[test]
fn test_long_field_name_gets_positional_column() {
    let field = "a_fairly_long_descriptive_column_name_for_products_x";
    let base = MemoryQuerySet::new(vec![
        json!({"id": 1, field: "Apple pie"}),
        json!({"id": 2, field: "Banana"}),
    ]);
    let config = SearchConfig::new()
        .with_trigram_fields([field])
        .with_word_trigram_fields([field]);
    let results = search(base, "apple", &config).unwrap().evaluate().unwrap();

    assert_eq!(ids(&results), vec![1]);
    assert_eq!(results[0].score("word_similarity_0_0"), Some(1.0));
    assert!(results[0].score(&format!("{}_similarity", field)).is_some());
}
