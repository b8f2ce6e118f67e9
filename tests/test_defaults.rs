use pretty_assertions::assert_eq;
use serde::Serialize;
use serde_json::json;

use canonical_qs::{self as qs, ArrayDefaults, Config, ScalarEquality};

fn filter_query() -> serde_json::Value {
    json!({
        "filter": {
            "search": { "company": "Spatie", "author": "Sebastian" },
            "ids": [1, 3, 4],
        },
    })
}

fn filter_defaults() -> serde_json::Value {
    json!({
        "filter": {
            "search": { "company": "Spatie" },
            "ids": [1, 2, 3],
        },
    })
}

#[test]
fn ignores_default_values() {
    assert_eq!(
        qs::to_query_string_with_defaults(&filter_query(), &filter_defaults()).unwrap(),
        "filter[ids][]=1&filter[ids][]=3&filter[ids][]=4&filter[search][author]=Sebastian"
    );
}

#[test]
fn ignores_default_values_with_encoded_brackets() {
    let config = Config::new().encode_brackets(true);
    assert_eq!(
        config
            .to_query_string_with_defaults(&filter_query(), &filter_defaults())
            .unwrap(),
        "filter%5Bids%5D%5B%5D=1&filter%5Bids%5D%5B%5D=3&filter%5Bids%5D%5B%5D=4\
         &filter%5Bsearch%5D%5Bauthor%5D=Sebastian"
    );
}

#[test]
fn array_difference_removes_default_elements() {
    let config = Config::new().array_defaults(ArrayDefaults::Difference);
    assert_eq!(
        config
            .to_query_string_with_defaults(&filter_query(), &filter_defaults())
            .unwrap(),
        "filter[ids][]=4&filter[search][author]=Sebastian"
    );
}

#[test]
fn array_equal_to_default_in_any_order_is_dropped() {
    assert_eq!(
        qs::to_query_string_with_defaults(
            &json!({ "ids": [3, 2, 1], "page": 2 }),
            &json!({ "ids": [1, 2, 3] })
        )
        .unwrap(),
        "page=2"
    );
}

#[test]
fn same_value_different_type_is_a_default_by_text() {
    let query = json!({ "page": { "number": "1" } });
    let defaults = json!({ "page": { "number": 1 } });

    assert_eq!(
        qs::to_query_string_with_defaults(&query, &defaults).unwrap(),
        ""
    );

    let strict = Config::new().scalar_equality(ScalarEquality::Strict);
    assert_eq!(
        strict.to_query_string_with_defaults(&query, &defaults).unwrap(),
        "page[number]=1"
    );
}

#[test]
fn strict_policy_applies_inside_arrays() {
    let query = json!({ "ids": ["1", "2"] });
    let defaults = json!({ "ids": [1, 2] });

    assert_eq!(
        qs::to_query_string_with_defaults(&query, &defaults).unwrap(),
        ""
    );

    let strict = Config::new().scalar_equality(ScalarEquality::Strict);
    assert_eq!(
        strict.to_query_string_with_defaults(&query, &defaults).unwrap(),
        "ids[]=1&ids[]=2"
    );
}

#[test]
fn array_matches_default_when_elements_sort_apart() {
    // "10" sorts before "9" as text, 9 before 10 as numbers
    assert_eq!(
        qs::to_query_string_with_defaults(&json!({ "ids": ["10", "9"] }), &json!({ "ids": [9, 10] }))
            .unwrap(),
        ""
    );
    assert_eq!(
        qs::to_query_string_with_defaults(&json!({ "ids": [1, "2"] }), &json!({ "ids": ["1", 2] }))
            .unwrap(),
        ""
    );

    let strict = Config::new().scalar_equality(ScalarEquality::Strict);
    assert_eq!(
        strict
            .to_query_string_with_defaults(&json!({ "ids": [1, "2"] }), &json!({ "ids": ["1", 2] }))
            .unwrap(),
        "ids[]=1&ids[]=2"
    );
}

#[test]
fn absent_array_elements_do_not_count_against_default() {
    assert_eq!(
        qs::to_query_string_with_defaults(&json!({ "ids": [null, 1] }), &json!({ "ids": [1] }))
            .unwrap(),
        ""
    );
    assert_eq!(
        qs::to_query_string_with_defaults(&json!({ "ids": [1, ""] }), &json!({ "ids": [null, 1] }))
            .unwrap(),
        ""
    );
    assert_eq!(
        qs::to_query_string_with_defaults(&json!({ "ids": [null, 1, 2] }), &json!({ "ids": [1] }))
            .unwrap(),
        "ids[]=1&ids[]=2"
    );
}

#[test]
fn empty_override_never_falls_back_to_default() {
    assert_eq!(
        qs::to_query_string_with_defaults(
            &json!({ "search": "", "sort": null }),
            &json!({ "search": "Sebastian", "sort": "-name" })
        )
        .unwrap(),
        ""
    );
}

#[test]
fn values_without_defaults_are_kept() {
    assert_eq!(
        qs::to_query_string_with_defaults(
            &json!({ "page": 2, "perPage": 15 }),
            &json!({ "page": 1 })
        )
        .unwrap(),
        "page=2&perPage=15"
    );
}

#[test]
fn struct_defaults() {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Query {
        page: u32,
        per_page: u32,
        sort: Option<&'static str>,
        filter: Filter,
    }

    #[derive(Serialize)]
    struct Filter {
        status: Vec<&'static str>,
    }

    let defaults = Query {
        page: 1,
        per_page: 15,
        sort: Some("name"),
        filter: Filter {
            status: vec!["open"],
        },
    };
    let query = Query {
        page: 1,
        per_page: 50,
        sort: Some("-name"),
        filter: Filter {
            status: vec!["open"],
        },
    };

    assert_eq!(
        qs::to_query_string_with_defaults(&query, &defaults).unwrap(),
        "perPage=50&sort=-name"
    );
}
