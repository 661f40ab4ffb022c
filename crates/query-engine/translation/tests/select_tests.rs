mod common;

use query_engine_models::{Column, QueryTree, Select, Token};
use query_engine_sql::sql::execution_plan::{Expansion, ExpansionKind, Row};
use query_engine_sql::sql::string::PlaceholderStyle;
use query_engine_translation::translation;
use query_engine_translation::translation::error::Error;
use query_engine_translation::translation::settings::TranslationSettings;
use serde_json::json;

#[test]
fn expand_to_one() {
    let plan = common::test_select("select_expand_to_one").unwrap();
    insta::assert_snapshot!(plan.query.sql, @r#"SELECT "Books".TITLE AS "title", "author_1".NAME AS "author_name" FROM BOOKS AS "Books" LEFT JOIN AUTHORS AS "author_1" ON "Books".AUTHOR_ID = "author_1".ID"#);
    assert_eq!(plan.expansions.aliases.get("author", "name"), Some("author_name"));
    assert!(plan.count_query.is_none());
}

#[test]
fn expand_to_one_reshapes_back() {
    let plan = common::test_select("select_expand_to_one").unwrap();
    let rows = vec![
        serde_json::from_value(json!({"title": "X", "author_name": "Y"})).unwrap(),
        serde_json::from_value(json!({"title": "Z", "author_name": null})).unwrap(),
    ];
    let reshaped = translation::reshape_rows(rows, &plan.expansions);
    similar_asserts::assert_eq!(
        serde_json::to_value(reshaped).unwrap(),
        json!([
            {"title": "X", "author": {"name": "Y"}},
            {"title": "Z", "author": null}
        ])
    );
}

#[test]
fn expand_nested_to_one() {
    let plan = common::test_select("select_expand_nested_to_one").unwrap();
    insta::assert_snapshot!(plan.query.sql, @r#"SELECT "Books".TITLE AS "title", "author_1".NAME AS "author_name", "publisher_2".NAME AS "author_publisher_name" FROM BOOKS AS "Books" LEFT JOIN AUTHORS AS "author_1" ON "Books".AUTHOR_ID = "author_1".ID LEFT JOIN PUBLISHERS AS "publisher_2" ON "author_1".PUBLISHER_ID = "publisher_2".ID"#);

    let row = serde_json::from_value(json!({
        "title": "Jane Eyre",
        "author_name": "Charlotte",
        "author_publisher_name": "Smith, Elder & Co."
    }))
    .unwrap();
    similar_asserts::assert_eq!(
        serde_json::to_value(translation::reshape_row(row, &plan.expansions)).unwrap(),
        json!({
            "title": "Jane Eyre",
            "author": {"name": "Charlotte", "publisher": {"name": "Smith, Elder & Co."}}
        })
    );
}

#[test]
fn where_paths_inner_join_and_order_paths_left_join() {
    let plan = common::test_select("select_where_path").unwrap();
    insta::assert_snapshot!(plan.query.sql, @r#"SELECT "Books".TITLE AS "title" FROM BOOKS AS "Books" INNER JOIN AUTHORS AS "author_1" ON "Books".AUTHOR_ID = "author_1".ID LEFT JOIN AUTHORS AS "author_2" ON "Books".AUTHOR_ID = "author_2".ID WHERE "author_1".NAME = ? OR "author_1".ID = ? ORDER BY "author_2".NAME DESC NULLS LAST"#);
    similar_asserts::assert_eq!(common::params(&plan.query), json!(["Emily", 1]));
    assert!(plan.expansions.expansions.is_empty());
}

#[test]
fn expand_to_many_groups_by_the_parent_columns() {
    let plan = common::test_select("select_expand_to_many").unwrap();
    insta::assert_snapshot!(plan.query.sql, @r#"SELECT "Authors".NAME AS "name", COALESCE(JSON_AGG(JSON_BUILD_OBJECT('title', "books_1".TITLE)) FILTER (WHERE "books_1".ID IS NOT NULL), '[]') AS "books" FROM AUTHORS AS "Authors" LEFT JOIN BOOKS AS "books_1" ON "books_1".AUTHOR_ID = "Authors".ID GROUP BY "Authors".NAME"#);
    similar_asserts::assert_eq!(
        plan.expansions.expansions,
        vec![Expansion {
            name: "books".to_string(),
            path: "books".to_string(),
            kind: ExpansionKind::ToMany {
                column: "books".to_string()
            },
            nested: vec![],
        }]
    );
}

#[test]
fn expand_to_many_alone_groups_by_the_parent_key() {
    let plan = common::test_select("select_expand_to_many_only").unwrap();
    insta::assert_snapshot!(plan.query.sql, @r#"SELECT COALESCE(JSON_AGG(JSON_BUILD_OBJECT('title', "books_1".TITLE)) FILTER (WHERE "books_1".ID IS NOT NULL), '[]') AS "books" FROM AUTHORS AS "Authors" LEFT JOIN BOOKS AS "books_1" ON "books_1".AUTHOR_ID = "Authors".ID GROUP BY "Authors".ID"#);
}

#[test]
fn expand_to_many_beside_a_function_groups_by_the_parent_key() {
    let plan = common::test_select("select_expand_to_many_computed").unwrap();
    insta::assert_snapshot!(plan.query.sql, @r#"SELECT LOWER("Authors".NAME) AS "lower_name", COALESCE(JSON_AGG(JSON_BUILD_OBJECT('title', "books_1".TITLE)) FILTER (WHERE "books_1".ID IS NOT NULL), '[]') AS "books" FROM AUTHORS AS "Authors" LEFT JOIN BOOKS AS "books_1" ON "books_1".AUTHOR_ID = "Authors".ID GROUP BY "Authors".ID"#);
}

#[test]
fn expand_to_many_of_star_groups_by_the_parent_key() {
    let plan = common::test_select("select_expand_to_many_star").unwrap();
    insta::assert_snapshot!(plan.query.sql, @r#"SELECT "Authors".*, COALESCE(JSON_AGG(JSON_BUILD_OBJECT('title', "books_1".TITLE, 'genre', JSON_BUILD_OBJECT('name', "genre_2".NAME))) FILTER (WHERE "books_1".ID IS NOT NULL), '[]') AS "books" FROM AUTHORS AS "Authors" LEFT JOIN BOOKS AS "books_1" ON "books_1".AUTHOR_ID = "Authors".ID LEFT JOIN GENRES AS "genre_2" ON "books_1".GENRE_ID = "genre_2".ID GROUP BY "Authors".ID"#);

    let row = serde_json::from_value(json!({
        "ID": 1,
        "NAME": "Emily",
        "books": [
            {"title": "Wuthering Heights", "genre": {"name": "Drama"}},
            {"title": "Poems", "genre": {"name": null}}
        ]
    }))
    .unwrap();
    similar_asserts::assert_eq!(
        serde_json::to_value(translation::reshape_row(row, &plan.expansions)).unwrap(),
        json!({
            "ID": 1,
            "NAME": "Emily",
            "books": [
                {"title": "Wuthering Heights", "genre": {"name": "Drama"}},
                {"title": "Poems", "genre": null}
            ]
        })
    );
}

#[test]
fn self_refers_to_the_referencing_row_at_every_level() {
    let plan = common::test_select("select_unmanaged_self").unwrap();
    insta::assert_snapshot!(plan.query.sql, @r#"SELECT "Genres".NAME AS "name", "parent_1".NAME AS "parent_name", "parent_2".NAME AS "parent_parent_name" FROM GENRES AS "Genres" LEFT JOIN GENRES AS "parent_1" ON "parent_1".ID = "Genres".PARENT_ID LEFT JOIN GENRES AS "parent_2" ON "parent_2".ID = "parent_1".PARENT_ID"#);
}

#[test]
fn inline_columns_stay_flat() {
    let plan = common::test_select("select_inline").unwrap();
    insta::assert_snapshot!(plan.query.sql, @r#"SELECT "Books".TITLE AS "title", "genre_1".NAME AS "genre_name" FROM BOOKS AS "Books" LEFT JOIN GENRES AS "genre_1" ON "Books".GENRE_ID = "genre_1".ID"#);

    let row: Row =
        serde_json::from_value(json!({"title": "X", "genre_name": "Drama"})).unwrap();
    similar_asserts::assert_eq!(translation::reshape_row(row.clone(), &plan.expansions), row);
}

#[test]
fn temporal_entities_read_the_current_slice() {
    let plan = common::test_select("select_temporal").unwrap();
    insta::assert_snapshot!(plan.query.sql, @r#"SELECT * FROM PRICES AS "Prices" WHERE ("Prices".AMOUNT > ?) AND "Prices".VALID_FROM <= NOW() AND NOW() < "Prices".VALID_TO"#);
    similar_asserts::assert_eq!(common::params(&plan.query), json!([10]));
}

#[test]
fn temporal_join_targets_restrict_the_join() {
    let plan = common::test_select("select_temporal_join").unwrap();
    insta::assert_snapshot!(plan.query.sql, @r#"SELECT "Books".TITLE AS "title", "listPrice_1".AMOUNT AS "listPrice_amount" FROM BOOKS AS "Books" LEFT JOIN PRICES AS "listPrice_1" ON "Books".LIST_PRICE_ID = "listPrice_1".ID AND "listPrice_1".VALID_FROM <= ? AND ? < "listPrice_1".VALID_TO"#);
    similar_asserts::assert_eq!(
        common::params(&plan.query),
        json!(["2024-01-01", "2024-01-01"])
    );
}

#[test]
fn count_ignores_ordering_and_pagination() {
    let plan = common::test_select("select_count_paginated").unwrap();
    insta::assert_snapshot!(plan.query.sql, @r#"SELECT * FROM BOOKS AS "Books" WHERE "Books".STOCK > ? ORDER BY "Books".TITLE ASC LIMIT 10 OFFSET 20"#);
    let count = plan.count_query.unwrap();
    insta::assert_snapshot!(count.sql, @r#"SELECT COUNT(*) AS "$count" FROM (SELECT * FROM BOOKS AS "Books" WHERE "Books".STOCK > ?) AS "counted""#);
    similar_asserts::assert_eq!(common::params(&count), json!([0]));
}

#[test]
fn localized_reads_from_the_localized_view() {
    let plan = common::test_select("select_localized").unwrap();
    insta::assert_snapshot!(plan.query.sql, @r#"SELECT "Books".TITLE AS "title" FROM "localized_BOOKS" AS "Books""#);
}

#[test]
fn localized_needs_localized_columns() {
    let mut select = Select::new("Authors");
    select.localized = true;
    assert_eq!(
        translation::compile_select(&common::bookshop(), &TranslationSettings::default(), &select),
        Err(Error::NotLocalized("Authors".to_string()))
    );
}

#[test]
fn functions_literals_and_source_aliases() {
    let plan = common::test_select("select_functions").unwrap();
    insta::assert_snapshot!(plan.query.sql, @r#"SELECT UPPER("b".TITLE) AS "loud", ? AS "one" FROM BOOKS AS "b" WHERE "b".TITLE LIKE ? ESCAPE '\'"#);
    similar_asserts::assert_eq!(common::params(&plan.query), json!([1, "%50\\%%"]));
}

#[test]
fn compiling_twice_gives_identical_statements() {
    for testname in [
        "select_expand_nested_to_one",
        "select_where_path",
        "select_expand_to_many_star",
    ] {
        assert_eq!(
            common::test_select(testname).unwrap(),
            common::test_select(testname).unwrap()
        );
    }
}

#[test]
fn numbered_placeholders() {
    let QueryTree::Select(select) = common::read_request("select_where_path")
    else {
        panic!("expected a select");
    };
    let settings = TranslationSettings {
        placeholder: PlaceholderStyle::Numbered,
        ..TranslationSettings::default()
    };
    let plan = translation::compile_select(&common::bookshop(), &settings, &select).unwrap();
    assert!(plan
        .query
        .sql
        .contains(r#"WHERE "author_1".NAME = $1 OR "author_1".ID = $2"#));
}

#[test]
fn default_schema_qualifies_tables() {
    let QueryTree::Select(select) =
        common::read_request("select_expand_to_one")
    else {
        panic!("expected a select");
    };
    let settings = TranslationSettings {
        default_schema: Some("bookshop".to_string()),
        ..TranslationSettings::default()
    };
    let plan = translation::compile_select(&common::bookshop(), &settings, &select).unwrap();
    insta::assert_snapshot!(plan.query.sql, @r#"SELECT "Books".TITLE AS "title", "author_1".NAME AS "author_name" FROM "bookshop".BOOKS AS "Books" LEFT JOIN "bookshop".AUTHORS AS "author_1" ON "Books".AUTHOR_ID = "author_1".ID"#);
}

#[test]
fn pretty_printing_keeps_the_statement() {
    let plan = common::test_select("select_where_path").unwrap();
    let pretty = common::pretty(&plan.query);
    assert!(pretty.lines().count() > 1);
    assert!(pretty.contains("INNER JOIN"));
    assert!(pretty.contains("LEFT JOIN"));
}

#[test]
fn expansions_deeper_than_the_limit_are_rejected() {
    let mut column = Column::expand("parent", vec![Column::reference("name")]);
    for _ in 0..5 {
        column = Column::expand("parent", vec![column]);
    }
    let mut select = Select::new("Genres");
    select.columns = vec![column];

    assert_eq!(
        translation::compile_select(&common::bookshop(), &TranslationSettings::default(), &select),
        Err(Error::ExpansionTooDeep {
            path: "parent.parent.parent.parent.parent.parent".to_string(),
            max_depth: 5,
        })
    );
}

#[test]
fn unknown_associations_are_reported() {
    let mut select = Select::new("Books");
    select.columns = vec![Column::expand("translator", vec![Column::reference("name")])];
    assert_eq!(
        translation::compile_select(&common::bookshop(), &TranslationSettings::default(), &select),
        Err(Error::AssociationNotFound {
            entity: "Books".to_string(),
            association: "translator".to_string(),
        })
    );
}

#[test]
fn paths_through_to_many_associations_are_rejected() {
    let QueryTree::Select(mut select) = common::read_request("select_expand_to_one") else {
        panic!("expected a select");
    };
    select.from.entity = "Authors".to_string();
    select.columns = vec![];
    select.where_ = Some(vec![
        Token::Reference {
            path: vec!["books".to_string(), "title".to_string()],
        },
        Token::Operator("=".to_string()),
        Token::Literal { val: json!("Poems") },
    ]);
    assert_eq!(
        translation::compile_select(&common::bookshop(), &TranslationSettings::default(), &select),
        Err(Error::ToManyPathNotSupported("books".to_string()))
    );
}

#[test]
fn a_second_to_many_expansion_is_rejected() {
    let mut select = Select::new("Books");
    select.columns = vec![
        Column::expand("reviews", vec![Column::reference("rating")]),
        Column::expand("author", vec![Column::expand("books", vec![Column::reference("title")])]),
    ];
    assert!(matches!(
        translation::compile_select(&common::bookshop(), &TranslationSettings::default(), &select),
        Err(Error::NotSupported(_))
    ));
}
