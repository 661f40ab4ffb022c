mod common;

use query_engine_models::{OrderByItem, Pagination, Token};
use query_engine_translation::translation;
use query_engine_translation::translation::error::Error;
use query_engine_translation::translation::settings::TranslationSettings;
use serde_json::json;

fn tokens(value: serde_json::Value) -> Vec<Token> {
    serde_json::from_value(value).unwrap()
}

fn compile(value: serde_json::Value) -> Result<query_engine_sql::sql::string::SQL, Error> {
    translation::compile_predicate(&tokens(value), &TranslationSettings::default())
}

#[test]
fn comparison_binds_the_literal() {
    let sql = compile(json!([{"ref": ["price"]}, "<", {"val": 20}])).unwrap();
    insta::assert_snapshot!(sql.sql, @r#""price" < ?"#);
    similar_asserts::assert_eq!(common::params(&sql), json!([20]));
}

#[test]
fn in_list_binds_every_element() {
    let sql = compile(json!([
        {"ref": ["status"]}, "in", {"list": [{"val": "active"}, {"val": "pending"}]}
    ]))
    .unwrap();
    insta::assert_snapshot!(sql.sql, @r#""status" IN (?, ?)"#);
    similar_asserts::assert_eq!(common::params(&sql), json!(["active", "pending"]));
}

#[test]
fn null_is_not_bound() {
    let sql = compile(json!([{"ref": ["deleted"]}, "is", {"val": null}])).unwrap();
    insta::assert_snapshot!(sql.sql, @r#""deleted" IS NULL"#);
    assert!(sql.params.is_empty());
}

#[test]
fn every_literal_gets_one_placeholder() {
    let sql = compile(json!([
        {"xpr": [{"ref": ["a"]}, "=", {"val": 1}, "or", {"ref": ["b"]}, "=", {"val": "x'; --"}]},
        "and", {"ref": ["c"]}, "between", {"val": 1}, "and", {"val": 5},
        "and", {"ref": ["d"]}, "<>", {"val": null}
    ]))
    .unwrap();
    insta::assert_snapshot!(sql.sql, @r#"("a" = ? OR "b" = ?) AND "c" BETWEEN ? AND ? AND "d" <> NULL"#);
    assert_eq!(sql.sql.matches('?').count(), sql.params.len());
    similar_asserts::assert_eq!(common::params(&sql), json!([1, "x'; --", 1, 5]));
}

#[test]
fn paths_render_dotted_without_metadata() {
    let sql = compile(json!([{"ref": ["author", "name"]}, "==", {"val": "Emily"}])).unwrap();
    insta::assert_snapshot!(sql.sql, @r#""author"."name" = ?"#);
}

#[test]
fn pattern_functions_become_like() {
    let sql = compile(json!([
        {"func": "startswith", "args": [{"ref": ["TITLE"]}, {"val": "The_"}]}
    ]))
    .unwrap();
    insta::assert_snapshot!(sql.sql, @r"TITLE LIKE ? ESCAPE '\'");
    similar_asserts::assert_eq!(common::params(&sql), json!(["The\\_%"]));

    let sql = compile(json!([
        {"func": "endswith", "args": [{"ref": ["TITLE"]}, {"ref": ["SUFFIX"]}]}
    ]))
    .unwrap();
    insta::assert_snapshot!(sql.sql, @r"TITLE LIKE CONCAT('%', SUFFIX) ESCAPE '\'");
    assert!(sql.params.is_empty());
}

#[test]
fn unknown_functions_pass_through() {
    let sql = compile(json!([
        {"func": "soundex", "args": [{"ref": ["NAME"]}]}, "=", {"func": "soundex", "args": [{"val": "x"}]}
    ]))
    .unwrap();
    insta::assert_snapshot!(sql.sql, @"SOUNDEX(NAME) = SOUNDEX(?)");
}

#[test]
fn dotted_function_names_pass_through() {
    let sql = compile(json!([
        {"func": "pkg.fn_1", "args": [{"ref": ["NAME"]}]}, "=", {"val": 1}
    ]))
    .unwrap();
    insta::assert_snapshot!(sql.sql, @"PKG.FN_1(NAME) = ?");
}

#[test]
fn function_names_cannot_carry_sql() {
    let name = "now() OR 1=1; DROP TABLE BOOKS; --";
    assert_eq!(
        compile(json!([{"func": name, "args": []}])),
        Err(Error::InvalidFunctionName(name.to_string()))
    );
    assert_eq!(
        compile(json!([{"func": "a..b", "args": []}])),
        Err(Error::InvalidFunctionName("a..b".to_string()))
    );
}

#[test]
fn references_with_lone_quotes_stay_one_identifier() {
    let sql = compile(json!([{"ref": ["\"x\" = 1 OR \"y\""]}, "=", {"val": 1}])).unwrap();
    insta::assert_snapshot!(sql.sql, @r#""""x"" = 1 OR ""y""" = ?"#);
    similar_asserts::assert_eq!(common::params(&sql), json!([1]));
}

#[test]
fn known_functions_are_renamed() {
    let sql = compile(json!([
        {"func": "tolower", "args": [{"ref": ["NAME"]}]}, "=", {"func": "concat", "args": [{"val": "a"}, {"ref": ["B"]}]},
        "and", {"func": "length", "args": [{"ref": ["NAME"]}]}, ">", {"val": 3}
    ]))
    .unwrap();
    insta::assert_snapshot!(sql.sql, @"LOWER(NAME) = CONCAT(?, B) AND LENGTH(NAME) > ?");
}

#[test]
fn contract_violations_fail() {
    assert_eq!(compile(json!([{"ref": []}])), Err(Error::EmptyReference));
    assert_eq!(
        compile(json!([{"func": "contains", "args": [{"ref": ["TITLE"]}]}])),
        Err(Error::MissingFunctionArguments {
            function: "contains".to_string(),
            expected: 2,
            got: 1,
        })
    );
    assert_eq!(
        compile(json!([{"ref": ["A"]}, "= 1; DROP TABLE BOOKS", {"val": 1}])),
        Err(Error::InvalidOperator("= 1; DROP TABLE BOOKS".to_string()))
    );
}

#[test]
fn an_empty_predicate_is_true() {
    let sql = compile(json!([])).unwrap();
    assert_eq!(sql.sql, "TRUE");
}

#[test]
fn order_by_clause() {
    let items: Vec<OrderByItem> = serde_json::from_value(json!([
        {"ref": ["title"], "sort": "desc", "nulls": "first"},
        {"ref": ["ID"]}
    ]))
    .unwrap();
    let sql = translation::compile_order_by(&items, &TranslationSettings::default()).unwrap();
    insta::assert_snapshot!(sql.sql, @r#"ORDER BY "title" DESC NULLS FIRST, ID"#);

    let empty = translation::compile_order_by(&[], &TranslationSettings::default()).unwrap();
    assert_eq!(empty.sql, "");
}

#[test]
fn pagination_clause() {
    assert_eq!(
        translation::compile_pagination(Some(&Pagination {
            rows: Some(10),
            offset: Some(20),
        })),
        "LIMIT 10 OFFSET 20"
    );
    assert_eq!(translation::compile_pagination(None), "");
}

#[test]
fn count_wraps_any_select() {
    let mut inner = compile(json!([{"ref": ["STOCK"]}, ">", {"val": 0}])).unwrap();
    inner.sql = format!("SELECT * FROM BOOKS WHERE {}", inner.sql);
    let counted = translation::wrap_with_count(inner);
    insta::assert_snapshot!(counted.sql, @r#"SELECT COUNT(*) AS "$count" FROM (SELECT * FROM BOOKS WHERE STOCK > ?) AS "counted""#);
    similar_asserts::assert_eq!(common::params(&counted), json!([0]));
}
