use std::fs;
use std::path::PathBuf;

use query_engine_metadata::metadata::Metadata;
use query_engine_models::QueryTree;
use query_engine_sql::sql;
use query_engine_sql::sql::execution_plan::ExecutionPlan;
use query_engine_translation::translation;
use query_engine_translation::translation::settings::TranslationSettings;

/// The bookshop entities all translation tests run against.
pub fn bookshop() -> Metadata {
    serde_json::from_str(&fs::read_to_string("tests/goldenfiles/bookshop.json").unwrap()).unwrap()
}

/// Read a query tree from a golden file directory.
pub fn read_request(testname: &str) -> QueryTree {
    let path = PathBuf::from("tests/goldenfiles")
        .join(testname)
        .join("request.json");
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

/// Compile the SELECT of a golden file against the bookshop.
pub fn test_select(testname: &str) -> Result<ExecutionPlan, translation::error::Error> {
    let QueryTree::Select(select) = read_request(testname) else {
        panic!("{testname} is not a SELECT");
    };
    translation::compile_select(&bookshop(), &TranslationSettings::default(), &select)
}

/// The parameters of a statement as json, in placeholder order.
pub fn params(sql: &sql::string::SQL) -> serde_json::Value {
    serde_json::Value::Array(sql.params.iter().map(sql::string::Param::to_json).collect())
}

/// Pretty print a statement for reading.
pub fn pretty(sql: &sql::string::SQL) -> String {
    sqlformat::format(
        &sql.sql,
        &sqlformat::QueryParams::None,
        sqlformat::FormatOptions::default(),
    )
}
