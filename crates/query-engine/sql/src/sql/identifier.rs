//! Deciding when a name must be quoted, and producing qualified table names.
//!
//! Unquoted identifiers are folded to upper case by the target database, so any
//! name that is not already upper case must be quoted to keep its spelling.

/// Reserved words which must always be quoted when used as identifiers.
/// Kept sorted, we binary search it.
const RESERVED_WORDS: &[&str] = &[
    "ALL",
    "ALTER",
    "AND",
    "ANY",
    "ARRAY",
    "AS",
    "ASC",
    "BETWEEN",
    "BY",
    "CASE",
    "CAST",
    "CHECK",
    "COLUMN",
    "CONSTRAINT",
    "CREATE",
    "CROSS",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "CURRENT_TIMESTAMP",
    "CURRENT_USER",
    "DEFAULT",
    "DELETE",
    "DESC",
    "DISTINCT",
    "DROP",
    "ELSE",
    "END",
    "ESCAPE",
    "EXCEPT",
    "EXISTS",
    "FALSE",
    "FETCH",
    "FILTER",
    "FOR",
    "FOREIGN",
    "FROM",
    "FULL",
    "GRANT",
    "GROUP",
    "HAVING",
    "IN",
    "INNER",
    "INSERT",
    "INTERSECT",
    "INTO",
    "IS",
    "JOIN",
    "KEY",
    "LEFT",
    "LIKE",
    "LIMIT",
    "MATCHED",
    "MERGE",
    "NOT",
    "NULL",
    "NULLS",
    "OFFSET",
    "ON",
    "OR",
    "ORDER",
    "OUTER",
    "PRIMARY",
    "REFERENCES",
    "RIGHT",
    "ROW",
    "ROWS",
    "SELECT",
    "SET",
    "TABLE",
    "THEN",
    "TO",
    "TRUE",
    "UNION",
    "UNIQUE",
    "UPDATE",
    "USER",
    "USING",
    "VALUES",
    "VIEW",
    "WHEN",
    "WHERE",
    "WITH",
];

/// Is this name a reserved word? Matched case-insensitively.
pub fn is_reserved(name: &str) -> bool {
    RESERVED_WORDS
        .binary_search(&name.to_ascii_uppercase().as_str())
        .is_ok()
}

/// Is this name already a quoted identifier: wrapped in double quotes, with every double quote
/// inside doubled?
pub fn is_quoted(name: &str) -> bool {
    match name.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')) {
        Some(inner) => inner.replace("\"\"", "").find('"').is_none(),
        None => false,
    }
}

/// Does this name need quoting to be used as an identifier as-is?
pub fn needs_quoting(name: &str) -> bool {
    if is_quoted(name) {
        return false;
    }
    name.is_empty()
        || name.starts_with(|c: char| c.is_ascii_digit())
        || !name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        || is_reserved(name)
}

/// Quote a name if it needs quoting, doubling any embedded double quotes.
/// Already quoted names are returned unchanged, so this is idempotent.
pub fn normalize(name: &str) -> String {
    if needs_quoting(name) {
        format!("\"{}\"", name.replace('"', "\"\""))
    } else {
        name.to_string()
    }
}

/// Strip surrounding double quotes, undoing the doubling of embedded ones.
pub fn unquote(name: &str) -> String {
    if is_quoted(name) {
        name[1..name.len() - 1].replace("\"\"", "\"")
    } else {
        name.to_string()
    }
}

/// Split a possibly qualified name on dots which are not inside double quotes.
pub fn split_qualified(name: &str) -> Vec<String> {
    let mut segments = vec![];
    let mut current = String::new();
    let mut in_quotes = false;
    for c in name.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            '.' if !in_quotes => segments.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    segments.push(current);
    segments
}

/// Fill in missing catalog and schema segments from the defaults.
/// Returns the `(catalog, schema, table)` segments, unquoted segments left as they were.
pub fn qualified_segments(
    name: &str,
    default_catalog: Option<&str>,
    default_schema: Option<&str>,
) -> (Option<String>, Option<String>, String) {
    let mut segments = split_qualified(name);
    match segments.len() {
        1 => (
            default_catalog.map(str::to_string),
            default_schema.map(str::to_string),
            segments.remove(0),
        ),
        2 => {
            let table = segments.remove(1);
            let schema = segments.remove(0);
            (default_catalog.map(str::to_string), Some(schema), table)
        }
        _ => {
            // anything beyond three parts is kept in the table segment
            let catalog = segments.remove(0);
            let schema = segments.remove(0);
            (Some(catalog), Some(schema), segments.join("."))
        }
    }
}

/// Produce a fully qualified, per-segment quoted table name.
/// Missing segments are only filled in from the defaults when they are absent.
pub fn qualify(name: &str, default_catalog: Option<&str>, default_schema: Option<&str>) -> String {
    let (catalog, schema, table) = qualified_segments(name, default_catalog, default_schema);
    let mut segments = vec![];
    // a catalog without a schema cannot be expressed, so it is dropped
    if let Some(schema) = schema {
        segments.extend(catalog);
        segments.push(schema);
    }
    segments.push(table);
    segments
        .iter()
        .map(|segment| normalize(segment))
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquote_reverses_normalize() {
        assert_eq!(unquote(&normalize("my \"table\"")), "my \"table\"");
        assert_eq!(unquote("BOOKS"), "BOOKS");
    }

    #[test]
    fn reserved_words_are_sorted() {
        let mut sorted = RESERVED_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, RESERVED_WORDS);
    }

    #[test]
    fn upper_case_names_are_left_alone() {
        assert_eq!(normalize("BOOKS"), "BOOKS");
        assert_eq!(normalize("AUTHOR_ID"), "AUTHOR_ID");
        assert_eq!(normalize("T2"), "T2");
    }

    #[test]
    fn lower_and_mixed_case_names_are_quoted() {
        assert_eq!(normalize("price"), "\"price\"");
        assert_eq!(normalize("Books"), "\"Books\"");
    }

    #[test]
    fn reserved_words_are_quoted_in_any_case() {
        assert_eq!(normalize("ORDER"), "\"ORDER\"");
        assert_eq!(normalize("from"), "\"from\"");
        assert!(is_reserved("Select"));
    }

    #[test]
    fn special_characters_are_quoted_and_quotes_doubled() {
        assert_eq!(normalize("MY-TABLE"), "\"MY-TABLE\"");
        assert_eq!(normalize("A\"B"), "\"A\"\"B\"");
        assert_eq!(normalize("1ST"), "\"1ST\"");
        assert_eq!(normalize(""), "\"\"");
    }

    #[test]
    fn normalize_is_idempotent() {
        for name in [
            "price",
            "PRICE",
            "Order",
            "a\"b",
            "\"",
            "\"abc",
            "x.y",
            "",
            "with space",
            "\"x\" = 1 OR \"y\"",
        ] {
            let once = normalize(name);
            assert_eq!(normalize(&once), once, "not idempotent for {name:?}");
        }
    }

    #[test]
    fn names_with_lone_inner_quotes_are_not_quoted() {
        assert!(is_quoted("\"my table\""));
        assert!(is_quoted("\"a\"\"b\""));
        assert!(!is_quoted("\"x\" = 1 OR \"y\""));
        assert_eq!(
            normalize("\"x\" = 1 OR \"y\""),
            "\"\"\"x\"\" = 1 OR \"\"y\"\"\""
        );
    }

    #[test]
    fn qualify_fills_only_missing_segments() {
        assert_eq!(qualify("BOOKS", Some("CAT"), Some("SHOP")), "CAT.SHOP.BOOKS");
        assert_eq!(qualify("OTHER.BOOKS", Some("CAT"), Some("SHOP")), "CAT.OTHER.BOOKS");
        assert_eq!(qualify("C.S.BOOKS", Some("CAT"), Some("SHOP")), "C.S.BOOKS");
        assert_eq!(qualify("Books", None, None), "\"Books\"");
        assert_eq!(qualify("shop.Books", None, None), "\"shop\".\"Books\"");
    }

    #[test]
    fn qualify_respects_quoted_segments() {
        assert_eq!(
            qualify("\"my.schema\".BOOKS", None, None),
            "\"my.schema\".BOOKS"
        );
    }
}
