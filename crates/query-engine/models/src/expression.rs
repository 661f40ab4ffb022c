//! Predicate and expression tokens.
//!
//! A predicate is a flat, infix sequence of tokens. It is not a tree: operands
//! and operators are interleaved by the caller, and only function arguments,
//! parenthesized sub-expressions and lists nest.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single token of a predicate or expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Token {
    /// An operator or connective, such as `<`, `and`, `in`, `is not`.
    Operator(String),
    /// A column reference, possibly navigating through associations, such as `author.country`.
    Reference {
        #[serde(rename = "ref")]
        path: Vec<String>,
    },
    /// A function call.
    Function {
        func: String,
        #[serde(default)]
        args: Vec<Token>,
    },
    /// A parenthesized sub-expression.
    Expression { xpr: Vec<Token> },
    /// A list of values, for membership tests.
    List { list: Vec<Token> },
    /// A literal value. Always bound as a parameter, except for `null`.
    /// Last, so the shapes above are tried first. `val` is required, and may be `null`.
    Literal { val: serde_json::Value },
}

impl Token {
    pub fn operator(operator: &str) -> Token {
        Token::Operator(operator.to_string())
    }

    pub fn reference<S: AsRef<str>>(path: impl IntoIterator<Item = S>) -> Token {
        Token::Reference {
            path: path.into_iter().map(|s| s.as_ref().to_string()).collect(),
        }
    }

    pub fn value(val: impl Into<serde_json::Value>) -> Token {
        Token::Literal { val: val.into() }
    }

    pub fn function(func: &str, args: Vec<Token>) -> Token {
        Token::Function {
            func: func.to_string(),
            args,
        }
    }

    pub fn nested(xpr: Vec<Token>) -> Token {
        Token::Expression { xpr }
    }

    pub fn list(list: Vec<Token>) -> Token {
        Token::List { list }
    }
}
