use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("not a lambda: no `=>` found")]
    NotLambda,

    #[error("parameter list parentheses are not balanced")]
    UnbalancedParams,

    #[error("invalid parameter `{0}`")]
    InvalidParam(String),

    #[error("duplicate parameter ${0}")]
    DuplicateParam(String),

    #[error("unexpected character {ch:?} at offset {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unterminated string starting at offset {0}")]
    UnterminatedString(usize),

    #[error("unexpected {found} at offset {pos}, expected {expected}")]
    Unexpected {
        found: String,
        expected: String,
        pos: usize,
    },

    #[error("unexpected end of input, expected {0}")]
    UnexpectedEnd(String),

    #[error("call to unknown function {0}()")]
    UnknownFunction(String),
}

impl From<ParseError> for lazyq_core::Error {
    fn from(e: ParseError) -> Self {
        lazyq_core::Error::InvalidExpression(e.to_string())
    }
}
