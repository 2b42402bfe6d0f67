// ============================================================================
// Module: Expression Errors
// Description: Parse-time and evaluation-time failures for the expression
//              language.
// Purpose: Carry enough context (byte offset, variable name) to log and
//          report without re-parsing.
// Dependencies: thiserror
// ============================================================================

//! Parse-time and evaluation-time error types for the expression language.

use thiserror::Error;

/// Maximum allowed expression input size in bytes.
pub const MAX_EXPR_INPUT_BYTES: usize = 1024 * 1024;
/// Maximum supported nesting depth for parenthesised/bracketed/call
/// expressions.
pub const MAX_EXPR_NESTING: usize = 32;

/// Failures raised while lexing or parsing expression text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Input was empty or contained only whitespace.
    #[error("input is empty")]
    EmptyInput,
    /// Input exceeded [`MAX_EXPR_INPUT_BYTES`].
    #[error("input exceeds size limit: {actual_bytes} bytes (max {max_bytes})")]
    InputTooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual input length in bytes.
        actual_bytes: usize,
    },
    /// Input exceeded [`MAX_EXPR_NESTING`].
    #[error("input nesting exceeds limit: depth {actual_depth} (max {max_depth}) at {position}")]
    NestingTooDeep {
        /// Maximum allowed nesting depth.
        max_depth: usize,
        /// Actual nesting depth when the error occurred.
        actual_depth: usize,
        /// Byte offset in the original input.
        position: usize,
    },
    /// Unexpected token encountered during lexing or parsing.
    #[error("unexpected token `{found}` at {position}, expected {expected}")]
    UnexpectedToken {
        /// Human-friendly expectation summary.
        expected: &'static str,
        /// The token text that was actually seen.
        found: String,
        /// Byte offset in the original input.
        position: usize,
    },
    /// A numeric literal failed to parse or overflowed.
    #[error("invalid number `{raw}` at {position}")]
    InvalidNumber {
        /// The raw numeric text.
        raw: String,
        /// Byte offset in the original input.
        position: usize,
    },
    /// A string literal was never closed.
    #[error("unterminated string literal starting at {position}")]
    UnterminatedString {
        /// Byte offset of the opening quote.
        position: usize,
    },
    /// Unexpected trailing input after a complete expression.
    #[error("unexpected trailing input at {position}")]
    TrailingInput {
        /// Byte offset where unexpected input begins.
        position: usize,
    },
}

/// Failures raised while evaluating a parsed expression against an
/// environment.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// An identifier was not present in the environment.
    #[error("undefined variable `{0}`")]
    UndefinedVariable(String),
    /// A call referenced a function name that neither the operator registry
    /// nor the built-ins recognize.
    #[error("unknown function `{0}`")]
    UnknownFunction(String),
    /// An operator or built-in received an operand of the wrong shape
    /// (e.g. two lists of mismatched length).
    #[error("shape mismatch in `{context}`: {detail}")]
    ShapeMismatch {
        /// Operator or function name where the mismatch occurred.
        context: String,
        /// Human-readable detail.
        detail: String,
    },
    /// An operator or built-in received a value of the wrong type
    /// (e.g. a string where a number was required).
    #[error("type error in `{context}`: {detail}")]
    TypeError {
        /// Operator or function name where the mismatch occurred.
        context: String,
        /// Human-readable detail.
        detail: String,
    },
    /// Division produced an undefined result (division by zero).
    #[error("division by zero")]
    DivisionByZero,
    /// A function was called with an unexpected argument count.
    #[error("`{name}` expects {expected} arguments, got {actual}")]
    ArityMismatch {
        /// Function name.
        name: String,
        /// Expected argument description.
        expected: &'static str,
        /// Actual argument count.
        actual: usize,
    },
    /// A block construct (`if`/`while`/`for`/`switch`/`break`/`continue`/
    /// `return`) was evaluated; the core never drives these, so reaching one
    /// is always an error.
    #[error("block constructs are not evaluated by this engine")]
    BlockNotSupported,
}
