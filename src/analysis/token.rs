//! Token types for text analysis.
//!
//! A [`Token`] is the unit that flows from tokenizers through filters into the
//! index. Positions are 1-based so that phrase compilation can compute gaps by
//! subtraction.
//!
//! # Examples
//!
//! ```
//! use glaive::analysis::token::Token;
//!
//! let token = Token::with_offsets("world", 2, 6, 11);
//! assert_eq!(token.text, "world");
//! assert_eq!(token.position, 2);
//! assert_eq!(token.end_offset - token.start_offset, 5);
//! ```

use serde::{Deserialize, Serialize};

/// A single unit of text after tokenization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// The text content of the token.
    pub text: String,

    /// The position of the token in the token stream (1-based).
    pub position: usize,

    /// The byte offset where this token starts in the original text.
    pub start_offset: usize,

    /// The byte offset where this token ends in the original text.
    pub end_offset: usize,
}

impl Token {
    /// Create a new token with the given text and position.
    pub fn new<S: Into<String>>(text: S, position: usize) -> Self {
        Token {
            text: text.into(),
            position,
            start_offset: 0,
            end_offset: 0,
        }
    }

    /// Create a new token with byte offsets into the source text.
    pub fn with_offsets<S: Into<String>>(
        text: S,
        position: usize,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Token {
            text: text.into(),
            position,
            start_offset,
            end_offset,
        }
    }
}

/// A stream of tokens.
pub type TokenStream = Box<dyn Iterator<Item = Token> + Send>;
