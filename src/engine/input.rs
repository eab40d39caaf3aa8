//! Input sequences for the interpreter.
//!
//! The interpreter addresses its input by element index: one element is a
//! Unicode code point or one whitespace-separated token name, selected by
//! the grammar's input mode. The raw text stays borrowed; action-reported
//! substrings are sliced lazily from the recorded offsets.

use crate::grammar::InputMode;

/// An indexed view of the input for one parse.
#[derive(Debug, Clone)]
pub enum InputSeq<'s> {
    /// Code points of `src`; `offsets[i]` is the byte offset of element
    /// `i`, with one trailing sentinel at `src.len()`.
    CodePoints { src: &'s str, offsets: Vec<usize> },
    /// Whitespace-separated token names.
    TokenNames { tokens: Vec<&'s str> },
}

impl<'s> InputSeq<'s> {
    pub fn new(src: &'s str, mode: InputMode) -> Self {
        match mode {
            InputMode::CodePoints => {
                let mut offsets: Vec<usize> = src.char_indices().map(|(i, _)| i).collect();
                offsets.push(src.len());
                Self::CodePoints { src, offsets }
            }
            InputMode::TokenNames => Self::TokenNames {
                tokens: src.split_whitespace().collect(),
            },
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::CodePoints { offsets, .. } => offsets.len() - 1,
            Self::TokenNames { tokens } => tokens.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Code point at `pos`, or `None` at end of input.
    ///
    /// Panics on token-name input: a grammar mixing character terminals
    /// into token input is rejected upstream, so reaching here is a
    /// programmer error.
    pub fn char_at(&self, pos: usize) -> Option<char> {
        match self {
            Self::CodePoints { src, offsets } => {
                if pos < self.len() {
                    src[offsets[pos]..].chars().next()
                } else {
                    None
                }
            }
            Self::TokenNames { .. } => {
                panic!("code-point terminal evaluated against token-name input")
            }
        }
    }

    /// Token name at `pos`, or `None` at end of input.
    pub fn token_at(&self, pos: usize) -> Option<&'s str> {
        match self {
            Self::TokenNames { tokens } => tokens.get(pos).copied(),
            Self::CodePoints { .. } => {
                panic!("token terminal evaluated against code-point input")
            }
        }
    }

    /// The consumed text between two element positions: an exact source
    /// slice for code points, the token names joined by single spaces for
    /// token input.
    pub fn slice(&self, from: usize, to: usize) -> String {
        match self {
            Self::CodePoints { src, offsets } => src[offsets[from]..offsets[to]].to_string(),
            Self::TokenNames { tokens } => tokens[from..to].join(" "),
        }
    }
}
