//! Static error surfaces for the two grammar checkers.
//!
//! Both checkers report build-time, non-retryable failures: the pipeline
//! aborts on the first violation and no partially-annotated graph is passed
//! downstream. Every error carries the offending node's source span; turning
//! spans into line/column renderings is the source-map owner's job, not
//! ours.

use rowan::TextRange;

/// What a grammar checker rejected.
///
/// The first three kinds come from the well-formedness pass, the rest from
/// the stack-balance pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrammarErrorKind {
    /// A construct can loop forever without consuming input.
    InfiniteLoop,
    /// An ordered-choice alternative (or a repetition's empty exit) can
    /// never be reached because the preceding part cannot fail without
    /// consuming input.
    UnreachableAlternative,
    /// A choice alternative or repetition body can fire an action before
    /// consuming input, so backtracking past it would be observable.
    ActsWithoutProgressing,
    /// The alternatives of a choice produce different output counts.
    UnequalChoiceOutputs,
    /// A repetition body's output count is not zero.
    NonZeroRepetitionOutput,
    /// A node's output count never resolved during fixed-point iteration.
    UnresolvableOutputCount,
    /// The entry rule does not produce exactly one output item.
    WrongRootArity,
    /// The output stack may be popped below its depth at entry.
    Underflow,
}

impl GrammarErrorKind {
    /// Stable machine-readable name.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InfiniteLoop => "infinite-loop",
            Self::UnreachableAlternative => "unreachable-alternative",
            Self::ActsWithoutProgressing => "acts-without-progressing",
            Self::UnequalChoiceOutputs => "unequal-choice-outputs",
            Self::NonZeroRepetitionOutput => "non-zero-repetition-output",
            Self::UnresolvableOutputCount => "unresolvable-output-count",
            Self::WrongRootArity => "wrong-root-arity",
            Self::Underflow => "underflow",
        }
    }

    /// Base message, used when the reporting site adds no detail.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::InfiniteLoop => "potential infinite loop",
            Self::UnreachableAlternative => "unreachable alternative",
            Self::ActsWithoutProgressing => "can act without progressing",
            Self::UnequalChoiceOutputs => "choices produce unequal numbers of outputs",
            Self::NonZeroRepetitionOutput => "subrule produces or consumes output items",
            Self::UnresolvableOutputCount => {
                "unable to calculate number of output items produced"
            }
            Self::WrongRootArity => "parser does not produce exactly 1 output item",
            Self::Underflow => "outputs may underflow",
        }
    }
}

impl std::fmt::Display for GrammarErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A positioned, fatal grammar error from one of the static checkers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message} (at {span:?})")]
pub struct GrammarError {
    pub kind: GrammarErrorKind,
    pub span: TextRange,
    pub message: String,
}

impl GrammarError {
    /// Error with the kind's fallback message.
    pub fn new(kind: GrammarErrorKind, span: TextRange) -> Self {
        Self {
            kind,
            span,
            message: kind.fallback_message().to_string(),
        }
    }

    /// Error with a site-specific message.
    pub fn with_message(kind: GrammarErrorKind, span: TextRange, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }
}
