//! Transition conditions.
//!
//! A condition is a predicate over [`Context`] evaluated when the actor
//! selects the next node. Built-in variants cover the common cases; the
//! `Custom` variant wraps an arbitrary closure for everything else.

use crate::context::Context;
use crate::error::Result;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Signature of a user-supplied condition closure.
pub type ConditionFn = Arc<dyn Fn(&Context) -> Result<bool> + Send + Sync>;

/// A predicate over [`Context`], evaluated against the latest request.
///
/// Only `Custom` conditions can fail; the actor treats a failing condition
/// as false and continues with the next transition.
#[derive(Clone)]
pub enum Condition {
    /// Always satisfied (an unconditional transition).
    Always,
    /// Satisfied when the latest request text equals the given text.
    ExactMatch(String),
    /// Satisfied when the latest request text matches the pattern.
    Regexp(Regex),
    /// Inverts the inner condition.
    Not(Box<Condition>),
    /// Satisfied when all inner conditions are satisfied.
    All(Vec<Condition>),
    /// Satisfied when any inner condition is satisfied.
    Any(Vec<Condition>),
    /// A user-supplied predicate.
    Custom(ConditionFn),
}

impl Condition {
    /// Shorthand for [`Condition::ExactMatch`].
    pub fn exact_match(text: impl Into<String>) -> Self {
        Self::ExactMatch(text.into())
    }

    /// Compiles a regular expression condition.
    ///
    /// # Errors
    ///
    /// Returns a `Script` error when the pattern does not compile.
    pub fn regexp(pattern: &str) -> Result<Self> {
        let re = Regex::new(pattern)
            .map_err(|e| crate::error::ColloquyError::script(format!("invalid pattern: {e}")))?;
        Ok(Self::Regexp(re))
    }

    /// Wraps a user-supplied predicate.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Context) -> Result<bool> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Evaluates the condition against the context.
    ///
    /// # Errors
    ///
    /// Propagates errors from `Custom` predicates (including those nested
    /// inside `Not`/`All`/`Any`).
    pub fn check(&self, ctx: &Context) -> Result<bool> {
        match self {
            Self::Always => Ok(true),
            Self::ExactMatch(text) => Ok(ctx
                .last_request()
                .map(|m| m.text == *text)
                .unwrap_or(false)),
            Self::Regexp(re) => Ok(ctx
                .last_request()
                .map(|m| re.is_match(&m.text))
                .unwrap_or(false)),
            Self::Not(inner) => Ok(!inner.check(ctx)?),
            Self::All(inner) => {
                for condition in inner {
                    if !condition.check(ctx)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Any(inner) => {
                for condition in inner {
                    if condition.check(ctx)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::Custom(f) => f(ctx),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => write!(f, "Always"),
            Self::ExactMatch(text) => f.debug_tuple("ExactMatch").field(text).finish(),
            Self::Regexp(re) => f.debug_tuple("Regexp").field(&re.as_str()).finish(),
            Self::Not(inner) => f.debug_tuple("Not").field(inner).finish(),
            Self::All(inner) => f.debug_tuple("All").field(inner).finish(),
            Self::Any(inner) => f.debug_tuple("Any").field(inner).finish(),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}
