//! Core traits for keyword handling

use crate::context::HandlerContext;
use crate::error::HandlerError;

/// Semantic handler for one keyword
///
/// Handlers mutate the current step through the context and must not keep
/// any reference to it after returning.
pub type HandlerFn = fn(&mut HandlerContext<'_>) -> Result<(), HandlerError>;

/// A family of related keywords with its own handler table
pub trait KeywordDomain: Send + Sync {
    /// Name used in diagnostics
    fn name(&self) -> &'static str;

    /// Handler for `keyword`, or `None` when the domain declines it
    fn handler(&self, keyword: &str) -> Option<HandlerFn>;
}
