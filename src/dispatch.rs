//! Keyword routing and error classification
//!
//! Every keyword is offered to the domain dispatchers in a fixed priority
//! order and then looked up in the flat table. At most one handler runs. The
//! dispatcher is also the only place where handler failures are classified,
//! logged and turned into located input errors.

use std::collections::HashMap;

use crate::context::HandlerContext;
use crate::domain_handlers::{GroupDomain, MswDomain, NetworkDomain, UdqDomain};
use crate::error::{HandlerError, InputError, INTERNAL_ERROR_PREFIX};
use crate::handlers::flat_table;
use crate::traits::{HandlerFn, KeywordDomain};
use crate::well_handlers::WellDomain;

/// Outcome of offering a keyword to the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Handled,
    /// No domain claimed the keyword and it is not in the flat table
    Unrecognized,
}

/// Immutable routing table from keyword name to handler
pub struct KeywordDispatcher {
    domains: Vec<Box<dyn KeywordDomain>>,
    flat: HashMap<&'static str, HandlerFn>,
}

impl KeywordDispatcher {
    /// Create the dispatcher with the built in domains and flat table
    pub fn new() -> Self {
        Self {
            domains: vec![
                Box::new(WellDomain),
                Box::new(GroupDomain),
                Box::new(MswDomain),
                Box::new(NetworkDomain),
                Box::new(UdqDomain),
            ],
            flat: flat_table(),
        }
    }

    /// Find the handler for a keyword
    pub fn handler(&self, keyword: &str) -> Option<HandlerFn> {
        self.domains
            .iter()
            .find_map(|domain| domain.handler(keyword))
            .or_else(|| self.flat.get(keyword).copied())
    }

    /// Name of the domain claiming `keyword`, `"flat"` for table entries
    pub fn owner(&self, keyword: &str) -> Option<&'static str> {
        self.domains
            .iter()
            .find(|domain| domain.handler(keyword).is_some())
            .map(|domain| domain.name())
            .or_else(|| self.flat.contains_key(keyword).then_some("flat"))
    }

    pub fn handles(&self, keyword: &str) -> bool {
        self.handler(keyword).is_some()
    }

    /// Run the handler for the keyword of `ctx`
    ///
    /// A failing handler leaves the current step as it was before the call.
    pub fn dispatch(&self, ctx: &mut HandlerContext<'_>) -> Result<Dispatch, InputError> {
        let Some(handler) = self.handler(ctx.keyword.name()) else {
            return Ok(Dispatch::Unrecognized);
        };

        tracing::debug!(
            keyword = ctx.keyword.name(),
            step = ctx.current_step,
            owner = self.owner(ctx.keyword.name()).unwrap_or_default(),
            "dispatching keyword"
        );

        let snapshot = ctx.state().clone();
        match handler(ctx) {
            Ok(()) => Ok(Dispatch::Handled),
            Err(err) => {
                *ctx.state() = snapshot;
                Err(classify(err, ctx))
            }
        }
    }
}

impl Default for KeywordDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KeywordDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeywordDispatcher")
            .field("domains", &self.domains.iter().map(|d| d.name()).collect::<Vec<_>>())
            .field("flat", &self.flat.len())
            .finish()
    }
}

/// Turn a handler failure into a located input error
fn classify(err: HandlerError, ctx: &HandlerContext<'_>) -> InputError {
    let location = ctx.location().clone();
    match err {
        HandlerError::Input(input) => {
            tracing::error!("{}", input);
            input
        }
        HandlerError::Internal(reason) => {
            let wrapped = InputError::with_source(
                format!("{}{}", INTERNAL_ERROR_PREFIX, reason),
                location,
                HandlerError::Internal(reason),
            );
            tracing::error!("{}", wrapped);
            wrapped
        }
        other => {
            let wrapped = InputError::with_source(other.to_string(), location, other);
            tracing::error!("{}", wrapped);
            wrapped
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ErrorGuard, ParseContext};
    use crate::deck::{DeckItem, DeckKeyword, DeckRecord};
    use crate::grid::CartesianGrid;
    use crate::logging::MessageLog;
    use crate::runspec::Runspec;
    use crate::state::StepState;
    use crate::timeline::Timeline;
    use chrono::{TimeZone, Utc};
    use std::error::Error;

    fn run(keyword: &DeckKeyword, timeline: &mut Timeline) -> Result<Dispatch, InputError> {
        let runspec = Runspec {
            num_pvt_regions: 2,
            ..Runspec::default()
        };
        let grid = CartesianGrid::new(2, 2, 2);
        let parse_context = ParseContext::default();
        let mut errors = ErrorGuard::default();
        let mut log = MessageLog::default();
        let mut ctx = HandlerContext::new(
            keyword,
            timeline,
            &runspec,
            &grid,
            &parse_context,
            &mut errors,
            &mut log,
        );
        KeywordDispatcher::new().dispatch(&mut ctx)
    }

    fn timeline() -> Timeline {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        Timeline::new(StepState::new(start, 2))
    }

    #[test]
    fn test_domains_take_priority() {
        let dispatcher = KeywordDispatcher::new();
        assert_eq!(dispatcher.owner("WELSPECS"), Some("well"));
        assert_eq!(dispatcher.owner("BRANPROP"), Some("network"));
        assert_eq!(dispatcher.owner("TUNING"), Some("flat"));
        assert_eq!(dispatcher.owner("NOSUCH"), None);
    }

    #[test]
    fn test_unrecognized_keyword() {
        let mut tl = timeline();
        let keyword = DeckKeyword::new("NOSUCH", Vec::new());
        assert_eq!(run(&keyword, &mut tl).unwrap(), Dispatch::Unrecognized);
    }

    #[test]
    fn test_input_error_passes_through() {
        let mut tl = timeline();
        let keyword = DeckKeyword::new("AQUCT", Vec::new()).at("CASE.DATA", 12);
        let err = run(&keyword, &mut tl).unwrap_err();
        assert_eq!(err.message(), "AQUCT is not supported as SCHEDULE keyword");
        assert!(!err.is_internal());
        assert!(err.source().is_none());
    }

    #[test]
    fn test_internal_error_is_marked() {
        let mut tl = timeline();
        let region = || {
            DeckRecord::default()
                .with(DeckItem::double("DRVDT_MAX", 0.1))
        };
        let keyword = DeckKeyword::new("DRVDTR", vec![region(), region(), region()]).at("CASE.DATA", 5);
        let err = run(&keyword, &mut tl).unwrap_err();
        assert!(err.is_internal());
        assert!(err.message().starts_with("Internal error: "));
        assert_eq!(err.location().lineno, 5);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_other_failures_keep_their_cause() {
        let mut tl = timeline();
        let keyword = DeckKeyword::new(
            "DRSDT",
            vec![DeckRecord::default()
                .with(DeckItem::double("DRSDT_MAX", 0.1))
                .with(DeckItem::string("OPTION", "SOMETIMES"))],
        );
        let err = run(&keyword, &mut tl).unwrap_err();
        assert!(!err.is_internal());
        assert!(err.message().contains("SOMETIMES"));
        assert!(err.source().is_some());
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_every_failure_is_logged_at_the_boundary() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::ERROR)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut tl = timeline();
            let input = DeckKeyword::new("AQUCT", Vec::new()).at("CASE.DATA", 12);
            assert!(run(&input, &mut tl).is_err());
            let region = || DeckRecord::default().with(DeckItem::double("DRVDT_MAX", 0.1));
            let internal = DeckKeyword::new("DRVDTR", vec![region(), region(), region()]);
            assert!(run(&internal, &mut tl).is_err());
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("AQUCT is not supported as SCHEDULE keyword"));
        assert!(output.contains("Internal error: "));
    }

    #[test]
    fn test_failed_keyword_leaves_step_untouched() {
        let mut tl = timeline();
        let keyword = DeckKeyword::new(
            "AQUFLUX",
            vec![
                DeckRecord::default()
                    .with(DeckItem::int("AQUIFER_ID", 1))
                    .with(DeckItem::double("FLUX", 2.0))
                    .with(DeckItem::double("SC_0", 0.0))
                    .with(DeckItem::defaulted("TEMP", None)),
                DeckRecord::default().with(DeckItem::int("AQUIFER_ID", 2)),
            ],
        );
        assert!(run(&keyword, &mut tl).is_err());
        assert!(tl.current().aquifer_flux(1).is_none());
        assert!(tl.current().events().is_empty());
    }
}
