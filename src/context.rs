//! Error policy and the per-keyword mutation context

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::deck::DeckKeyword;
use crate::error::{InputError, TimelineError};
use crate::grid::CellLookup;
use crate::logging::{LogEntry, LogLevel, MessageLog};
use crate::runspec::Runspec;
use crate::state::{SimulatorUpdate, StepState};
use crate::timeline::Timeline;
use crate::types::{KeywordLocation, UnitSystem};

/// Recoverable problems whose handling is configurable
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ErrorClass {
    /// A keyword without a handler in the SCHEDULE section
    UnsupportedScheduleKeyword,
    /// RPTRST or RPTSCHED mixing mnemonics and integers
    RptMixedStyle,
    /// RPTRST or RPTSCHED mnemonic that is not known
    RptUnknownMnemonic,
}

impl ErrorClass {
    pub const ALL: [ErrorClass; 3] = [
        ErrorClass::UnsupportedScheduleKeyword,
        ErrorClass::RptMixedStyle,
        ErrorClass::RptUnknownMnemonic,
    ];
}

/// What to do when an error class is raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Fail immediately with an input error
    Throw,
    /// Log a warning and continue
    Warn,
    /// Continue silently
    Ignore,
    /// Continue and fail once the whole section has been processed
    Delay,
}

/// Policy for recoverable input problems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseContext {
    #[serde(default)]
    actions: BTreeMap<ErrorClass, Action>,
}

impl Default for ParseContext {
    fn default() -> Self {
        Self::uniform(Action::Throw)
    }
}

impl ParseContext {
    fn uniform(action: Action) -> Self {
        Self {
            actions: ErrorClass::ALL.iter().map(|class| (*class, action)).collect(),
        }
    }

    /// Policy that warns about every recoverable problem
    pub fn permissive() -> Self {
        Self::uniform(Action::Warn)
    }

    /// Create a builder starting from the strict default
    pub fn builder() -> ParseContextBuilder {
        ParseContextBuilder::new()
    }

    /// Load a policy from JSON; classes not listed throw
    pub fn from_json(text: &str) -> Result<Self, crate::error::ConfigError> {
        let loaded: ParseContext =
            serde_json::from_str(text).map_err(|e| crate::error::ConfigError::Invalid {
                reason: e.to_string(),
            })?;
        let mut context = Self::default();
        context.actions.extend(loaded.actions);
        Ok(context)
    }

    pub fn action(&self, class: ErrorClass) -> Action {
        self.actions.get(&class).copied().unwrap_or(Action::Throw)
    }

    pub fn update(&mut self, class: ErrorClass, action: Action) {
        self.actions.insert(class, action);
    }

    /// Apply the policy for `class`
    ///
    /// `template` may use the `{keyword}`, `{file}` and `{line}`
    /// placeholders, which are filled in from `location`.
    pub fn handle_error(
        &self,
        class: ErrorClass,
        template: &str,
        location: &KeywordLocation,
        errors: &mut ErrorGuard,
    ) -> Result<(), InputError> {
        let message = InputError::format(template, location);
        match self.action(class) {
            Action::Throw => Err(InputError::new(message, location.clone())),
            Action::Warn => {
                tracing::warn!(keyword = %location.keyword, class = ?class, "{}", message);
                errors.add_warning(class, message);
                Ok(())
            }
            Action::Ignore => Ok(()),
            Action::Delay => {
                errors.add_error(class, message, location.clone());
                Ok(())
            }
        }
    }
}

/// Builder for constructing parse contexts
#[derive(Debug, Clone)]
pub struct ParseContextBuilder {
    context: ParseContext,
}

impl ParseContextBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            context: ParseContext::default(),
        }
    }

    /// Set the action for one error class
    pub fn with_action(mut self, class: ErrorClass, action: Action) -> Self {
        self.context.update(class, action);
        self
    }

    /// Set the same action for every error class
    pub fn with_all(mut self, action: Action) -> Self {
        self.context = ParseContext::uniform(action);
        self
    }

    pub fn build(self) -> ParseContext {
        self.context
    }
}

impl Default for ParseContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulated outcomes of non-throwing policy decisions
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ErrorGuard {
    warnings: Vec<(ErrorClass, String)>,
    errors: Vec<(ErrorClass, String, KeywordLocation)>,
}

impl ErrorGuard {
    pub fn add_warning(&mut self, class: ErrorClass, message: impl Into<String>) {
        self.warnings.push((class, message.into()));
    }

    pub fn add_error(&mut self, class: ErrorClass, message: impl Into<String>, location: KeywordLocation) {
        self.errors.push((class, message.into(), location));
    }

    pub fn warnings(&self) -> &[(ErrorClass, String)] {
        &self.warnings
    }

    /// Delayed errors that must fail processing at the end
    pub fn errors(&self) -> &[(ErrorClass, String, KeywordLocation)] {
        &self.errors
    }

    /// Combine the delayed errors into one input error at the first location
    pub fn delayed_error(&self) -> Option<InputError> {
        let (_, _, location) = self.errors.first()?;
        let message = self
            .errors
            .iter()
            .map(|(_, message, _)| message.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Some(InputError::new(message, location.clone()))
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn clear(&mut self) {
        self.warnings.clear();
        self.errors.clear();
    }
}

/// Everything a keyword handler may see or touch
///
/// Created for one keyword and dropped when its handler returns. Only the
/// newest report step is mutable; earlier steps are read through
/// [`HandlerContext::state_at`].
pub struct HandlerContext<'a> {
    pub keyword: &'a DeckKeyword,
    pub current_step: usize,
    pub runspec: &'a Runspec,
    pub grid: &'a dyn CellLookup,
    pub parse_context: &'a ParseContext,
    pub errors: &'a mut ErrorGuard,
    pub actionx_mode: bool,
    timeline: &'a mut Timeline,
    sim_update: Option<&'a mut SimulatorUpdate>,
    exit_code: Option<&'a mut Option<i32>>,
    log: &'a mut MessageLog,
}

impl<'a> HandlerContext<'a> {
    /// Create a new context for `keyword` acting on the newest step
    pub fn new(
        keyword: &'a DeckKeyword,
        timeline: &'a mut Timeline,
        runspec: &'a Runspec,
        grid: &'a dyn CellLookup,
        parse_context: &'a ParseContext,
        errors: &'a mut ErrorGuard,
        log: &'a mut MessageLog,
    ) -> Self {
        Self {
            keyword,
            current_step: timeline.current_step(),
            runspec,
            grid,
            parse_context,
            errors,
            actionx_mode: false,
            timeline,
            sim_update: None,
            exit_code: None,
            log,
        }
    }

    /// Collect simulator hints into `sim_update`
    pub fn with_sim_update(mut self, sim_update: &'a mut SimulatorUpdate) -> Self {
        self.sim_update = Some(sim_update);
        self
    }

    /// Run the handler as part of an ACTIONX block
    pub fn in_action(mut self, exit_code: &'a mut Option<i32>) -> Self {
        self.actionx_mode = true;
        self.exit_code = Some(exit_code);
        self
    }

    /// State of the current report step
    pub fn state(&mut self) -> &mut StepState {
        self.timeline.current_mut()
    }

    /// Read access to any earlier or the current step
    pub fn state_at(&self, report_step: usize) -> Result<&StepState, TimelineError> {
        self.timeline.at(report_step)
    }

    pub fn location(&self) -> &KeywordLocation {
        self.keyword.location()
    }

    pub fn unit_system(&self) -> UnitSystem {
        self.runspec.unit_system
    }

    /// Apply the error policy for `class` at the keyword location
    pub fn handle_error(&mut self, class: ErrorClass, template: &str) -> Result<(), InputError> {
        self.parse_context
            .handle_error(class, template, self.keyword.location(), self.errors)
    }

    /// Request a simulator exit; only honoured inside ACTIONX
    pub fn set_exit_code(&mut self, status: i32) {
        if let Some(slot) = self.exit_code.as_deref_mut() {
            *slot = Some(status);
        }
    }

    pub fn affected_well(&mut self, name: &str) {
        if let Some(update) = self.sim_update.as_deref_mut() {
            update.affected_wells.insert(name.to_string());
        }
    }

    pub fn well_structure_changed(&mut self) {
        if let Some(update) = self.sim_update.as_deref_mut() {
            update.well_structure_changed = true;
        }
    }

    pub fn tran_update(&mut self) {
        if let Some(update) = self.sim_update.as_deref_mut() {
            update.tran_update = true;
        }
    }

    pub fn welpi_well(&mut self, name: &str) {
        if let Some(update) = self.sim_update.as_deref_mut() {
            update.welpi_wells.insert(name.to_string());
        }
    }

    /// Log a message tagged with the report step and keyword location
    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        let entry = LogEntry::new(level, message)
            .at_step(self.current_step)
            .with_location(self.keyword.location().clone());
        self.log.log(entry);
    }

    pub fn note(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Note, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Warning, message);
    }
}
