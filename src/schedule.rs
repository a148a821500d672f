//! Schedule section engine with builder pattern
//!
//! The engine walks the keyword stream of a SCHEDULE section in order.
//! `DATES` and `TSTEP` open new report steps, `END` stops processing and
//! every other keyword goes through the [`KeywordDispatcher`].

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use rayon::prelude::*;

use crate::context::{ErrorClass, ErrorGuard, HandlerContext, ParseContext};
use crate::deck::{Deck, DeckKeyword, DeckRecord};
use crate::dispatch::{Dispatch, KeywordDispatcher};
use crate::error::{ConfigError, InputError, LookupError, ScheduleError};
use crate::events::ScheduleEvents;
use crate::grid::CellLookup;
use crate::logging::{LogLevel, MessageLog};
use crate::rst_config::RstConfig;
use crate::runspec::Runspec;
use crate::state::{SimulatorUpdate, StepState};
use crate::timeline::Timeline;
use crate::types::StateHash;

const UNSUPPORTED_KEYWORD: &str =
    "Keyword {keyword} is not supported in the SCHEDULE section\nIn {file} line {line}";

/// Interpreted schedule: one state per report step plus the collected log
pub struct Schedule {
    runspec: Runspec,
    grid: Arc<dyn CellLookup>,
    parse_context: ParseContext,
    dispatcher: KeywordDispatcher,
    timeline: Timeline,
    log: MessageLog,
    errors: ErrorGuard,
    exit_code: Option<i32>,
}

impl Schedule {
    /// Create a builder for constructing a schedule
    pub fn builder() -> ScheduleBuilder {
        ScheduleBuilder::new()
    }

    /// Process the keywords of a SCHEDULE section in order
    ///
    /// Processing stops at the first fatal error. Errors whose policy is
    /// [`crate::context::Action::Delay`] fail the call once every keyword
    /// has been seen.
    pub fn process(&mut self, deck: &Deck) -> Result<(), ScheduleError> {
        for keyword in deck.keywords() {
            match keyword.name() {
                "DATES" => self.handle_dates(keyword)?,
                "TSTEP" => self.handle_tstep(keyword)?,
                "END" => break,
                _ => self.handle_keyword(keyword)?,
            }
        }
        match self.errors.delayed_error() {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    fn handle_keyword(&mut self, keyword: &DeckKeyword) -> Result<(), ScheduleError> {
        let mut ctx = HandlerContext::new(
            keyword,
            &mut self.timeline,
            &self.runspec,
            self.grid.as_ref(),
            &self.parse_context,
            &mut self.errors,
            &mut self.log,
        );
        if self.dispatcher.dispatch(&mut ctx)? == Dispatch::Unrecognized {
            ctx.handle_error(ErrorClass::UnsupportedScheduleKeyword, UNSUPPORTED_KEYWORD)?;
        }
        Ok(())
    }

    fn handle_dates(&mut self, keyword: &DeckKeyword) -> Result<(), ScheduleError> {
        for record in keyword.records() {
            let date = parse_date(record, keyword)?;
            let current = self.timeline.current().start_time();
            if date < current {
                return Err(InputError::new(
                    format!("DATES {} is before the current report step at {}", date, current),
                    keyword.location().clone(),
                )
                .into());
            }
            if date == current {
                tracing::debug!(%date, "DATES repeats the current report step");
                continue;
            }
            self.new_step(date);
        }
        Ok(())
    }

    fn handle_tstep(&mut self, keyword: &DeckKeyword) -> Result<(), ScheduleError> {
        for record in keyword.records() {
            let steps = record
                .item("STEP_SIZE")
                .and_then(|item| item.get_si_double_data())
                .map_err(|e| InputError::with_source(e.to_string(), keyword.location().clone(), e))?;
            for seconds in steps {
                if seconds.is_nan() || seconds <= 0.0 {
                    return Err(InputError::new(
                        format!("TSTEP length must be positive, got {}", seconds),
                        keyword.location().clone(),
                    )
                    .into());
                }
                let next = Duration::try_milliseconds((seconds * 1000.0).round() as i64)
                    .and_then(|length| self.timeline.current().start_time().checked_add_signed(length))
                    .ok_or_else(|| {
                        InputError::new(
                            format!("TSTEP length of {} seconds moves past the last representable date", seconds),
                            keyword.location().clone(),
                        )
                    })?;
                self.new_step(next);
            }
        }
        Ok(())
    }

    fn new_step(&mut self, start: DateTime<Utc>) {
        let step = self.timeline.append_step(start);
        tracing::debug!(step, %start, "report step started");
    }

    /// Run the keywords of an ACTIONX block on report step `report_step`
    ///
    /// Only the newest step can be modified. Hints for the simulator are
    /// returned; an EXIT keyword is recorded in [`Schedule::exit_code`].
    pub fn apply_action(
        &mut self,
        report_step: usize,
        keywords: &[DeckKeyword],
    ) -> Result<SimulatorUpdate, ScheduleError> {
        self.timeline.at_mut(report_step)?;
        let mut update = SimulatorUpdate::default();
        for keyword in keywords {
            let mut ctx = HandlerContext::new(
                keyword,
                &mut self.timeline,
                &self.runspec,
                self.grid.as_ref(),
                &self.parse_context,
                &mut self.errors,
                &mut self.log,
            )
            .with_sim_update(&mut update)
            .in_action(&mut self.exit_code);
            if self.dispatcher.dispatch(&mut ctx)? == Dispatch::Unrecognized {
                ctx.handle_error(ErrorClass::UnsupportedScheduleKeyword, UNSUPPORTED_KEYWORD)?;
            }
        }
        Ok(update)
    }

    /// Scale the WELPI connections of a well to the requested productivity
    ///
    /// `measured_pi` is the productivity index the simulator computed for
    /// the unscaled connections. Returns the number of scaled connections.
    pub fn apply_well_pi(
        &mut self,
        report_step: usize,
        well_name: &str,
        measured_pi: f64,
    ) -> Result<usize, ScheduleError> {
        let state = self.timeline.at_mut(report_step)?;
        let well = state
            .well_mut(well_name)
            .ok_or_else(|| LookupError::new("well", well_name))?;
        let Some(target) = well.productivity_index() else {
            return Ok(0);
        };
        if measured_pi == 0.0 {
            return Err(ConfigError::Invalid {
                reason: format!("well {} has zero measured productivity", well_name),
            }
            .into());
        }
        let scaled = well.connections_mut().apply_well_pi_scaling(target / measured_pi);
        if scaled > 0 {
            state.add_event(ScheduleEvents::CompletionChange);
        }
        Ok(scaled)
    }

    pub fn runspec(&self) -> &Runspec {
        &self.runspec
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Mutable access for checkpoint restore
    pub fn timeline_mut(&mut self) -> &mut Timeline {
        &mut self.timeline
    }

    pub fn into_timeline(self) -> Timeline {
        self.timeline
    }

    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    pub fn state(&self, report_step: usize) -> Result<&StepState, ScheduleError> {
        Ok(self.timeline.at(report_step)?)
    }

    pub fn hash(&self, report_step: usize) -> Result<StateHash, ScheduleError> {
        Ok(self.timeline.hash(report_step)?)
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Policy warnings collected so far
    pub fn warnings(&self) -> &[(ErrorClass, String)] {
        self.errors.warnings()
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }
}

impl std::fmt::Debug for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schedule")
            .field("runspec", &self.runspec)
            .field("steps", &self.timeline.len())
            .field("exit_code", &self.exit_code)
            .finish()
    }
}

/// Builder for constructing schedules with a fluent API
#[derive(Clone)]
pub struct ScheduleBuilder {
    runspec: Runspec,
    grid: Option<Arc<dyn CellLookup>>,
    parse_context: ParseContext,
    start: Option<DateTime<Utc>>,
    rst_config: Option<RstConfig>,
    log_level: LogLevel,
}

impl ScheduleBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            runspec: Runspec::default(),
            grid: None,
            parse_context: ParseContext::default(),
            start: None,
            rst_config: None,
            log_level: LogLevel::Note,
        }
    }

    pub fn with_runspec(mut self, runspec: Runspec) -> Self {
        self.runspec = runspec;
        self
    }

    /// Set the grid used for connection geometry
    pub fn with_grid(mut self, grid: Arc<dyn CellLookup>) -> Self {
        self.grid = Some(grid);
        self
    }

    pub fn with_parse_context(mut self, parse_context: ParseContext) -> Self {
        self.parse_context = parse_context;
        self
    }

    /// Set the start of the first report step
    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    /// Use the restart configuration of the SOLUTION section
    pub fn with_rst_config(mut self, solution: RstConfig) -> Self {
        self.rst_config = Some(solution);
        self
    }

    /// Minimum level of the collected message log
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Build an empty schedule holding only the first report step
    pub fn build_empty(self) -> Result<Schedule, ScheduleError> {
        self.runspec.validate()?;
        let start = self.start.ok_or(ConfigError::Missing { what: "start date" })?;
        let grid = self.grid.ok_or(ConfigError::Missing { what: "grid" })?;

        let mut rst_config = match self.rst_config {
            Some(solution) => RstConfig::first(&solution),
            None => RstConfig::default(),
        };
        rst_config.compositional = self.runspec.compositional;
        let initial = StepState::new(start, self.runspec.num_pvt_regions).with_rst_config(rst_config);

        Ok(Schedule {
            runspec: self.runspec,
            grid,
            parse_context: self.parse_context,
            dispatcher: KeywordDispatcher::new(),
            timeline: Timeline::new(initial),
            log: MessageLog::new(self.log_level),
            errors: ErrorGuard::default(),
            exit_code: None,
        })
    }

    /// Build a schedule and process `deck` into it
    pub fn build(self, deck: &Deck) -> Result<Schedule, ScheduleError> {
        let mut schedule = self.build_empty()?;
        schedule.process(deck)?;
        Ok(schedule)
    }

    /// Build independent schedules in parallel, one per deck
    ///
    /// Every deck gets its own timeline; only the grid is shared.
    pub fn build_independent(&self, decks: &[Deck]) -> Vec<Result<Schedule, ScheduleError>> {
        decks.par_iter().map(|deck| self.clone().build(deck)).collect()
    }
}

impl Default for ScheduleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_month(name: &str) -> Option<u32> {
    let month = match name.to_uppercase().as_str() {
        "JAN" => 1,
        "FEB" => 2,
        "MAR" => 3,
        "APR" => 4,
        "MAY" => 5,
        "JUN" => 6,
        "JUL" | "JLY" => 7,
        "AUG" => 8,
        "SEP" => 9,
        "OCT" => 10,
        "NOV" => 11,
        "DEC" => 12,
        _ => return None,
    };
    Some(month)
}

/// Date of one DATES record: `DAY MONTH YEAR [HH:MM:SS]`
fn parse_date(record: &DeckRecord, keyword: &DeckKeyword) -> Result<DateTime<Utc>, InputError> {
    let location = keyword.location();
    let wrap = |e: crate::error::DeckError| InputError::with_source(e.to_string(), location.clone(), e);

    let day = record.item("DAY").and_then(|item| item.get_int(0)).map_err(wrap)?;
    let month_name = record.item("MONTH").and_then(|item| item.get_string(0)).map_err(wrap)?;
    let year = record.item("YEAR").and_then(|item| item.get_int(0)).map_err(wrap)?;
    let time = match record.item("TIME") {
        Ok(item) if item.has_value(0) => {
            let text = item.get_string(0).map_err(wrap)?;
            NaiveTime::parse_from_str(&text, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(&text, "%H:%M:%S%.f"))
                .map_err(|e| {
                    InputError::with_source(format!("Invalid time '{}' in DATES", text), location.clone(), e)
                })?
        }
        _ => NaiveTime::MIN,
    };

    let invalid = || {
        InputError::new(
            format!("Invalid date {} {} {} in DATES", day, month_name, year),
            location.clone(),
        )
    };
    let month = parse_month(&month_name).ok_or_else(invalid)?;
    let day = u32::try_from(day).map_err(|_| invalid())?;
    let date = Utc
        .with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .ok_or_else(invalid)?;
    Ok(date + (time - NaiveTime::MIN))
}
