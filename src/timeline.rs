//! Ordered report step states with checkpoints and hashing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ScheduleError, TimelineError};
use crate::events::Events;
use crate::hasher::StateHasher;
use crate::serialization::{pack, unpack};
use crate::state::{StateSection, StepState};
use crate::types::StateHash;

/// Packed copy of one report step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub report_step: usize,
    pub hash: StateHash,
    pub data: Vec<u8>,
}

/// Difference between two report steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDiff {
    pub from_step: usize,
    pub to_step: usize,
    pub from_hash: StateHash,
    pub to_hash: StateHash,
    pub changed: Vec<StateSection>,
}

/// Gap free, append only sequence of report step states
///
/// Only the newest step may be modified.
#[derive(Debug, Clone)]
pub struct Timeline {
    steps: Vec<StepState>,
    /// Running chain hash through each step that is no longer the newest
    sealed_chain: Vec<StateHash>,
    hasher: StateHasher,
}

impl Timeline {
    /// Create a new timeline holding the first report step
    pub fn new(initial: StepState) -> Self {
        Self {
            steps: vec![initial],
            sealed_chain: Vec::new(),
            hasher: StateHasher::new(),
        }
    }

    /// Start a new report step as a copy of the current one
    pub fn append_step(&mut self, start_time: DateTime<Utc>) -> usize {
        let sealed = self.chain_through_current();
        self.sealed_chain.push(sealed);
        let next = self.current().next_step(start_time);
        self.steps.push(next);
        self.steps.len() - 1
    }

    /// Index of the newest report step
    pub fn current_step(&self) -> usize {
        self.steps.len() - 1
    }

    pub fn current(&self) -> &StepState {
        &self.steps[self.steps.len() - 1]
    }

    pub fn current_mut(&mut self) -> &mut StepState {
        let last = self.steps.len() - 1;
        &mut self.steps[last]
    }

    /// State of report step `index`
    pub fn at(&self, index: usize) -> Result<&StepState, TimelineError> {
        self.steps.get(index).ok_or(TimelineError::OutOfRange {
            index,
            len: self.steps.len(),
        })
    }

    /// Mutable state of report step `index`, which must be the newest
    pub fn at_mut(&mut self, index: usize) -> Result<&mut StepState, TimelineError> {
        let current = self.current_step();
        if index > current {
            return Err(TimelineError::OutOfRange {
                index,
                len: self.steps.len(),
            });
        }
        if index != current {
            return Err(TimelineError::NotCurrent {
                requested: index,
                current,
            });
        }
        Ok(self.current_mut())
    }

    pub fn events(&self, index: usize) -> Result<&Events, TimelineError> {
        Ok(self.at(index)?.events())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepState> {
        self.steps.iter()
    }

    /// Hash of report step `index`
    pub fn hash(&self, index: usize) -> Result<StateHash, TimelineError> {
        Ok(self.hasher.hash(self.at(index)?))
    }

    /// Chain hash over all steps in order
    ///
    /// Older steps are immutable, so only the newest step is hashed here.
    pub fn hash_chain(&self) -> StateHash {
        self.chain_through_current()
    }

    fn chain_through_current(&self) -> StateHash {
        let previous = match self.sealed_chain.last() {
            Some(chain) => *chain,
            None => self.hasher.hash_chain(&[]),
        };
        self.hasher.extend_chain(&previous, &self.hasher.hash(self.current()))
    }

    /// Pack report step `index` together with its hash
    pub fn checkpoint(&self, index: usize) -> Result<Checkpoint, TimelineError> {
        let state = self.at(index)?;
        Ok(Checkpoint {
            report_step: index,
            hash: self.hasher.hash(state),
            data: pack(state),
        })
    }

    /// Replace the newest step by a checkpointed state
    ///
    /// Steps after the checkpoint are dropped; the packed data must reproduce
    /// the recorded hash.
    pub fn restore(&mut self, checkpoint: &Checkpoint) -> Result<(), ScheduleError> {
        if checkpoint.report_step >= self.steps.len() {
            return Err(TimelineError::OutOfRange {
                index: checkpoint.report_step,
                len: self.steps.len(),
            }
            .into());
        }

        let state: StepState = unpack(&checkpoint.data)?;
        let computed = self.hasher.hash(&state);
        if computed != checkpoint.hash {
            return Err(TimelineError::HashMismatch {
                step: checkpoint.report_step,
                expected: checkpoint.hash.to_string(),
                actual: computed.to_string(),
            }
            .into());
        }

        self.steps.truncate(checkpoint.report_step);
        self.sealed_chain.truncate(checkpoint.report_step);
        self.steps.push(state);
        tracing::debug!(step = checkpoint.report_step, hash = %computed, "restored checkpoint");
        Ok(())
    }

    /// Sections that changed between two steps
    pub fn diff(&self, from: usize, to: usize) -> Result<StepDiff, TimelineError> {
        let from_state = self.at(from)?;
        let to_state = self.at(to)?;
        Ok(StepDiff {
            from_step: from,
            to_step: to,
            from_hash: self.hasher.hash(from_state),
            to_hash: self.hasher.hash(to_state),
            changed: to_state.changed_sections(from_state),
        })
    }

    /// Consume the timeline, returning its steps
    pub fn into_steps(self) -> Vec<StepState> {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ScheduleEvents;
    use chrono::TimeZone;

    fn timeline() -> Timeline {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        Timeline::new(StepState::new(start, 1))
    }

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::days(n)
    }

    #[test]
    fn test_append_and_access() {
        let mut tl = timeline();
        assert_eq!(tl.append_step(day(1)), 1);
        assert_eq!(tl.len(), 2);
        assert_eq!(tl.current().start_time(), day(1));
        assert!(tl.at(1).is_ok());
        assert_eq!(
            tl.at(2).unwrap_err(),
            TimelineError::OutOfRange { index: 2, len: 2 }
        );
    }

    #[test]
    fn test_only_newest_step_is_mutable() {
        let mut tl = timeline();
        tl.append_step(day(1));
        assert!(tl.at_mut(1).is_ok());
        assert_eq!(
            tl.at_mut(0).unwrap_err(),
            TimelineError::NotCurrent { requested: 0, current: 1 }
        );
    }

    #[test]
    fn test_events_are_per_step() {
        let mut tl = timeline();
        tl.current_mut().add_event(ScheduleEvents::NewWell);
        tl.append_step(day(1));
        assert!(tl.events(0).unwrap().has_event(ScheduleEvents::NewWell));
        assert!(tl.events(1).unwrap().is_empty());
    }

    #[test]
    fn test_checkpoint_and_restore() {
        let mut tl = timeline();
        tl.current_mut().set_nupcol(4);
        let checkpoint = tl.checkpoint(0).unwrap();

        tl.current_mut().set_nupcol(8);
        tl.append_step(day(1));
        tl.restore(&checkpoint).unwrap();

        assert_eq!(tl.len(), 1);
        assert_eq!(tl.current().nupcol(), 4);
        assert_eq!(tl.hash(0).unwrap(), checkpoint.hash);
    }

    #[test]
    fn test_restore_rejects_tampered_checkpoint() {
        let mut tl = timeline();
        let mut checkpoint = tl.checkpoint(0).unwrap();
        checkpoint.hash = StateHash([0; 32]);
        assert!(matches!(
            tl.restore(&checkpoint),
            Err(ScheduleError::Timeline(TimelineError::HashMismatch { .. }))
        ));
    }

    #[test]
    fn test_diff() {
        let mut tl = timeline();
        tl.append_step(day(1));
        tl.current_mut().set_rptonly(true);
        let diff = tl.diff(0, 1).unwrap();
        assert_eq!(diff.changed, vec![StateSection::StartTime, StateSection::Rptonly]);
        assert_ne!(diff.from_hash, diff.to_hash);
    }

    #[test]
    fn test_running_chain_matches_full_rehash() {
        let mut tl = timeline();
        tl.current_mut().set_nupcol(4);
        tl.append_step(day(1));
        tl.current_mut().set_nupcol(9);
        tl.append_step(day(2));

        let hasher = StateHasher::new();
        let expected = tl.iter().fold(hasher.hash_chain(&[]), |chain, state| {
            hasher.extend_chain(&chain, &hasher.hash(state))
        });
        assert_eq!(tl.hash_chain(), expected);

        let checkpoint = tl.checkpoint(1).unwrap();
        tl.restore(&checkpoint).unwrap();
        let expected = tl.iter().fold(hasher.hash_chain(&[]), |chain, state| {
            hasher.extend_chain(&chain, &hasher.hash(state))
        });
        assert_eq!(tl.hash_chain(), expected);
    }

    #[test]
    fn test_hash_chain_changes_with_steps() {
        let mut tl = timeline();
        let before = tl.hash_chain();
        tl.append_step(day(1));
        assert_ne!(before, tl.hash_chain());
    }
}
