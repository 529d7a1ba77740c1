//! Step stack - five ordered step groups, one per phase

use crate::core::{
    config::ClientConfig,
    error::AssemblyError,
    phase::{Phase, RelativePosition},
    step::{Step, StepEntry},
};
use serde::Serialize;
use std::sync::Arc;

/// Adds steps to an assembling stack.
///
/// Registrars receive a read-only view of the client configuration. Plain
/// functions and closures with the matching signature are registrars.
pub trait Registrar: Send + Sync {
    fn register(&self, stack: &mut Stack, config: &ClientConfig) -> Result<(), AssemblyError>;
}

impl<F> Registrar for F
where
    F: Fn(&mut Stack, &ClientConfig) -> Result<(), AssemblyError> + Send + Sync,
{
    fn register(&self, stack: &mut Stack, config: &ClientConfig) -> Result<(), AssemblyError> {
        self(stack, config)
    }
}

/// Wrap a closure as a shareable registrar
pub fn registrar<F>(f: F) -> Arc<dyn Registrar>
where
    F: Fn(&mut Stack, &ClientConfig) -> Result<(), AssemblyError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Ordered steps of a single phase
#[derive(Clone, Default)]
pub struct StepGroup {
    steps: Vec<Arc<dyn Step>>,
}

impl StepGroup {
    fn position(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id() == id)
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Step>> {
        self.steps.iter().find(|s| s.id() == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// A step's place in an assembled stack, as reported by `Stack::plan`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStep {
    pub phase: Phase,
    pub id: String,
}

/// The steps of one operation, grouped by phase
#[derive(Clone)]
pub struct Stack {
    operation: String,
    groups: [StepGroup; 5],
}

impl Stack {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            groups: Default::default(),
        }
    }

    /// Name of the operation this stack belongs to
    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn initialize(&mut self) -> PhaseMut<'_> {
        self.phase_mut(Phase::Initialize)
    }

    pub fn serialize(&mut self) -> PhaseMut<'_> {
        self.phase_mut(Phase::Serialize)
    }

    pub fn build(&mut self) -> PhaseMut<'_> {
        self.phase_mut(Phase::Build)
    }

    pub fn finalize(&mut self) -> PhaseMut<'_> {
        self.phase_mut(Phase::Finalize)
    }

    pub fn deserialize(&mut self) -> PhaseMut<'_> {
        self.phase_mut(Phase::Deserialize)
    }

    pub fn phase_mut(&mut self, phase: Phase) -> PhaseMut<'_> {
        PhaseMut { stack: self, phase }
    }

    pub fn group(&self, phase: Phase) -> &StepGroup {
        &self.groups[phase.index()]
    }

    /// Phase a step id is registered in, if any
    pub fn find(&self, id: &str) -> Option<Phase> {
        Phase::ALL
            .into_iter()
            .find(|phase| self.group(*phase).position(id).is_some())
    }

    /// Remove a step from whichever phase holds it
    pub fn remove(&mut self, id: &str) -> Result<Arc<dyn Step>, AssemblyError> {
        let phase = self.find(id).ok_or_else(|| AssemblyError::StepNotFound {
            id: id.to_string(),
        })?;
        self.phase_mut(phase).remove(id)
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(StepGroup::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Execution order of every registered step
    pub fn plan(&self) -> Vec<PlannedStep> {
        Phase::ALL
            .into_iter()
            .flat_map(|phase| {
                self.group(phase).steps.iter().map(move |step| PlannedStep {
                    phase,
                    id: step.id().to_string(),
                })
            })
            .collect()
    }

    /// Flatten into execution order
    pub fn into_entries(self) -> Vec<StepEntry> {
        let mut entries = Vec::with_capacity(self.len());
        for (phase, group) in Phase::ALL.into_iter().zip(self.groups) {
            entries.extend(group.steps.into_iter().map(|step| StepEntry { phase, step }));
        }
        entries
    }

    fn ensure_unique(&self, id: &str) -> Result<(), AssemblyError> {
        match self.find(id) {
            Some(phase) => Err(AssemblyError::DuplicateStep {
                id: id.to_string(),
                phase,
            }),
            None => Ok(()),
        }
    }
}

/// Mutable view of one phase of a stack
pub struct PhaseMut<'a> {
    stack: &'a mut Stack,
    phase: Phase,
}

impl PhaseMut<'_> {
    fn group(&mut self) -> &mut StepGroup {
        &mut self.stack.groups[self.phase.index()]
    }

    /// Add a step at the front (`Before`) or back (`After`) of the phase
    pub fn add<S: Step + 'static>(
        &mut self,
        step: S,
        position: RelativePosition,
    ) -> Result<(), AssemblyError> {
        self.stack.ensure_unique(step.id())?;
        let group = self.group();
        match position {
            RelativePosition::Before => group.steps.insert(0, Arc::new(step)),
            RelativePosition::After => group.steps.push(Arc::new(step)),
        }
        Ok(())
    }

    /// Insert a step immediately before or after an anchor in the same phase
    pub fn insert<S: Step + 'static>(
        &mut self,
        step: S,
        anchor: &str,
        position: RelativePosition,
    ) -> Result<(), AssemblyError> {
        self.stack.ensure_unique(step.id())?;
        let phase = self.phase;
        let group = self.group();
        let index = group
            .position(anchor)
            .ok_or_else(|| AssemblyError::UnknownAnchor {
                anchor: anchor.to_string(),
                phase,
            })?;
        let index = match position {
            RelativePosition::Before => index,
            RelativePosition::After => index + 1,
        };
        group.steps.insert(index, Arc::new(step));
        Ok(())
    }

    /// Replace a step in place, returning the one it replaced
    pub fn swap<S: Step + 'static>(
        &mut self,
        id: &str,
        step: S,
    ) -> Result<Arc<dyn Step>, AssemblyError> {
        if step.id() != id {
            self.stack.ensure_unique(step.id())?;
        }
        let group = self.group();
        let index = group.position(id).ok_or_else(|| AssemblyError::StepNotFound {
            id: id.to_string(),
        })?;
        Ok(std::mem::replace(&mut group.steps[index], Arc::new(step)))
    }

    pub fn remove(&mut self, id: &str) -> Result<Arc<dyn Step>, AssemblyError> {
        let group = self.group();
        let index = group.position(id).ok_or_else(|| AssemblyError::StepNotFound {
            id: id.to_string(),
        })?;
        Ok(group.steps.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Step>> {
        self.stack.group(self.phase).get(id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.stack.group(self.phase).ids()
    }
}
