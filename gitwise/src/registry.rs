//! Step registry: id to step definition.

use std::collections::HashMap;

use anyhow::{Result, bail};
use tracing::warn;

use crate::core::context::StepInfo;
use crate::step::Step;

#[derive(Default)]
pub struct StepRegistry {
    steps: HashMap<String, Box<dyn Step>>,
    order: Vec<String>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `step` under its id, returning the definition it replaced.
    pub fn register(&mut self, step: Box<dyn Step>) -> Result<Option<Box<dyn Step>>> {
        let id = step.id().to_string();
        if id.trim().is_empty() {
            bail!("step id must be non-empty");
        }
        let previous = self.steps.insert(id.clone(), step);
        if previous.is_some() {
            warn!(step_id = %id, "step re-registered, last registration wins");
        } else {
            self.order.push(id);
        }
        Ok(previous)
    }

    pub fn lookup(&self, id: &str) -> Option<&dyn Step> {
        self.steps.get(id).map(|step| step.as_ref())
    }

    /// Registered steps in first-registration order.
    pub fn catalog(&self) -> Vec<StepInfo> {
        self.order
            .iter()
            .filter_map(|id| self.lookup(id))
            .map(|step| step.info())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
