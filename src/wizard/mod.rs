//! Step-wise wizard engine
//!
//! A linear state machine over an ordered step configuration. Each step
//! validates its own form data before the wizard moves forward; a step may be
//! skipped only when it is optional and the configuration allows skipping.
//! Used by seller onboarding and by step-wise product creation.

pub mod steps;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::validation::{RuleSet, ValidationErrors};

/// One configured step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepConfig {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default = "default_true")]
    pub is_required: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl StepConfig {
    pub fn new(key: impl Into<String>, title: impl Into<String>, position: i32, is_required: bool) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            description: None,
            position,
            is_required,
            is_active: true,
        }
    }
}

/// Source of per-step validation rules.
pub trait StepRules: Send + Sync {
    fn rules_for(&self, step_key: &str) -> RuleSet;
}

#[derive(Debug, Error, PartialEq)]
pub enum WizardError {
    #[error("no active steps are configured")]
    NoSteps,

    #[error("the wizard is already complete")]
    AlreadyComplete,

    #[error("step '{0}' has invalid fields")]
    Invalid(String, ValidationErrors),

    #[error("step '{0}' cannot be skipped")]
    SkipNotAllowed(String),

    #[error("already at the first step")]
    AtFirstStep,

    #[error("unknown step '{0}'")]
    UnknownStep(String),

    #[error("step '{0}' is not reachable yet")]
    OutOfOrder(String),
}

impl WizardError {
    /// Field errors carried by a failed validation, if any.
    pub fn field_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Invalid(_, errors) => Some(errors),
            _ => None,
        }
    }
}

/// Result of a successful forward move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Moved on to the step with this key
    Next(String),
    /// The last step was passed
    Completed,
}

pub struct Wizard<R: StepRules> {
    steps: Vec<StepConfig>,
    allow_skipping: bool,
    rules: R,
    current: usize,
    completed: BTreeSet<String>,
    skipped: BTreeSet<String>,
    data: BTreeMap<String, Value>,
}

impl<R: StepRules> Wizard<R> {
    /// Build a wizard from configuration. Inactive steps are dropped and the
    /// remainder ordered by position.
    pub fn new(steps: Vec<StepConfig>, allow_skipping: bool, rules: R) -> Result<Self, WizardError> {
        let mut steps: Vec<StepConfig> = steps.into_iter().filter(|s| s.is_active).collect();
        if steps.is_empty() {
            return Err(WizardError::NoSteps);
        }
        steps.sort_by_key(|s| s.position);

        Ok(Self {
            steps,
            allow_skipping,
            rules,
            current: 0,
            completed: BTreeSet::new(),
            skipped: BTreeSet::new(),
            data: BTreeMap::new(),
        })
    }

    /// Rebuild a wizard from persisted progress, positioned at the first step
    /// that is neither completed nor skipped.
    pub fn resume<I, J>(
        steps: Vec<StepConfig>,
        allow_skipping: bool,
        rules: R,
        completed: I,
        skipped: J,
    ) -> Result<Self, WizardError>
    where
        I: IntoIterator<Item = String>,
        J: IntoIterator<Item = String>,
    {
        let mut wizard = Self::new(steps, allow_skipping, rules)?;
        wizard.completed = completed.into_iter().collect();
        wizard.skipped = skipped.into_iter().collect();
        wizard.current = wizard
            .steps
            .iter()
            .position(|s| !wizard.completed.contains(&s.key) && !wizard.skipped.contains(&s.key))
            .unwrap_or(wizard.steps.len());
        Ok(wizard)
    }

    pub fn steps(&self) -> &[StepConfig] {
        &self.steps
    }

    pub fn allow_skipping(&self) -> bool {
        self.allow_skipping
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The step awaiting input, or `None` once every step is passed.
    pub fn current_step(&self) -> Option<&StepConfig> {
        self.steps.get(self.current)
    }

    pub fn is_complete(&self) -> bool {
        self.current >= self.steps.len()
    }

    pub fn completed_steps(&self) -> impl Iterator<Item = &str> {
        self.completed.iter().map(String::as_str)
    }

    pub fn skipped_steps(&self) -> impl Iterator<Item = &str> {
        self.skipped.iter().map(String::as_str)
    }

    /// Percentage of steps passed, rounded down.
    pub fn progress_percent(&self) -> u8 {
        let passed = self.current.min(self.steps.len());
        ((passed * 100) / self.steps.len()) as u8
    }

    /// Skipping needs an optional step and a configuration that allows it.
    pub fn can_skip(&self) -> bool {
        self.allow_skipping && self.current_step().map(|s| !s.is_required).unwrap_or(false)
    }

    /// Validate a step's data without moving.
    pub fn validate_step(&self, key: &str, data: &Value) -> Result<(), WizardError> {
        if !self.steps.iter().any(|s| s.key == key) {
            return Err(WizardError::UnknownStep(key.to_string()));
        }
        self.rules
            .rules_for(key)
            .validate(data)
            .map_err(|errors| WizardError::Invalid(key.to_string(), errors))
    }

    /// Validate the current step and move forward on success.
    pub fn advance(&mut self, data: Value) -> Result<StepOutcome, WizardError> {
        let key = self
            .current_step()
            .map(|s| s.key.clone())
            .ok_or(WizardError::AlreadyComplete)?;

        self.validate_step(&key, &data)?;

        self.skipped.remove(&key);
        self.completed.insert(key.clone());
        self.data.insert(key, data);
        self.current += 1;

        Ok(self.outcome())
    }

    /// Submit data for a step by key. The current step advances; an earlier
    /// passed step is re-validated in place; later steps are refused.
    pub fn submit_step(&mut self, key: &str, data: Value) -> Result<StepOutcome, WizardError> {
        let index = self
            .steps
            .iter()
            .position(|s| s.key == key)
            .ok_or_else(|| WizardError::UnknownStep(key.to_string()))?;

        if index == self.current {
            return self.advance(data);
        }
        if index > self.current {
            return Err(WizardError::OutOfOrder(key.to_string()));
        }

        self.validate_step(key, &data)?;
        self.skipped.remove(key);
        self.completed.insert(key.to_string());
        self.data.insert(key.to_string(), data);
        Ok(self.outcome())
    }

    /// Skip the current step when allowed.
    pub fn skip(&mut self) -> Result<StepOutcome, WizardError> {
        let step = self.current_step().ok_or(WizardError::AlreadyComplete)?;
        if !self.can_skip() {
            return Err(WizardError::SkipNotAllowed(step.key.clone()));
        }

        let key = step.key.clone();
        self.skipped.insert(key);
        self.current += 1;
        Ok(self.outcome())
    }

    /// Step back to the previous step. Collected data is kept.
    pub fn back(&mut self) -> Result<&StepConfig, WizardError> {
        if self.current == 0 {
            return Err(WizardError::AtFirstStep);
        }
        self.current -= 1;
        self.steps.get(self.current).ok_or(WizardError::NoSteps)
    }

    /// Data collected for a step.
    pub fn step_data(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// All collected step data merged into one form, later steps winning.
    pub fn merged_data(&self) -> Value {
        let mut merged = Map::new();
        for step in &self.steps {
            if let Some(Value::Object(fields)) = self.data.get(&step.key) {
                for (k, v) in fields {
                    merged.insert(k.clone(), v.clone());
                }
            }
        }
        Value::Object(merged)
    }

    /// Required steps that have not been completed. Optional steps never block.
    pub fn missing_required(&self) -> Vec<&StepConfig> {
        self.steps
            .iter()
            .filter(|s| s.is_required && !self.completed.contains(&s.key))
            .collect()
    }

    fn outcome(&self) -> StepOutcome {
        match self.current_step() {
            Some(step) => StepOutcome::Next(step.key.clone()),
            None => StepOutcome::Completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::FieldRules;
    use serde_json::json;

    struct TestRules;

    impl StepRules for TestRules {
        fn rules_for(&self, step_key: &str) -> RuleSet {
            match step_key {
                "one" => RuleSet::new().field(FieldRules::new("name", "Name").required()),
                "two" => RuleSet::new().field(FieldRules::new("notes", "Notes").max_length(5)),
                "three" => RuleSet::new().field(FieldRules::new("agree", "Agreement").required()),
                _ => RuleSet::new(),
            }
        }
    }

    fn steps() -> Vec<StepConfig> {
        vec![
            StepConfig::new("three", "Three", 3, true),
            StepConfig::new("one", "One", 1, true),
            StepConfig::new("two", "Two", 2, false),
        ]
    }

    #[test]
    fn steps_are_ordered_and_inactive_dropped() {
        let mut config = steps();
        config.push(StepConfig {
            is_active: false,
            ..StepConfig::new("hidden", "Hidden", 0, true)
        });
        let wizard = Wizard::new(config, true, TestRules).unwrap();

        let keys: Vec<&str> = wizard.steps().iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["one", "two", "three"]);
    }

    #[test]
    fn no_active_steps_is_an_error() {
        let result = Wizard::new(Vec::new(), true, TestRules);
        assert!(matches!(result, Err(WizardError::NoSteps)));
    }

    #[test]
    fn cannot_advance_with_missing_required_fields() {
        let mut wizard = Wizard::new(steps(), true, TestRules).unwrap();

        let err = wizard.advance(json!({})).unwrap_err();
        assert!(err.field_errors().unwrap().contains("name"));
        assert_eq!(wizard.current_index(), 0);

        let outcome = wizard.advance(json!({"name": "Shop"})).unwrap();
        assert_eq!(outcome, StepOutcome::Next("two".into()));
    }

    #[test]
    fn skip_requires_optional_step_and_global_flag() {
        let mut wizard = Wizard::new(steps(), true, TestRules).unwrap();
        assert_eq!(
            wizard.skip().unwrap_err(),
            WizardError::SkipNotAllowed("one".into())
        );

        wizard.advance(json!({"name": "Shop"})).unwrap();
        assert!(wizard.can_skip());
        assert_eq!(wizard.skip().unwrap(), StepOutcome::Next("three".into()));
        assert_eq!(wizard.skipped_steps().collect::<Vec<_>>(), vec!["two"]);

        let mut strict = Wizard::new(steps(), false, TestRules).unwrap();
        strict.advance(json!({"name": "Shop"})).unwrap();
        assert!(!strict.can_skip());
        assert!(strict.skip().is_err());
        assert_eq!(strict.current_step().unwrap().key, "two");
    }

    #[test]
    fn completes_after_last_step() {
        let mut wizard = Wizard::new(steps(), true, TestRules).unwrap();
        wizard.advance(json!({"name": "Shop"})).unwrap();
        wizard.advance(json!({"notes": "ok"})).unwrap();
        assert_eq!(wizard.progress_percent(), 66);

        assert_eq!(
            wizard.advance(json!({"agree": true})).unwrap(),
            StepOutcome::Completed
        );
        assert!(wizard.is_complete());
        assert_eq!(wizard.progress_percent(), 100);
        assert_eq!(wizard.advance(json!({})), Err(WizardError::AlreadyComplete));
        assert_eq!(wizard.merged_data()["name"], "Shop");
    }

    #[test]
    fn back_keeps_data() {
        let mut wizard = Wizard::new(steps(), true, TestRules).unwrap();
        assert_eq!(wizard.back().unwrap_err(), WizardError::AtFirstStep);

        wizard.advance(json!({"name": "Shop"})).unwrap();
        assert_eq!(wizard.back().unwrap().key, "one");
        assert_eq!(wizard.step_data("one").unwrap()["name"], "Shop");
    }

    #[test]
    fn resume_positions_after_progress() {
        let wizard = Wizard::resume(
            steps(),
            true,
            TestRules,
            vec!["one".to_string()],
            vec!["two".to_string()],
        )
        .unwrap();

        assert_eq!(wizard.current_step().unwrap().key, "three");
        assert_eq!(wizard.missing_required().len(), 1);
    }

    #[test]
    fn submit_step_enforces_order() {
        let mut wizard = Wizard::new(steps(), true, TestRules).unwrap();

        assert_eq!(
            wizard.submit_step("three", json!({"agree": true})),
            Err(WizardError::OutOfOrder("three".into()))
        );
        wizard.submit_step("one", json!({"name": "Shop"})).unwrap();

        // editing an earlier step keeps the position
        let outcome = wizard.submit_step("one", json!({"name": "Renamed"})).unwrap();
        assert_eq!(outcome, StepOutcome::Next("two".into()));
        assert_eq!(wizard.step_data("one").unwrap()["name"], "Renamed");

        assert!(matches!(
            wizard.submit_step("nope", json!({})),
            Err(WizardError::UnknownStep(_))
        ));
    }
}
