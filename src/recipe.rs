//! Cleaning recipes: an ordered list of steps loaded from YAML.
//!
//! ```yaml
//! - trim
//! - dedupe
//! - replace:
//!     column: city
//!     find: NY
//!     replace: New York
//!     match_case: true
//! - lowercase
//! ```

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::{history::Workspace, replace::FindReplace, transform::QuickAction};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Trim,
    Dedupe,
    Lowercase,
    Replace(FindReplace),
}

impl Step {
    pub fn describe(&self) -> String {
        match self {
            Step::Trim => QuickAction::Trim.label().to_string(),
            Step::Dedupe => QuickAction::Dedupe.label().to_string(),
            Step::Lowercase => QuickAction::Lowercase.label().to_string(),
            Step::Replace(spec) => spec.describe(),
        }
    }

    /// Applies the step to the workspace's current rows and records a snapshot.
    pub fn run(&self, workspace: &mut Workspace) {
        let rows = &workspace.current().rows;
        let next = match self {
            Step::Trim => QuickAction::Trim.apply(rows),
            Step::Dedupe => QuickAction::Dedupe.apply(rows),
            Step::Lowercase => QuickAction::Lowercase.apply(rows),
            Step::Replace(spec) => spec.apply(rows),
        };
        workspace.apply(next, self.describe());
    }
}

impl From<QuickAction> for Step {
    fn from(action: QuickAction) -> Self {
        match action {
            QuickAction::Trim => Step::Trim,
            QuickAction::Dedupe => Step::Dedupe,
            QuickAction::Lowercase => Step::Lowercase,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recipe {
    pub steps: Vec<Step>,
}

impl Recipe {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening recipe {path:?}"))?;
        let recipe: Recipe = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Parsing recipe YAML from {path:?}"))?;
        info!("Loaded {} step(s) from recipe {:?}", recipe.steps.len(), path);
        Ok(recipe)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("Parsing recipe YAML")
    }

    pub fn run(&self, workspace: &mut Workspace) {
        for step in &self.steps {
            step.run(workspace);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replace::ALL_COLUMNS;

    #[test]
    fn recipe_yaml_accepts_bare_and_tagged_steps() {
        let recipe = Recipe::from_yaml(
            "- trim\n- replace:\n    find: x\n    replace: y\n- dedupe\n",
        )
        .unwrap();
        assert_eq!(recipe.steps.len(), 3);
        match &recipe.steps[1] {
            Step::Replace(spec) => {
                assert_eq!(spec.column, ALL_COLUMNS);
                assert!(!spec.match_case);
            }
            other => panic!("expected replace step, got {other:?}"),
        }
    }

    #[test]
    fn unknown_step_is_rejected() {
        assert!(Recipe::from_yaml("- shout\n").is_err());
    }
}
