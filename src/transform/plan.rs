// src/transform/plan.rs

use super::Derivation;
use crate::error::EtlError;

/// Derivations to run and the edges between them. `(a, b)` means `a` reads what `b`
/// writes, so `b` runs first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformPlan {
    steps: Vec<Derivation>,
    edges: Vec<(Derivation, Derivation)>,
}

impl Default for TransformPlan {
    fn default() -> Self {
        Self::new(Derivation::ALL)
    }
}

impl TransformPlan {
    /// Plan over `steps` with each derivation's built-in dependencies as edges.
    pub fn new<I: IntoIterator<Item = Derivation>>(steps: I) -> Self {
        let mut unique = Vec::new();
        for step in steps {
            if !unique.contains(&step) {
                unique.push(step);
            }
        }
        let edges = unique
            .iter()
            .flat_map(|d| d.depends_on().iter().map(move |p| (*d, *p)))
            .collect();
        Self {
            steps: unique,
            edges,
        }
    }

    pub fn with_edge(mut self, dependent: Derivation, prerequisite: Derivation) -> Self {
        if !self.edges.contains(&(dependent, prerequisite)) {
            self.edges.push((dependent, prerequisite));
        }
        self
    }

    pub fn steps(&self) -> &[Derivation] {
        &self.steps
    }

    /// Topological order that otherwise keeps the order steps were listed in.
    pub fn order(&self) -> Result<Vec<Derivation>, EtlError> {
        for (dependent, prerequisite) in &self.edges {
            for d in [dependent, prerequisite] {
                if !self.steps.contains(d) {
                    return Err(EtlError::Plan(format!(
                        "`{dependent}` depends on `{prerequisite}`, but `{d}` is not in the plan"
                    )));
                }
            }
        }

        let mut done: Vec<Derivation> = Vec::with_capacity(self.steps.len());
        while done.len() < self.steps.len() {
            let ready = self.steps.iter().copied().find(|step| {
                !done.contains(step)
                    && self
                        .edges
                        .iter()
                        .filter(|(dependent, _)| dependent == step)
                        .all(|(_, prerequisite)| done.contains(prerequisite))
            });
            match ready {
                Some(step) => done.push(step),
                None => {
                    let stuck: Vec<&str> = self
                        .steps
                        .iter()
                        .filter(|s| !done.contains(s))
                        .map(|s| s.name())
                        .collect();
                    return Err(EtlError::Plan(format!(
                        "dependency cycle among {}",
                        stuck.join(", ")
                    )));
                }
            }
        }
        Ok(done)
    }
}
