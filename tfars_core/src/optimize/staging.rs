//! Two-phase construction of a [`Problem`]
//!
//! Conversion stages plain descriptors for every variable and constraint it
//! wants to emit, then commits them all at once. Staged constraints reference
//! variables by id, so nothing is wired to solver state until [`ProblemBuilder::commit`]
//! runs, and a failed conversion leaves no half-built problem behind.

use crate::optimize::constraint::ConstraintKind;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::{Problem, ProblemError};
use crate::optimize::variable::{Variable, VariableKind};

/// Accumulates variable and constraint descriptors, then builds the problem in
/// one pass
#[derive(Debug, Default)]
pub struct ProblemBuilder {
    staged_variables: Vec<Variable>,
    staged_constraints: Vec<StagedConstraint>,
}

/// A constraint descriptor, holding variable ids instead of variable references
#[derive(Debug, Clone)]
struct StagedConstraint {
    kind: ConstraintKind,
    owner: String,
    variables: Vec<String>,
    coefficients: Vec<f64>,
    body: StagedBody,
}

#[derive(Debug, Clone, Copy)]
enum StagedBody {
    Equality { equals: f64 },
    Inequality { lower_bound: f64, upper_bound: f64 },
}

impl ProblemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a variable of the given kind; returns its solver-level id
    pub fn stage_variable(&mut self, kind: VariableKind, lower_bound: f64, upper_bound: f64) -> String {
        let variable_type = kind.variable_type();
        let variable = Variable::new(kind, variable_type, lower_bound, upper_bound);
        let id = variable.id.clone();
        self.staged_variables.push(variable);
        id
    }

    /// Stage an equality constraint over previously staged variables
    pub fn stage_equality(
        &mut self,
        kind: ConstraintKind,
        owner: &str,
        variables: Vec<String>,
        coefficients: Vec<f64>,
        equals: f64,
    ) {
        self.staged_constraints.push(StagedConstraint {
            kind,
            owner: owner.to_string(),
            variables,
            coefficients,
            body: StagedBody::Equality { equals },
        });
    }

    /// Stage an inequality constraint over previously staged variables
    pub fn stage_inequality(
        &mut self,
        kind: ConstraintKind,
        owner: &str,
        variables: Vec<String>,
        coefficients: Vec<f64>,
        lower_bound: f64,
        upper_bound: f64,
    ) {
        self.staged_constraints.push(StagedConstraint {
            kind,
            owner: owner.to_string(),
            variables,
            coefficients,
            body: StagedBody::Inequality {
                lower_bound,
                upper_bound,
            },
        });
    }

    /// Number of variables staged so far
    pub fn num_staged_variables(&self) -> usize {
        self.staged_variables.len()
    }

    /// Number of constraints staged so far
    pub fn num_staged_constraints(&self) -> usize {
        self.staged_constraints.len()
    }

    /// Build the problem: add every staged variable, then every staged constraint
    pub fn commit(self) -> Result<Problem, ProblemError> {
        let mut problem = Problem::new(ObjectiveSense::Maximize);
        for variable in self.staged_variables {
            problem.add_variable(variable.wrap())?;
        }
        for staged in self.staged_constraints {
            let variable_ids: Vec<&str> = staged.variables.iter().map(String::as_str).collect();
            match staged.body {
                StagedBody::Equality { equals } => problem.add_new_equality_constraint_by_id(
                    staged.kind,
                    &staged.owner,
                    &variable_ids,
                    &staged.coefficients,
                    equals,
                )?,
                StagedBody::Inequality {
                    lower_bound,
                    upper_bound,
                } => problem.add_new_inequality_constraint_by_id(
                    staged.kind,
                    &staged.owner,
                    &variable_ids,
                    &staged.coefficients,
                    lower_bound,
                    upper_bound,
                )?,
            }
        }
        Ok(problem)
    }
}
