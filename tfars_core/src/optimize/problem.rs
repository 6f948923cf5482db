//! Provides struct representing the thermodynamic flux optimization problem
use std::sync::{Arc, RwLock};

use indexmap::IndexMap;
use thiserror::Error;

use crate::optimize::constraint::{Constraint, ConstraintKind};
use crate::optimize::objective::{Objective, ObjectiveSense};
use crate::optimize::problem::ProblemError::{
    NonExistentVariable, NonExistentVariablesInObjective,
};
use crate::optimize::variable::{Variable, VariableKind, VariableType};

/// An optimization problem
///
/// Owns every variable and constraint emitted during conversion. After the
/// conversion pass finishes the problem is only read, so the wrapped entries
/// are safe to share with concurrently running solves.
#[derive(Debug, Clone)]
pub struct Problem {
    /// Objective to optimize
    objective: Objective,
    /// Variables of the optimization problem
    variables: IndexMap<String, Arc<RwLock<Variable>>>,
    /// Constraints of the optimization problem
    constraints: IndexMap<String, Arc<RwLock<Constraint>>>,
    /// Current status of the optimization problem
    status: OptimizationStatus,
    /// Type of problem
    problem_type: ProblemType,
    /// Current number of variables in the model
    num_variables: usize,
    /// Current number of constraints in the model
    num_constraints: usize,
}

impl Problem {
    // region Creation Functions
    /// Create a new optimization problem
    pub fn new(objective_sense: ObjectiveSense) -> Self {
        Self {
            objective: Objective::new(objective_sense),
            variables: IndexMap::new(),
            constraints: IndexMap::default(),
            status: OptimizationStatus::Unoptimized,
            problem_type: ProblemType::LinearContinuous,
            num_variables: 0,
            num_constraints: 0,
        }
    }

    /// Create a new maximization problem
    pub fn new_maximization() -> Self {
        Self::new(ObjectiveSense::Maximize)
    }

    /// Create a new minimization problem
    pub fn new_minimization() -> Self {
        Self::new(ObjectiveSense::Minimize)
    }
    // endregion Creation Functions

    // region Update Objective
    /// Update the objective sense of the problem
    pub fn update_objective_sense(&mut self, sense: ObjectiveSense) {
        self.objective.set_sense(sense);
    }

    /// Add a new linear term to the objective using the variable id
    pub fn add_new_linear_objective_term_by_id(
        &mut self,
        variable_id: &str,
        coefficient: f64,
    ) -> Result<(), ProblemError> {
        let variable = match self.variables.get(variable_id) {
            Some(variable) => variable.clone(),
            None => return Err(NonExistentVariablesInObjective),
        };
        self.objective.add_linear_term(variable, coefficient);
        Ok(())
    }
    // endregion Update Objective

    // region Adding Variables
    /// Add a variable to the optimization problem
    pub fn add_variable(&mut self, variable: Arc<RwLock<Variable>>) -> Result<(), ProblemError> {
        // Validate that the variable can in fact be added to the problem
        self.validate_variable(variable.clone())?;
        // Update the index of the variable to reflect the current variable count
        variable.write().unwrap().index = self.num_variables;
        // Update the total number of variables
        self.num_variables += 1;
        // Insert the variable into the variables IndexMap
        let var_id = variable.read().unwrap().id.clone();
        self.variables.insert(var_id, variable.clone());
        // Update the type of the model if needed
        match variable.read().unwrap().variable_type {
            VariableType::Continuous => {
                // This will not change the type
            }
            VariableType::Integer | VariableType::Binary => {
                self.problem_type = ProblemType::LinearMixedInteger;
            }
        }
        Ok(())
    }

    /// Create a new variable of the given kind and add it to the optimization problem
    pub fn add_new_variable(
        &mut self,
        kind: VariableKind,
        variable_type: VariableType,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        let new_var = Variable::new(kind, variable_type, lower_bound, upper_bound).wrap();
        self.add_variable(new_var)
    }
    // endregion Adding Variables

    // region Adding Constraints
    /// Add a constraint to the problem
    pub fn add_constraint(
        &mut self,
        constraint: Arc<RwLock<Constraint>>,
    ) -> Result<(), ProblemError> {
        self.validate_constraint(constraint.clone())?;
        self.num_constraints += 1;
        self.constraints
            .insert(constraint.read().unwrap().get_id(), constraint.clone());
        Ok(())
    }

    /// Create a new equality constraint using variable ids, and add it to the problem
    pub fn add_new_equality_constraint_by_id(
        &mut self,
        kind: ConstraintKind,
        owner: &str,
        variables: &[&str],
        coefficients: &[f64],
        equals: f64,
    ) -> Result<(), ProblemError> {
        let variables = self.collect_variables_by_id(variables)?;
        let new_cons = Constraint::new_equality(kind, owner, &variables, coefficients, equals);
        self.add_constraint(new_cons.wrap())
    }

    /// Create a new inequality constraint using variable ids, and add it to the problem
    pub fn add_new_inequality_constraint_by_id(
        &mut self,
        kind: ConstraintKind,
        owner: &str,
        variables: &[&str],
        coefficients: &[f64],
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        let variables = self.collect_variables_by_id(variables)?;
        let new_cons =
            Constraint::new_inequality(kind, owner, &variables, coefficients, lower_bound, upper_bound);
        self.add_constraint(new_cons.wrap())
    }

    fn collect_variables_by_id(
        &self,
        variables: &[&str],
    ) -> Result<Vec<Arc<RwLock<Variable>>>, ProblemError> {
        variables
            .iter()
            .map(|v_id| {
                self.variables
                    .get(*v_id)
                    .cloned()
                    .ok_or(ProblemError::NonExistentVariablesInConstraint)
            })
            .collect()
    }
    // endregion Adding Constraints

    // region Update Variable Bounds
    /// Update the bounds of a variable
    pub fn update_variable_bounds(
        &mut self,
        id: &str,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        if lower_bound > upper_bound {
            return Err(ProblemError::InvalidVariableBounds);
        }
        match self.variables.get(id) {
            Some(var) => {
                var.write().unwrap().lower_bound = lower_bound;
                var.write().unwrap().upper_bound = upper_bound;
            }
            None => return Err(NonExistentVariable),
        };
        Ok(())
    }
    // endregion Update Variable Bounds

    // region Accessors
    /// Get a variable by its solver-level id
    pub fn get_variable(&self, id: &str) -> Option<Arc<RwLock<Variable>>> {
        self.variables.get(id).cloned()
    }

    /// Get a constraint by its solver-level id
    pub fn get_constraint(&self, id: &str) -> Option<Arc<RwLock<Constraint>>> {
        self.constraints.get(id).cloned()
    }

    /// Iterate over all variables in insertion order
    pub fn variables(&self) -> &IndexMap<String, Arc<RwLock<Variable>>> {
        &self.variables
    }

    /// Iterate over all constraints in insertion order
    pub fn constraints(&self) -> &IndexMap<String, Arc<RwLock<Constraint>>> {
        &self.constraints
    }

    /// Current objective of the problem
    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    /// Number of variables in the problem
    pub fn num_variables(&self) -> usize {
        self.num_variables
    }

    /// Number of constraints in the problem
    pub fn num_constraints(&self) -> usize {
        self.num_constraints
    }

    /// Current status of the problem
    pub fn status(&self) -> OptimizationStatus {
        self.status
    }

    /// Type of the problem (continuous, or mixed integer)
    pub fn problem_type(&self) -> ProblemType {
        self.problem_type.clone()
    }
    // endregion Accessors

    // region Validation Functions
    /// Check that a variable to be added is valid to add to this problem
    fn validate_variable(&self, variable: Arc<RwLock<Variable>>) -> Result<(), ProblemError> {
        // Check if there is already a variable with this id
        if self.variables.get(&variable.read().unwrap().id).is_some() {
            return Err(ProblemError::VariableIdAlreadyExists);
        };
        // Check if the variable bounds are valid
        let lb = variable.read().unwrap().lower_bound;
        let ub = variable.read().unwrap().upper_bound;
        if lb > ub {
            return Err(ProblemError::InvalidVariableBounds);
        }
        Ok(())
    }

    /// Check that a constraint to be added is valid to add to this Problem
    fn validate_constraint(&self, constraint: Arc<RwLock<Constraint>>) -> Result<(), ProblemError> {
        // Check that a constraint with the same id doesn't already exist
        if self
            .constraints
            .get(&constraint.read().unwrap().get_id())
            .is_some()
        {
            return Err(ProblemError::ConstraintAlreadyExists);
        }
        // Check that for inequality constraints the bounds make sense
        match *constraint.read().unwrap() {
            Constraint::Equality { .. } => {}
            Constraint::Inequality {
                lower_bound,
                upper_bound,
                ..
            } => {
                if lower_bound > upper_bound {
                    return Err(ProblemError::InvalidConstraintBounds);
                }
            }
        }
        // Check that the variables in this constraint are in the model
        for var in constraint.read().unwrap().get_variables() {
            if let Some(problem_var) = self.variables.get(&var.read().unwrap().id) {
                if !Arc::ptr_eq(&var, problem_var) {
                    return Err(ProblemError::NonExistentVariablesInConstraint);
                }
            } else {
                return Err(ProblemError::NonExistentVariablesInConstraint);
            }
        }
        // All checks have passed
        Ok(())
    }
    // endregion Validation Functions

    // region Check Problem
    /// Whether the problem contains any integer or binary variables
    pub fn has_integer_variables(&self) -> bool {
        for (_, var) in &self.variables {
            match var.read().unwrap().variable_type {
                VariableType::Integer | VariableType::Binary => return true,
                VariableType::Continuous => {}
            }
        }
        false
    }
    // endregion Check Problem
}

/// Status of an optimization problem
#[derive(Copy, Clone, Debug)]
pub enum OptimizationStatus {
    /// Problem has not yet attempted to be optimized
    Unoptimized,
    /// Problem has been optimized
    Optimal,
    /// Problem can't be optimized because objective value is not bounded
    Unbounded,
    /// Problem can't be solved because it is infeasible (conflicting constraints)
    Infeasible,
}

/// Types of optimization problems
#[derive(Clone, Debug, PartialEq)]
pub enum ProblemType {
    /// Problem with linear objective and constraints, and continuous variables
    LinearContinuous,
    /// Problem with linear objective and constraints, with integer and continuous variables
    LinearMixedInteger,
}

/// Errors associated with the Problem
#[derive(Error, Debug, Clone)]
pub enum ProblemError {
    /// Error when trying to add a variable with the same id as an existing variable
    #[error("Tried to add a variable with the same id as an existing variable")]
    VariableIdAlreadyExists,
    /// Error when trying to add variable with invalid bounds
    #[error("Tried to add a variable with lower_bound>upper_bound")]
    InvalidVariableBounds,
    /// Error when trying to add a constraint with the same id as an existing constraint
    #[error("Tried to add a constraint with the same id as an existing constraint")]
    ConstraintAlreadyExists,
    /// Error when trying to add a constraint with invalid bounds
    #[error("Tried to add an inequality constraint with lower_bound > upper_bound")]
    InvalidConstraintBounds,
    /// Error when trying to add a constraint that contains variables not in the model
    #[error("Tried to add a constraint with variables not in the model")]
    NonExistentVariablesInConstraint,
    /// Error when trying to add an objective term which includes variables not in the model
    #[error("Tried adding an objective term with variables not in the model")]
    NonExistentVariablesInObjective,
    /// Error when trying to perform an update on a variable that doesn't exist
    #[error("Tried to access a variable that doesn't exist")]
    NonExistentVariable,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lc(metabolite: &str) -> VariableKind {
        VariableKind::LogConcentration {
            metabolite: metabolite.to_string(),
        }
    }

    #[test]
    fn new_problem() {
        // Catch fire test
        let _problem = Problem::new(ObjectiveSense::Maximize);

        let max_problem = Problem::new_maximization();
        assert_eq!(max_problem.objective.sense, ObjectiveSense::Maximize);

        let min_problem = Problem::new_minimization();
        assert_eq!(min_problem.objective.sense, ObjectiveSense::Minimize);
    }

    #[test]
    fn add_variables() {
        let mut problem = Problem::new(ObjectiveSense::Maximize);

        // Add a single continuous variable
        problem
            .add_new_variable(lc("g6p_c"), VariableType::Continuous, -11.5, -2.3)
            .unwrap();
        if let Some(var) = problem.get_variable("LC_g6p_c") {
            assert_eq!(var.read().unwrap().variable_type, VariableType::Continuous);
            assert_eq!(var.read().unwrap().index, 0);
            assert!(
                (var.read().unwrap().lower_bound + 11.5).abs() < 1e-25,
                "Variable added with incorrect lower bound"
            );
            assert!(
                (var.read().unwrap().upper_bound + 2.3).abs() < 1e-25,
                "Variable added with incorrect upper bound"
            );
        } else {
            panic!("Variable not added to model")
        }
        assert_eq!(problem.problem_type, ProblemType::LinearContinuous);

        // Adding a binary variable promotes the problem to mixed integer
        problem
            .add_new_variable(
                VariableKind::ForwardUse {
                    reaction: "PGI".to_string(),
                },
                VariableType::Binary,
                0.,
                1.,
            )
            .unwrap();
        assert_eq!(problem.problem_type, ProblemType::LinearMixedInteger);
        assert!(problem.has_integer_variables());
        assert_eq!(problem.num_variables(), 2);
    }

    #[test]
    fn add_bad_variable() {
        let mut problem = Problem::new(ObjectiveSense::Maximize);

        // Add a variable with bad bounds
        let res = problem.add_new_variable(lc("g6p_c"), VariableType::Continuous, 100., 64.);
        if let Err(ProblemError::InvalidVariableBounds) = res {
            // Intentionally blank
        } else {
            panic!("Invalid variable bounds not caught")
        }

        // Duplicate id
        problem
            .add_new_variable(lc("f6p_c"), VariableType::Continuous, -10., -1.)
            .unwrap();
        let res = problem.add_new_variable(lc("f6p_c"), VariableType::Continuous, -10., -1.);
        if let Err(ProblemError::VariableIdAlreadyExists) = res {
        } else {
            panic!("Duplicate variable id not caught")
        }
    }

    #[test]
    fn add_constraint() {
        let mut problem = Problem::new(ObjectiveSense::Maximize);

        problem
            .add_new_variable(lc("g6p_c"), VariableType::Continuous, -11.5, -2.3)
            .unwrap();
        problem
            .add_new_variable(lc("f6p_c"), VariableType::Continuous, -11.5, -2.3)
            .unwrap();

        // Add an equality constraint
        problem
            .add_new_equality_constraint_by_id(
                ConstraintKind::NegativeDeltaG,
                "PGI",
                &["LC_g6p_c", "LC_f6p_c"],
                &[2., 3.],
                0.,
            )
            .unwrap();
        let cons = problem.get_constraint("G_PGI").unwrap();
        match *(cons.read().unwrap()) {
            Constraint::Equality { equals, .. } => {
                assert!((equals - 0.).abs() < 1e-25)
            }
            Constraint::Inequality { .. } => panic!("Incorrect constraint type added"),
        }

        // Add an inequality constraint
        problem
            .add_new_inequality_constraint_by_id(
                ConstraintKind::SimultaneousUse,
                "PGI",
                &["LC_g6p_c", "LC_f6p_c"],
                &[1., 1.],
                f64::NEG_INFINITY,
                1.,
            )
            .unwrap();
        let cons = problem.get_constraint("SU_PGI").unwrap();
        match *(cons.read().unwrap()) {
            Constraint::Inequality {
                lower_bound,
                upper_bound,
                ..
            } => {
                assert!(lower_bound.is_infinite());
                assert!((upper_bound - 1.).abs() < 1e-25);
            }
            Constraint::Equality { .. } => panic!("Incorrect constraint type added"),
        }
        assert_eq!(problem.num_constraints(), 2);
    }

    #[test]
    fn add_bad_constraint() {
        let mut problem = Problem::new(ObjectiveSense::Maximize);

        problem
            .add_new_variable(lc("g6p_c"), VariableType::Continuous, -11.5, -2.3)
            .unwrap();

        // Inverted bounds
        if let Err(ProblemError::InvalidConstraintBounds) = problem
            .add_new_inequality_constraint_by_id(
                ConstraintKind::SimultaneousUse,
                "PGI",
                &["LC_g6p_c"],
                &[1.],
                200.,
                100.,
            )
        {
        } else {
            panic!("Invalid constraint bounds not caught")
        }

        // Unknown variable
        if let Err(ProblemError::NonExistentVariablesInConstraint) = problem
            .add_new_equality_constraint_by_id(
                ConstraintKind::NegativeDeltaG,
                "PGI",
                &["LC_missing"],
                &[1.],
                0.,
            )
        {
        } else {
            panic!("Unknown variable in constraint not caught")
        }
    }

    #[test]
    fn update_variable_bounds() {
        let mut problem = Problem::new(ObjectiveSense::Maximize);
        problem
            .add_new_variable(lc("g6p_c"), VariableType::Continuous, -11.5, -2.3)
            .unwrap();

        problem.update_variable_bounds("LC_g6p_c", -9., -4.).unwrap();
        let var = problem.get_variable("LC_g6p_c").unwrap();
        assert!((var.read().unwrap().lower_bound + 9.).abs() < 1e-25);
        assert!((var.read().unwrap().upper_bound + 4.).abs() < 1e-25);

        // Inverted bounds leave the variable untouched
        if let Err(ProblemError::InvalidVariableBounds) =
            problem.update_variable_bounds("LC_g6p_c", -1., -5.)
        {
        } else {
            panic!("Invalid variable bounds not caught")
        }
        assert!((var.read().unwrap().lower_bound + 9.).abs() < 1e-25);

        if let Err(ProblemError::NonExistentVariable) =
            problem.update_variable_bounds("LC_missing", -9., -4.)
        {
        } else {
            panic!("Unknown variable not caught")
        }
    }

    #[test]
    fn objective_terms() {
        let mut problem = Problem::new(ObjectiveSense::Maximize);
        problem
            .add_new_variable(
                VariableKind::ForwardFlux {
                    reaction: "BIOMASS".to_string(),
                },
                VariableType::Continuous,
                0.,
                1000.,
            )
            .unwrap();
        problem
            .add_new_linear_objective_term_by_id("F_BIOMASS", 1.)
            .unwrap();
        assert!(!problem.objective().is_empty());

        if let Err(ProblemError::NonExistentVariablesInObjective) =
            problem.add_new_linear_objective_term_by_id("F_MISSING", 1.)
        {
        } else {
            panic!("Unknown variable in objective not caught")
        }
    }
}
