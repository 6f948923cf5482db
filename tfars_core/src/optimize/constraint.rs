//! Provides struct for representing a constraint in an optimization problem
use std::fmt::{Display, Formatter};
use std::sync::{Arc, RwLock};

use crate::optimize::variable::Variable;

/// Represents a linear constraint in an optimization problem
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Represents an equality constraint, where `terms` = `equals`
    Equality {
        /// Solver-level name, the kind prefix concatenated with the owner id
        id: String,
        /// Which coupling of the thermodynamic formulation this constraint encodes
        kind: ConstraintKind,
        /// Linear terms which are added together, see [`ConstraintTerm`] for more
        terms: Vec<ConstraintTerm>,
        /// The right hand side of the equality constraint
        equals: f64,
    },
    /// Represents an inequality constraint
    Inequality {
        /// Solver-level name, the kind prefix concatenated with the owner id
        id: String,
        /// Which coupling of the thermodynamic formulation this constraint encodes
        kind: ConstraintKind,
        /// Linear terms which are added together, see [`ConstraintTerm`] for more
        terms: Vec<ConstraintTerm>,
        /// The lowest value the sum of the terms can take
        lower_bound: f64,
        /// The highest value the sum of the terms can take
        upper_bound: f64,
    },
}

impl Constraint {
    /// Create a new equality constraint from variables and matching coefficients
    pub fn new_equality(
        kind: ConstraintKind,
        owner: &str,
        variables: &[Arc<RwLock<Variable>>],
        coefficients: &[f64],
        equals: f64,
    ) -> Self {
        Constraint::Equality {
            id: kind.id_for(owner),
            kind,
            terms: Constraint::zip_into_terms(variables, coefficients),
            equals,
        }
    }

    /// Create a new inequality constraint from variables and matching coefficients
    pub fn new_inequality(
        kind: ConstraintKind,
        owner: &str,
        variables: &[Arc<RwLock<Variable>>],
        coefficients: &[f64],
        lower_bound: f64,
        upper_bound: f64,
    ) -> Self {
        Constraint::Inequality {
            id: kind.id_for(owner),
            kind,
            terms: Constraint::zip_into_terms(variables, coefficients),
            lower_bound,
            upper_bound,
        }
    }

    /// Wrap the constraint in an Arc<RwLock<>>
    pub fn wrap(self) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(self))
    }

    /// Get the id of the constraint
    pub fn get_id(&self) -> String {
        match self {
            Constraint::Equality { id, .. } | Constraint::Inequality { id, .. } => id.clone(),
        }
    }

    /// Get the kind of the constraint
    pub fn get_kind(&self) -> ConstraintKind {
        match self {
            Constraint::Equality { kind, .. } | Constraint::Inequality { kind, .. } => *kind,
        }
    }

    /// Get references to all variables appearing in the constraint
    pub fn get_variables(&self) -> Vec<Arc<RwLock<Variable>>> {
        self.terms().iter().map(|t| t.variable.clone()).collect()
    }

    /// Get the terms of the constraint
    pub fn terms(&self) -> &[ConstraintTerm] {
        match self {
            Constraint::Equality { terms, .. } | Constraint::Inequality { terms, .. } => terms,
        }
    }

    /// Take a slice of variable references, and a slice of coefficients and zip
    /// them together into a vec of ConstraintTerms
    fn zip_into_terms(
        variables: &[Arc<RwLock<Variable>>],
        coefficients: &[f64],
    ) -> Vec<ConstraintTerm> {
        variables
            .iter()
            .zip(coefficients)
            .map(|(var, coef)| ConstraintTerm {
                variable: var.clone(),
                coefficient: *coef,
            })
            .collect()
    }

    /// Convert a vector of terms into a String representation
    fn terms_to_string(terms: &[ConstraintTerm]) -> String {
        terms
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Constraint::Equality { terms, equals, .. } => {
                write!(f, "{} = {}", Self::terms_to_string(terms), equals)
            }
            Constraint::Inequality {
                terms,
                lower_bound,
                upper_bound,
                ..
            } => {
                write!(
                    f,
                    "{} <= {} <= {}",
                    lower_bound,
                    Self::terms_to_string(terms),
                    upper_bound
                )
            }
        }
    }
}

/// Represents a single term in a constraint, specifically
/// represents the multiplication of the `variable` by the `coefficient`
#[derive(Debug, Clone)]
pub struct ConstraintTerm {
    /// A reference to a [`Variable`]
    pub variable: Arc<RwLock<Variable>>,
    /// The coefficient for the variable
    pub coefficient: f64,
}

impl Display for ConstraintTerm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}*{}",
            self.coefficient,
            self.variable.read().unwrap().id
        )
    }
}

/// The couplings of the thermodynamic flux formulation, each with a fixed prefix
/// used to name the constraint after the reaction it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// ΔG° - ΔG + RT * Σ stoich * log-concentration = 0
    NegativeDeltaG,
    /// ΔG + M * forward use <= M - ε, forward use needs sufficiently negative ΔG
    ForwardDeltaGCoupling,
    /// M * backward use - ΔG <= M - ε, backward use needs sufficiently positive ΔG
    BackwardDeltaGCoupling,
    /// forward use + backward use <= 1
    SimultaneousUse,
    /// forward flux - M * forward use <= 0
    ForwardDirectionCoupling,
    /// reverse flux - M * backward use <= 0
    BackwardDirectionCoupling,
    /// displacement - ΔG / RT = 0
    DisplacementCoupling,
}

impl ConstraintKind {
    /// Prefix distinguishing this kind at the solver level
    pub fn prefix(&self) -> &'static str {
        match self {
            ConstraintKind::NegativeDeltaG => "G_",
            ConstraintKind::ForwardDeltaGCoupling => "FU_",
            ConstraintKind::BackwardDeltaGCoupling => "BU_",
            ConstraintKind::SimultaneousUse => "SU_",
            ConstraintKind::ForwardDirectionCoupling => "UF_",
            ConstraintKind::BackwardDirectionCoupling => "UR_",
            ConstraintKind::DisplacementCoupling => "DC_",
        }
    }

    /// Solver-level name for this kind of constraint on the given reaction
    pub fn id_for(&self, owner: &str) -> String {
        format!("{}{}", self.prefix(), owner)
    }
}
