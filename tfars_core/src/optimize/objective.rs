//! Provides struct for representing an optimization problem's objective

use std::sync::{Arc, RwLock};

use crate::optimize::variable::Variable;

/// Represents the Objective of an optimization problem
///
/// The conversion itself leaves the objective empty; downstream analyses set
/// it on the built problem (for example maximizing a flux variable).
#[derive(Debug, Clone)]
pub struct Objective {
    /// Terms included in the objective (see [`ObjectiveTerm`])
    pub(crate) terms: Vec<ObjectiveTerm>,
    /// Sense of the objective (maximize, or minimize), see [`ObjectiveSense`]
    pub(crate) sense: ObjectiveSense,
}

impl Objective {
    /// Create a new empty objective, with a given sense
    pub fn new(sense: ObjectiveSense) -> Self {
        Self {
            terms: Vec::new(),
            sense,
        }
    }

    /// Change the sense of the objective
    pub fn set_sense(&mut self, sense: ObjectiveSense) {
        self.sense = sense;
    }

    /// Add a new linear term to the objective
    pub fn add_linear_term(&mut self, variable: Arc<RwLock<Variable>>, coefficient: f64) {
        self.terms.push(ObjectiveTerm::Linear {
            var: variable,
            coef: coefficient,
        });
    }

    /// Whether the objective has any terms
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterate over the terms of the objective
    pub fn terms(&self) -> &[ObjectiveTerm] {
        &self.terms
    }
}

/// Represents the sense of the objective, whether it should be maximized or minimized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveSense {
    /// The objective should be minimized
    Minimize,
    /// The objective should be maximized
    Maximize,
}

/// A term in the objective
#[derive(Debug, Clone)]
pub enum ObjectiveTerm {
    /// A linear term in the objective
    Linear {
        /// Variable in objective term
        var: Arc<RwLock<Variable>>,
        /// Coefficient for linear term
        coef: f64,
    },
}
