//! Module providing the solver-facing representation of the thermodynamic
//! flux problem: variables, constraints, and the problem holding them.
//!
//! This crate only builds the problem; solving it is left to downstream
//! solver bindings which read the variables and constraints stored here.

pub mod constraint;
pub mod objective;
pub mod problem;
pub mod staging;
pub mod variable;
