//! Core rust implementation of tfars, a crate for thermodynamics-based flux analysis
//! of constraint based metabolic models.
//!
//! The crate augments a stoichiometric model with thermodynamic information in two
//! passes: [`metabolic_model::model::ThermoModel::prepare`] annotates every metabolite
//! and reaction with Gibbs energy data from a reference database, and
//! [`metabolic_model::model::ThermoModel::convert`] emits the mixed-integer problem
//! coupling flux directionality to the sign of each reaction's Gibbs energy.

pub mod configuration;
pub mod metabolic_model;
pub mod optimize;
pub mod thermo;
