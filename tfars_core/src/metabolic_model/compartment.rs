//! This module provides the Compartment struct describing the physico-chemical
//! conditions of one cellular compartment

use derive_builder::Builder;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Conditions of a compartment, set once from input data and read-only afterwards
#[derive(Builder, Debug, Clone, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct Compartment {
    /// Compartment symbol, e.g. "c" or "e" (must be unique)
    pub id: String,
    /// Human readable compartment name
    #[builder(default)]
    #[serde(default)]
    pub name: Option<String>,
    /// pH of the compartment
    #[serde(rename = "pH")]
    pub ph: f64,
    /// Ionic strength of the compartment
    #[serde(rename = "ionicStr")]
    pub ionic_strength: f64,
    /// Lowest metabolite concentration allowed in the compartment (mol/L)
    pub c_min: f64,
    /// Highest metabolite concentration allowed in the compartment (mol/L)
    pub c_max: f64,
    /// Membrane potentials toward every other compartment (mV), following the
    /// inside minus outside convention
    #[builder(default)]
    #[serde(rename = "membranePot", default)]
    pub membrane_potential: IndexMap<String, f64>,
}

impl Compartment {
    /// Membrane potential (mV) from this compartment toward `other`
    pub fn membrane_potential_to(&self, other: &str) -> Option<f64> {
        self.membrane_potential.get(other).copied()
    }
}
