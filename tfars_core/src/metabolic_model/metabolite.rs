//! This module provides the metabolite struct representing a metabolite

use std::hash::Hash;

use derive_builder::Builder;

use crate::thermo::database::{SEED_BIOMASS, SEED_PROTON, SEED_WATER};
use crate::thermo::metabolite::MetaboliteThermo;
use crate::thermo::ThermoError;

/// Represents a metabolite
#[derive(Builder, Debug, Clone)]
#[builder(setter(into))]
pub struct Metabolite {
    /// Used to identify the metabolite (must be unique)
    pub id: String,
    /// Human Readable name of the metabolite
    #[builder(default)]
    pub name: Option<String>,
    /// Which compartment the metabolite is in
    pub compartment: String,
    /// Electrical charge of the Metabolite
    #[builder(default)]
    pub charge: i32,
    /// Chemical Formula of the metabolite, overridden from the reference database
    /// during preparation when an entry exists
    #[builder(default)]
    pub formula: Option<String>,
    /// SEED compound id linking the metabolite to the thermodynamic database
    #[builder(default)]
    pub seed_id: Option<String>,
    /// Thermodynamic annotation, attached by preparation and recomputed wholesale
    /// whenever the model is prepared again
    #[builder(default)]
    pub thermo: Option<MetaboliteThermo>,
}

impl Metabolite {
    /// Whether this metabolite is a proton species
    pub fn is_proton(&self) -> bool {
        self.formula.as_deref() == Some("H") || self.seed_id.as_deref() == Some(SEED_PROTON)
    }

    /// Whether this metabolite is water
    pub fn is_water(&self) -> bool {
        self.formula.as_deref() == Some("H2O") || self.seed_id.as_deref() == Some(SEED_WATER)
    }

    /// Whether this metabolite is the biomass pseudo-metabolite
    pub fn is_biomass(&self) -> bool {
        self.seed_id.as_deref() == Some(SEED_BIOMASS)
    }

    /// Get the thermodynamic annotation, failing if the model was never prepared
    pub fn thermo(&self) -> Result<&MetaboliteThermo, ThermoError> {
        self.thermo
            .as_ref()
            .ok_or_else(|| ThermoError::NotPrepared(self.id.clone()))
    }
}

impl Hash for Metabolite {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Hash by id and compartment
        self.id.hash(state);
        self.compartment.hash(state);
    }
}
