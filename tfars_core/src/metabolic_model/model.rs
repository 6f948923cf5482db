//! This module provides the ThermoModel struct for representing an entire
//! metabolic model together with its thermodynamic reference data

use indexmap::IndexMap;

use crate::configuration::CONFIGURATION;
use crate::metabolic_model::compartment::Compartment;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::Reaction;
use crate::optimize::problem::Problem;
use crate::thermo::database::ThermoDatabase;
use crate::thermo::{ThermoError, ThermoSettings};

/// Represents a Genome Scale Metabolic Model with thermodynamic information
///
/// The model is annotated in place by [`ThermoModel::prepare`] and the
/// resulting optimization problem is built by [`ThermoModel::convert`]
/// (both defined in [`crate::thermo::builder`]).
#[derive(Clone, Debug)]
pub struct ThermoModel {
    /// Map of metabolite ids to Metabolite objects
    pub metabolites: IndexMap<String, Metabolite>,
    /// Map of reaction ids to Reaction objects
    pub reactions: IndexMap<String, Reaction>,
    /// Map of compartment symbols to Compartment objects
    pub compartments: IndexMap<String, Compartment>,
    /// The thermodynamic reference database
    pub thermo_data: ThermoDatabase,
    /// Underlying optimization problem, built by convert()
    pub problem: Option<Problem>,
    /// Id associated with the Model
    pub id: Option<String>,
    /// Temperature (K) at which thermodynamic values are computed
    pub temperature: f64,
    /// Proton metabolite of each compartment, indexed during preparation
    pub(crate) proton_of: IndexMap<String, String>,
}

impl ThermoModel {
    /// Create an empty model around a thermodynamic reference database
    pub fn new(thermo_data: ThermoDatabase) -> Self {
        ThermoModel {
            metabolites: IndexMap::new(),
            reactions: IndexMap::new(),
            compartments: IndexMap::new(),
            thermo_data,
            problem: None,
            id: None,
            temperature: CONFIGURATION.read().unwrap().temperature,
            proton_of: IndexMap::new(),
        }
    }

    /// Add a metabolite to the model
    pub fn add_metabolite(&mut self, metabolite: Metabolite) {
        let id = metabolite.id.clone();
        self.metabolites.insert(id, metabolite);
    }

    /// Add a reaction to the model
    pub fn add_reaction(&mut self, reaction: Reaction) {
        let id = reaction.id.clone();
        self.reactions.insert(id, reaction);
    }

    /// Add a compartment to the model
    pub fn add_compartment(&mut self, compartment: Compartment) {
        let id = compartment.id.clone();
        self.compartments.insert(id, compartment);
    }

    /// Look up the compartment of a metabolite, failing with the offending ids
    /// attached when the compartment table has no entry for it
    pub fn compartment_of(&self, metabolite: &Metabolite) -> Result<&Compartment, ThermoError> {
        self.compartments
            .get(&metabolite.compartment)
            .ok_or_else(|| ThermoError::UnknownCompartment {
                metabolite: metabolite.id.clone(),
                compartment: metabolite.compartment.clone(),
            })
    }

    /// Capture the calculator settings for this model's database unit
    pub fn thermo_settings(&self) -> ThermoSettings {
        let mut settings = ThermoSettings::from_configuration(self.thermo_data.units);
        settings.temperature = self.temperature;
        settings
    }

    /// RT in the database's unit at the model temperature
    pub fn rt(&self) -> f64 {
        self.thermo_data.units.rt(self.temperature)
    }

    /// Number of metabolites carrying usable thermodynamic data
    pub fn num_thermo_metabolites(&self) -> usize {
        self.metabolites
            .values()
            .filter(|met| {
                met.thermo
                    .as_ref()
                    .map(|t| t.seed_id.is_some())
                    .unwrap_or(false)
            })
            .count()
    }

    /// Number of reactions with thermodynamic constraints
    pub fn num_thermo_reactions(&self) -> usize {
        self.reactions
            .values()
            .filter(|rxn| rxn.thermo.as_ref().map(|t| t.computed).unwrap_or(false))
            .count()
    }
}
