//! Thermodynamic computations and the conversion of a model into a
//! thermodynamically constrained optimization problem

use thiserror::Error;

use crate::configuration::CONFIGURATION;
use crate::optimize::problem::ProblemError;
use crate::thermo::database::EnergyUnit;

pub mod balance;
pub mod builder;
pub mod constants;
pub mod database;
pub mod metabolite;
pub mod reaction;

/// Parameters of the thermodynamic calculators, captured once per preparation run
#[derive(Debug, Clone, Copy)]
pub struct ThermoSettings {
    /// Energy unit of the reference database
    pub units: EnergyUnit,
    /// Temperature (K)
    pub temperature: f64,
    /// Lower edge of the pH window in which pKa values are considered
    pub min_ph: f64,
    /// Upper edge of the pH window in which pKa values are considered
    pub max_ph: f64,
    /// Extended Debye-Huckel B parameter
    pub debye_huckel_b: f64,
    /// Magnitude used for unknown thermodynamic values
    pub sentinel_energy: f64,
}

impl ThermoSettings {
    /// Capture the current global configuration for a database in the given unit
    pub fn from_configuration(units: EnergyUnit) -> Self {
        let config = CONFIGURATION.read().unwrap();
        ThermoSettings {
            units,
            temperature: config.temperature,
            min_ph: config.min_ph,
            max_ph: config.max_ph,
            debye_huckel_b: config.debye_huckel_b,
            sentinel_energy: config.big_m_dg,
        }
    }

    /// RT in the database's unit
    pub fn rt(&self) -> f64 {
        self.units.rt(self.temperature)
    }
}

/// Errors raised while preparing or converting a model
#[derive(Error, Debug, Clone)]
pub enum ThermoError {
    /// The compartment referenced by a metabolite is not in the compartment table
    #[error("compartment `{compartment}` of metabolite `{metabolite}` not found in the model")]
    UnknownCompartment {
        metabolite: String,
        compartment: String,
    },
    /// No proton species exists anywhere in the network
    #[error("cannot find a proton metabolite in the model")]
    MissingProton,
    /// The compartment table has no membrane potential between two compartments
    #[error("no membrane potential from compartment `{from}` to `{to}`")]
    MissingMembranePotential { from: String, to: String },
    /// A metabolite was used before its thermodynamic annotation was computed
    #[error("metabolite `{0}` has no thermodynamic annotation, run prepare() first")]
    NotPrepared(String),
    /// convert() was called on a model that was never prepared
    #[error("reaction thermodynamic data missing, run prepare() before convert()")]
    ConversionBeforePreparation,
    /// Strict bounds mode: a reaction's flux bounds are wider than the big M constant
    #[error("flux bounds of reaction `{0}` are too wide, or big M is not big enough")]
    FluxBoundsExceedBigM(String),
    #[error(transparent)]
    Problem(#[from] ProblemError),
}
