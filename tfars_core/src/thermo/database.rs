//! Module providing the thermodynamic reference tables consumed during preparation
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::thermo::constants::{
    FARADAY_KCAL, FARADAY_KJ, GAS_CONSTANT_KCAL, GAS_CONSTANT_KJ, KJ_PER_KCAL,
};

/// SEED compound id of the proton
pub const SEED_PROTON: &str = "cpd00067";

/// SEED compound id of water
pub const SEED_WATER: &str = "cpd00001";

/// SEED compound id of the biomass pseudo-metabolite
pub const SEED_BIOMASS: &str = "cpd11416";

/// A thermodynamic reference database, keyed by SEED compound id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThermoDatabase {
    /// Name of the database release
    #[serde(default)]
    pub name: Option<String>,
    /// Energy unit all entries are expressed in
    pub units: EnergyUnit,
    /// Compound entries, keyed by SEED id
    pub metabolites: IndexMap<String, CompoundEntry>,
    /// Structural cue contributions, keyed by cue name
    pub cues: IndexMap<String, CueEntry>,
}

impl ThermoDatabase {
    /// Read a database from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<ThermoDatabase, DatabaseError> {
        let json_data = match fs::read_to_string(path) {
            Ok(data) => data,
            _ => return Err(DatabaseError::FileNotFound),
        };
        Self::from_json_str(&json_data)
    }

    /// Read a database from a JSON string
    pub fn from_json_str(data: &str) -> Result<ThermoDatabase, DatabaseError> {
        serde_json::from_str(data).map_err(|_| DatabaseError::DeserializeError)
    }

    /// Look up a compound entry by SEED id
    pub fn compound(&self, seed_id: &str) -> Option<&CompoundEntry> {
        self.metabolites.get(seed_id)
    }

    /// Look up a structural cue by name
    pub fn cue(&self, name: &str) -> Option<&CueEntry> {
        self.cues.get(name)
    }
}

/// Reference data for one compound, in standard conditions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundEntry {
    /// SEED id of the compound
    pub id: String,
    /// Human readable compound name
    #[serde(default)]
    pub name: Option<String>,
    /// Chemical formula, overrides the model metabolite's formula when present
    #[serde(default)]
    pub formula: Option<String>,
    /// Standard Gibbs energy of formation
    #[serde(rename = "deltaGf_std")]
    pub delta_gf_std: f64,
    /// Error on the standard Gibbs energy of formation
    #[serde(rename = "deltaGf_err")]
    pub delta_gf_err: f64,
    /// Molecular mass
    #[serde(rename = "mass_std")]
    pub mass: f64,
    /// Charge in standard conditions
    #[serde(rename = "charge_std")]
    pub charge_std: i32,
    /// Number of protons in standard conditions
    #[serde(rename = "nH_std")]
    pub nh_std: i32,
    /// Dissociation constants
    #[serde(rename = "pKa", default)]
    pub pka: Vec<f64>,
    /// Structural cues making up the compound, as cue name to count
    #[serde(default)]
    pub struct_cues: IndexMap<String, f64>,
    /// Error flag from the database, the literal "Nil" when the entry is trusted
    #[serde(default = "nil_error")]
    pub error: String,
}

fn nil_error() -> String {
    "Nil".to_string()
}

impl CompoundEntry {
    /// Whether the database flagged this entry as erroneous
    pub fn has_error(&self) -> bool {
        self.error != "Nil"
    }
}

/// Additive Gibbs energy contribution of one structural cue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CueEntry {
    /// Formation energy contribution of the cue
    pub energy: f64,
    /// Error on the contribution, combined in quadrature across cues
    pub error: f64,
}

/// Energy unit a thermodynamic database is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnergyUnit {
    #[serde(rename = "kJ/mol")]
    KjPerMol,
    #[serde(rename = "kcal/mol", alias = "Kcal/mol")]
    KcalPerMol,
}

impl EnergyUnit {
    /// Gas constant in this unit, per (K mol)
    pub fn gas_constant(self) -> f64 {
        match self {
            EnergyUnit::KjPerMol => GAS_CONSTANT_KJ,
            EnergyUnit::KcalPerMol => GAS_CONSTANT_KCAL,
        }
    }

    /// RT at the given temperature (K)
    pub fn rt(self, temperature: f64) -> f64 {
        self.gas_constant() * temperature
    }

    /// Faraday constant in this unit, per eV
    pub fn faraday(self) -> f64 {
        match self {
            EnergyUnit::KjPerMol => FARADAY_KJ,
            EnergyUnit::KcalPerMol => FARADAY_KCAL,
        }
    }

    /// Factor rescaling the kJ-based ionic strength correction into this unit
    pub fn adjustment(self) -> f64 {
        match self {
            EnergyUnit::KjPerMol => 1.0,
            EnergyUnit::KcalPerMol => KJ_PER_KCAL,
        }
    }
}

/// Errors associated with reading a thermodynamic database
#[derive(Error, Debug, Clone)]
pub enum DatabaseError {
    /// Error when the database file can't be found or read
    #[error("Thermodynamic database file not found")]
    FileNotFound,
    /// Error when the database can't be deserialized
    #[error("Thermodynamic database could not be deserialized")]
    DeserializeError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_database() {
        let data = r#"{
            "name": "test_db",
            "units": "kJ/mol",
            "metabolites": {
                "cpd00002": {
                    "id": "cpd00002",
                    "name": "ATP",
                    "formula": "C10H13N5O13P3",
                    "deltaGf_std": -2768.1,
                    "deltaGf_err": 2.0,
                    "mass_std": 504.0,
                    "charge_std": -3,
                    "nH_std": 13,
                    "pKa": [6.5, 3.9],
                    "struct_cues": {"Origin": 1.0, "Phosphate": 3.0}
                }
            },
            "cues": {
                "Origin": {"energy": 0.0, "error": 0.5},
                "Phosphate": {"energy": -5.0, "error": 1.2}
            }
        }"#;
        let db = ThermoDatabase::from_json_str(data).unwrap();
        assert_eq!(db.units, EnergyUnit::KjPerMol);
        let atp = db.compound("cpd00002").unwrap();
        assert_eq!(atp.charge_std, -3);
        assert_eq!(atp.pka.len(), 2);
        assert!(!atp.has_error());
        assert_eq!(db.cue("Phosphate").unwrap().error, 1.2);
    }

    #[test]
    fn energy_units() {
        assert!(EnergyUnit::KjPerMol.gas_constant() > EnergyUnit::KcalPerMol.gas_constant());
        assert_eq!(EnergyUnit::KjPerMol.adjustment(), 1.0);
        assert_eq!(EnergyUnit::KcalPerMol.faraday(), 23.061);
    }

    #[test]
    fn bad_database() {
        assert!(matches!(
            ThermoDatabase::from_json_str("not json"),
            Err(DatabaseError::DeserializeError)
        ));
    }
}
