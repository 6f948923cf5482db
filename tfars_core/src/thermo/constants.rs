//! Physical constants used by the thermodynamic calculators

/// Reference temperature (K)
pub const TEMPERATURE_0: f64 = 298.15;

/// Lower edge of the pH window in which pKa values are considered
pub const MIN_PH: f64 = 3.0;

/// Upper edge of the pH window in which pKa values are considered
pub const MAX_PH: f64 = 9.0;

/// Extended Debye-Huckel B parameter at 298.15 K
pub const DEBYE_HUCKEL_B_0: f64 = 1.6;

/// Extended Debye-Huckel A parameter at 298.15 K
pub const DEBYE_HUCKEL_A: f64 = 1.17582 / core::f64::consts::LN_10;

/// Prefactor of the `(z^2 - nH) * sqrt(I) / (1 + B * sqrt(I))` ionic strength
/// correction (Goldberg and Tewari, equation 4.4-10 in Alberty's book), in kJ/mol
pub const IONIC_STRENGTH_PREFACTOR: f64 = 2.91482;

/// Gas constant in kJ/(K mol)
pub const GAS_CONSTANT_KJ: f64 = 8.314472 / 1000.;

/// Gas constant in kcal/(K mol)
pub const GAS_CONSTANT_KCAL: f64 = 1.9858775 / 1000.;

/// Faraday constant in kJ/eV
pub const FARADAY_KJ: f64 = 96.485;

/// Faraday constant in kcal/eV
pub const FARADAY_KCAL: f64 = 23.061;

/// kJ per kcal, used to rescale the ionic strength correction for kcal databases
pub const KJ_PER_KCAL: f64 = 4.184;

/// Transformed formation energies at or above this magnitude are treated as unknown
pub const UNKNOWN_ENERGY_CUTOFF: f64 = 1e6;

/// Standard formation energies above this magnitude are considered database garbage
pub const INVALID_ENERGY_CUTOFF: f64 = 9e6;

/// Substituted for a reaction's ΔG error when the computed error is exactly zero,
/// so that the ΔG° variable never gets a zero-width bound range
pub const DEFAULT_DELTA_GR_ERROR: f64 = 2.0;

/// Reactions with at least this many metabolites are never thermodynamically
/// constrained (biomass-style pseudo reactions)
pub const MAX_THERMO_METABOLITES: usize = 100;
