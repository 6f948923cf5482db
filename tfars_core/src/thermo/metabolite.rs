//! Transformed Gibbs energies of formation for single metabolites
//!
//! Implements the Alberty transform with the Goldberg and Tewari extended
//! Debye-Huckel correction: starting from the fully deprotonated species
//! within the pH window, the standard formation energy is shifted to the
//! compartment pH and ionic strength, then averaged over protonation states
//! through the binding polynomial.

use indexmap::IndexMap;

use crate::thermo::constants::{
    DEBYE_HUCKEL_A, INVALID_ENERGY_CUTOFF, IONIC_STRENGTH_PREFACTOR, UNKNOWN_ENERGY_CUTOFF,
};
use crate::thermo::database::{CompoundEntry, SEED_PROTON};
use crate::thermo::ThermoSettings;

/// Thermodynamic annotation of a metabolite at its compartment conditions
///
/// Produced by preparation, recomputed wholesale on every run. All energies are
/// in the unit of the reference database; metabolites without a usable database
/// entry carry the sentinel magnitude instead.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaboliteThermo {
    /// SEED id of the matched database entry, None when no entry was found
    pub seed_id: Option<String>,
    /// Dissociation constants from the database entry
    pub pka: Vec<f64>,
    /// Standard Gibbs energy of formation
    pub delta_gf_std: f64,
    /// Error on the standard Gibbs energy of formation
    pub delta_gf_err: f64,
    /// Molecular mass
    pub mass: f64,
    /// Charge in standard conditions
    pub charge_std: f64,
    /// Number of protons in standard conditions
    pub nh_std: f64,
    /// Structural cues of the compound
    pub struct_cues: IndexMap<String, f64>,
    /// Transformed Gibbs energy of formation at the compartment pH and ionic
    /// strength, or the sentinel magnitude when it cannot be computed
    pub delta_gf_tr: f64,
    /// pH the transform was evaluated at
    pub ph: f64,
    /// Ionic strength the transform was evaluated at
    pub ionic_strength: f64,
}

impl MetaboliteThermo {
    /// Compute the annotation for a metabolite, transforming the database entry
    /// to the compartment conditions when one exists
    pub fn compute(
        entry: Option<&CompoundEntry>,
        ph: f64,
        ionic_strength: f64,
        settings: &ThermoSettings,
    ) -> MetaboliteThermo {
        match entry {
            Some(entry) => {
                let calculator = Calculator {
                    entry,
                    ph,
                    ionic_strength,
                    settings,
                    rt: settings.rt(),
                };
                MetaboliteThermo {
                    seed_id: Some(entry.id.clone()),
                    pka: entry.pka.clone(),
                    delta_gf_std: entry.delta_gf_std,
                    delta_gf_err: entry.delta_gf_err,
                    mass: entry.mass,
                    charge_std: entry.charge_std as f64,
                    nh_std: entry.nh_std as f64,
                    struct_cues: entry.struct_cues.clone(),
                    delta_gf_tr: calculator.transformed_formation_energy(),
                    ph,
                    ionic_strength,
                }
            }
            None => MetaboliteThermo::unknown(ph, ionic_strength, settings),
        }
    }

    /// Sentinel annotation for metabolites without a database entry
    pub fn unknown(ph: f64, ionic_strength: f64, settings: &ThermoSettings) -> MetaboliteThermo {
        MetaboliteThermo {
            seed_id: None,
            pka: Vec::new(),
            delta_gf_std: settings.sentinel_energy,
            delta_gf_err: settings.sentinel_energy,
            mass: settings.sentinel_energy,
            charge_std: settings.sentinel_energy,
            nh_std: settings.sentinel_energy,
            struct_cues: IndexMap::new(),
            delta_gf_tr: settings.sentinel_energy,
            ph,
            ionic_strength,
        }
    }

    /// Whether the transformed formation energy is a real value rather than
    /// the sentinel
    pub fn has_transformed_energy(&self) -> bool {
        self.delta_gf_tr.abs() < UNKNOWN_ENERGY_CUTOFF
    }

    /// Whether the standard formation energy is a real value rather than the
    /// sentinel
    pub fn has_standard_energy(&self) -> bool {
        self.delta_gf_std.abs() < UNKNOWN_ENERGY_CUTOFF
    }
}

/// One transform evaluation, tying a database entry to compartment conditions
struct Calculator<'a> {
    entry: &'a CompoundEntry,
    ph: f64,
    ionic_strength: f64,
    settings: &'a ThermoSettings,
    rt: f64,
}

impl Calculator<'_> {
    fn is_proton(&self) -> bool {
        self.entry.id == SEED_PROTON
    }

    /// Transformed Gibbs energy of formation at the compartment pH and ionic
    /// strength (equation 4.5-6 in Alberty's book)
    fn transformed_formation_energy(&self) -> f64 {
        // The proton's transformed energy is set directly by the pH
        if self.is_proton() {
            return -self.rt * 10f64.powf(-self.ph).ln();
        }

        // Untrusted entries get the sentinel
        if self.entry.has_error() || self.entry.delta_gf_std > INVALID_ENERGY_CUTOFF {
            return self.settings.sentinel_energy;
        }

        let potential = self.binding_polynomial();
        self.species_formation_energy() - self.rt * potential.ln()
    }

    /// Transformed Gibbs energy of the most protonated species (equation
    /// 4.4-10 in Alberty's book, Goldberg and Tewari correction)
    fn species_formation_energy(&self) -> f64 {
        let (delta_go, charge, nh) = self.deprotonated_species();
        let zsq = charge * charge;
        let sqrt_i = self.ionic_strength.sqrt();
        let term1 = nh * self.rt * 10f64.powf(-self.ph).ln();
        let term2 = IONIC_STRENGTH_PREFACTOR * (zsq - nh) * sqrt_i
            / (1. + self.settings.debye_huckel_b * sqrt_i)
            / self.settings.units.adjustment();
        delta_go - (term1 + term2)
    }

    /// Binding polynomial over the ionic-strength-adjusted pKa values
    fn binding_polynomial(&self) -> f64 {
        let pka_values = self.adjusted_pkas();
        let mut p = 1f64;
        let mut prod_denom = 1f64;

        if let Some(min_pka) = pka_values.iter().copied().reduce(f64::min) {
            if min_pka <= self.settings.max_ph {
                for (i, pka) in pka_values.iter().enumerate() {
                    let numerator = 10f64.powf(-((i + 1) as f64) * self.ph);
                    prod_denom *= 10f64.powf(-pka);
                    p += numerator / prod_denom;
                }
            }
        }
        p
    }

    /// pKa values within the pH window, adjusted for ionic strength and sorted
    /// from highest to lowest
    fn adjusted_pkas(&self) -> Vec<f64> {
        let (_, charge, _) = self.deprotonated_species();

        let mut accepted: Vec<f64> = self
            .entry
            .pka
            .iter()
            .copied()
            .filter(|&x| self.settings.min_ph < x && x < self.settings.max_ph)
            .collect();
        accepted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

        let mut values: Vec<f64> = Vec::with_capacity(accepted.len());
        if accepted.len() > 1 {
            for (i, &pka) in accepted.iter().enumerate() {
                let shifted = charge + i as f64;
                let sigma_nu_sq = 1. + shifted * shifted - (shifted - 1.) * (shifted - 1.);
                values.push(self.adjust_pka(pka, sigma_nu_sq));
            }
        } else if accepted.len() == 1 {
            let sigma_nu_sq = 2. * charge;
            values.push(self.adjust_pka(accepted[0], sigma_nu_sq));
        }

        values.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        values
    }

    /// Shift one pKa by the extended Debye-Huckel activity correction
    fn adjust_pka(&self, pka: f64, sigma_nu_sq: f64) -> f64 {
        let sqrt_i = self.ionic_strength.sqrt();
        let ln_k_zero = 10f64.powf(-pka).ln();
        let correction = sigma_nu_sq * (DEBYE_HUCKEL_A * std::f64::consts::LN_10 * sqrt_i)
            / (1. + self.settings.debye_huckel_b * sqrt_i);
        -(ln_k_zero - correction) / std::f64::consts::LN_10
    }

    /// Formation energy, charge and proton count of the fully deprotonated
    /// species within the pH window, following the MFAToolkit convention
    fn deprotonated_species(&self) -> (f64, f64, f64) {
        let standard = (
            self.entry.delta_gf_std,
            self.entry.charge_std as f64,
            self.entry.nh_std as f64,
        );

        // The proton is never adjusted
        if self.is_proton() {
            return standard;
        }

        let accepted = self
            .entry
            .pka
            .iter()
            .filter(|&&x| self.settings.min_ph < x && x < self.settings.max_ph)
            .count();
        if accepted == 0 {
            return standard;
        }

        // Most negative (fully deprotonated) charge given the pKas below the window top
        let below_max: Vec<f64> = self
            .entry
            .pka
            .iter()
            .copied()
            .filter(|&x| x < self.settings.max_ph)
            .collect();
        let sp_charge = -(below_max.len() as i64);
        let charge = self.entry.charge_std as i64;
        if charge == sp_charge {
            return standard;
        }

        let num_iter = charge - sp_charge;
        let sp_nh = self.entry.nh_std as i64 - num_iter;
        let start = (below_max.len() as i64 - num_iter).max(0) as usize;

        let mut delta_g_sp_a = self.entry.delta_gf_std;
        for &pk in &below_max[start.min(below_max.len())..] {
            delta_g_sp_a -= self.rt * 10f64.powf(-pk).ln();
        }

        (delta_g_sp_a, sp_charge as f64, sp_nh as f64)
    }
}
