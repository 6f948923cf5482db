//! Reaction-level thermodynamic calculators
//!
//! Two estimators for the Gibbs energy of a reaction: the transport branch,
//! summing the non-concentration terms of species moved across membranes, and
//! the structural cue branch, summing group contributions. The preparation
//! pass picks between them per reaction.

use indexmap::IndexMap;
use log::warn;

use crate::metabolic_model::compartment::Compartment;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::Reaction;
use crate::thermo::constants::UNKNOWN_ENERGY_CUTOFF;
use crate::thermo::database::{ThermoDatabase, SEED_PROTON, SEED_WATER};
use crate::thermo::{ThermoError, ThermoSettings};

/// A metabolite species appearing on both sides of a reaction
#[derive(Debug, Clone, PartialEq)]
pub struct TransportedMetabolite {
    /// Larger of the two stoichiometric magnitudes
    pub coeff: f64,
    /// Metabolite id of the consumed side
    pub reactant: String,
    /// Metabolite id of the produced side
    pub product: String,
}

/// Find the metabolite species transported by a reaction, keyed by SEED id
///
/// A species is transported when the same compound appears as a reactant and
/// a product; metabolites without a SEED id cannot be matched and are skipped.
pub fn find_transported_metabolites(
    reaction: &Reaction,
    metabolites: &IndexMap<String, Metabolite>,
) -> IndexMap<String, TransportedMetabolite> {
    let mut reactant_of: IndexMap<&str, (&String, f64)> = IndexMap::new();
    for (met_id, coeff) in reaction.reactants() {
        if let Some(seed_id) = metabolites.get(met_id).and_then(|m| m.seed_id.as_deref()) {
            reactant_of.insert(seed_id, (met_id, coeff));
        }
    }

    let mut transported = IndexMap::new();
    for (met_id, coeff) in reaction.products() {
        if let Some(seed_id) = metabolites.get(met_id).and_then(|m| m.seed_id.as_deref()) {
            if let Some(&(reactant_id, reactant_coeff)) = reactant_of.get(seed_id) {
                transported.insert(
                    seed_id.to_string(),
                    TransportedMetabolite {
                        coeff: reactant_coeff.abs().max(coeff.abs()),
                        reactant: reactant_id.clone(),
                        product: met_id.clone(),
                    },
                );
            }
        }
    }
    transported
}

/// Whether a reaction moves any compound between compartments
///
/// Metabolites without a SEED id cannot be matched across sides, so a
/// reaction touching one is never flagged as transport.
pub fn is_transport_reaction(
    reaction: &Reaction,
    metabolites: &IndexMap<String, Metabolite>,
) -> bool {
    let mut reactant_seeds: Vec<&str> = Vec::new();
    for (met_id, _) in reaction.reactants() {
        match metabolites.get(met_id).and_then(|m| m.seed_id.as_deref()) {
            Some(seed_id) => reactant_seeds.push(seed_id),
            None => return false,
        }
    }
    for (met_id, _) in reaction.products() {
        match metabolites.get(met_id).and_then(|m| m.seed_id.as_deref()) {
            Some(seed_id) => {
                if reactant_seeds.contains(&seed_id) {
                    return true;
                }
            }
            None => return false,
        }
    }
    false
}

/// Breakdown of the non-concentration terms of a transport reaction's ΔG
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransportBreakdown {
    /// Formation energies of the non-transported, non-proton species
    pub sum_delta_gf_is: f64,
    /// Proton stoichiometry correction of the transported species
    pub sum_stoich_nh: f64,
    /// Electrical work of moving charges across the membrane potential
    pub sum_f_mem_p_charge: f64,
    /// Formation energies of the transported species
    pub sum_delta_gf_trans: f64,
    /// Concentration effect of transported protons
    pub rt_sum_h_lc_tpt: f64,
}

impl TransportBreakdown {
    /// Sum of all terms, the right hand side of the ΔG constraint
    pub fn total(&self) -> f64 {
        self.sum_stoich_nh
            + self.sum_f_mem_p_charge
            + self.sum_delta_gf_trans
            + self.rt_sum_h_lc_tpt
            + self.sum_delta_gf_is
    }
}

/// Sum of the non-concentration terms of a transport reaction's ΔG
///
/// Returns None when more than one participating metabolite has an unknown
/// formation energy, in which case no meaningful value exists. Fails when a
/// membrane potential between the two compartments of a transported species
/// is not in the compartment table.
pub fn calc_transport_rhs(
    reaction: &Reaction,
    metabolites: &IndexMap<String, Metabolite>,
    compartments: &IndexMap<String, Compartment>,
    settings: &ThermoSettings,
) -> Result<Option<TransportBreakdown>, ThermoError> {
    let rt = settings.rt();
    let faraday = settings.units.faraday();

    let mut num_unknown = 0;
    for (met_id, _) in &reaction.metabolites {
        let metabolite = metabolites
            .get(met_id)
            .ok_or_else(|| ThermoError::NotPrepared(met_id.clone()))?;
        if metabolite.thermo()?.delta_gf_tr > UNKNOWN_ENERGY_CUTOFF {
            num_unknown += 1;
        }
    }
    if num_unknown > 1 {
        return Ok(None);
    }

    let transported = find_transported_metabolites(reaction, metabolites);
    let mut breakdown = TransportBreakdown::default();

    for (seed_id, entry) in &transported {
        for (met_id, sign) in [(&entry.reactant, -1f64), (&entry.product, 1f64)] {
            let metabolite = metabolites
                .get(met_id)
                .ok_or_else(|| ThermoError::NotPrepared(met_id.clone()))?;
            let thermo = metabolite.thermo()?;

            if seed_id != SEED_WATER {
                let ln_h = 10f64.powf(-thermo.ph).ln();
                breakdown.sum_stoich_nh += sign * entry.coeff * thermo.nh_std * rt * ln_h;
                breakdown.sum_delta_gf_trans += sign * entry.coeff * thermo.delta_gf_tr;
            }
            if seed_id == SEED_PROTON {
                breakdown.rt_sum_h_lc_tpt +=
                    sign * rt * entry.coeff * 10f64.powf(-thermo.ph).ln();
            }
        }
    }

    // Electrical work, with the membrane potential defined as inside minus
    // outside and the charge shared by both sides of the transported pair
    for (seed_id, entry) in &transported {
        if seed_id == SEED_WATER {
            continue;
        }
        let reactant = metabolites
            .get(&entry.reactant)
            .ok_or_else(|| ThermoError::NotPrepared(entry.reactant.clone()))?;
        let product = metabolites
            .get(&entry.product)
            .ok_or_else(|| ThermoError::NotPrepared(entry.product.clone()))?;
        let mem_pot = compartments
            .get(&reactant.compartment)
            .and_then(|c| c.membrane_potential_to(&product.compartment))
            .ok_or_else(|| ThermoError::MissingMembranePotential {
                from: reactant.compartment.clone(),
                to: product.compartment.clone(),
            })?;
        breakdown.sum_f_mem_p_charge +=
            faraday * (mem_pot / 1000.) * entry.coeff * reactant.thermo()?.charge_std;
    }

    // Chemical part: whatever stoichiometry remains after removing the
    // transported pairs, protons excluded
    let mut final_coeffs = reaction.metabolites.clone();
    for entry in transported.values() {
        if let Some(coeff) = final_coeffs.get_mut(&entry.reactant) {
            *coeff += entry.coeff;
        }
        if let Some(coeff) = final_coeffs.get_mut(&entry.product) {
            *coeff -= entry.coeff;
        }
    }
    for (met_id, &coeff) in &final_coeffs {
        let metabolite = metabolites
            .get(met_id)
            .ok_or_else(|| ThermoError::NotPrepared(met_id.clone()))?;
        if coeff != 0. && !metabolite.is_proton() {
            breakdown.sum_delta_gf_is += coeff * metabolite.thermo()?.delta_gf_tr;
        }
    }

    Ok(Some(breakdown))
}

/// Gibbs energy of a reaction estimated from structural cue contributions
#[derive(Debug, Clone, PartialEq)]
pub struct CueEstimate {
    /// Estimated Gibbs energy of the reaction, or the sentinel magnitude
    pub delta_gr: f64,
    /// Error on the estimate, combined in quadrature across cues
    pub delta_gr_err: f64,
    /// Net cue counts over the whole reaction
    pub cues: IndexMap<String, f64>,
    /// Whether some participating compound had no cue decomposition
    pub unknown_groups: bool,
}

/// Estimate the Gibbs energy of a reaction from the cue contributions of its
/// metabolites
pub fn calc_dgr_cues(
    reaction: &Reaction,
    metabolites: &IndexMap<String, Metabolite>,
    thermo_data: &ThermoDatabase,
    settings: &ThermoSettings,
) -> Result<CueEstimate, ThermoError> {
    let unknown = CueEstimate {
        delta_gr: settings.sentinel_energy,
        delta_gr_err: settings.sentinel_energy,
        cues: IndexMap::new(),
        unknown_groups: true,
    };

    let mut cues: IndexMap<String, f64> = IndexMap::new();
    for (met_id, &coeff) in &reaction.metabolites {
        let metabolite = metabolites
            .get(met_id)
            .ok_or_else(|| ThermoError::NotPrepared(met_id.clone()))?;
        let thermo = metabolite.thermo()?;
        if thermo.struct_cues.is_empty() {
            return Ok(unknown);
        }
        for (cue, &count) in &thermo.struct_cues {
            *cues.entry(cue.clone()).or_insert(0.) += coeff * count;
        }
    }

    let mut delta_gr = 0f64;
    let mut err_sq = 0f64;
    for (cue, &count) in &cues {
        match thermo_data.cue(cue) {
            Some(entry) => {
                delta_gr += count * entry.energy;
                err_sq += (count * entry.error).powi(2);
            }
            None => {
                warn!("cue `{}` of reaction `{}` not in the database", cue, reaction.id);
                return Ok(unknown);
            }
        }
    }

    Ok(CueEstimate {
        delta_gr,
        delta_gr_err: err_sq.sqrt(),
        cues,
        unknown_groups: false,
    })
}
