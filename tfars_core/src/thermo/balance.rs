//! Mass and charge balance checking for reactions
//!
//! The checker is a pure function: when the imbalance can be fixed by protons
//! it reports the coefficient to add, and the preparation pass applies it.

use std::sync::LazyLock;

use indexmap::IndexMap;
use log::warn;
use regex::Regex;

use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::Reaction;
use crate::thermo::ThermoError;

/// Atoms tracked by the balance checker, in database order (H is index 3)
const ATOMS: [&str; 26] = [
    "C", "N", "O", "H", "P", "Na", "Mg", "S", "Cl", "K", "Ca", "Mn", "Fe", "Ni", "Co", "Cu", "Zn",
    "As", "Se", "Ag", "Cd", "W", "Hg", "R", "Mo", "X",
];

const HYDROGEN: usize = 3;

static FORMULA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("([A-Z][a-z]*)([0-9]*)").unwrap());

/// Result of checking a reaction's mass and charge balance
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReactionBalance {
    /// Single-metabolite exchange, never balanced or constrained
    DrainFlux,
    /// At least one metabolite has no usable formula
    MissingStructures,
    /// Mass and charge are balanced
    Balanced,
    /// Adding this proton coefficient would balance the reaction
    ProtonsNeeded(f64),
    /// Unbalanced beyond what protons can fix
    MissingAtoms,
}

/// Check the mass and charge balance of a reaction
///
/// `has_proton` reports whether the caller can actually add protons in the
/// reaction's compartment; without one a hydrogen-only imbalance is just
/// unbalanced.
pub fn check_reaction_balance(
    reaction: &Reaction,
    metabolites: &IndexMap<String, Metabolite>,
    has_proton: bool,
) -> Result<ReactionBalance, ThermoError> {
    if reaction.metabolites.len() == 1 {
        return Ok(ReactionBalance::DrainFlux);
    }

    let mut sum_charge = 0f64;
    let mut atoms_sum = [0f64; 26];

    for (met_id, &coeff) in &reaction.metabolites {
        let metabolite = metabolites
            .get(met_id)
            .ok_or_else(|| ThermoError::NotPrepared(met_id.clone()))?;
        let formula = match metabolite.formula.as_deref() {
            None | Some("NA") => return Ok(ReactionBalance::MissingStructures),
            Some(formula) => formula,
        };

        sum_charge += metabolite.thermo()?.charge_std * coeff;

        for capture in FORMULA_RE.captures_iter(formula) {
            let symbol = &capture[1];
            let count = capture[2].parse::<f64>().unwrap_or(1.);
            match ATOMS.iter().position(|&atom| atom == symbol) {
                Some(index) => atoms_sum[index] += coeff * count,
                None => warn!(
                    "unknown atom `{}` in formula `{}` of `{}`",
                    symbol, formula, met_id
                ),
            }
        }
    }

    let unbalanced: Vec<usize> = (0..ATOMS.len())
        .filter(|&i| atoms_sum[i].abs() > 1e-9)
        .collect();

    if unbalanced.is_empty() && sum_charge.abs() < 1e-9 {
        return Ok(ReactionBalance::Balanced);
    }

    // A pure hydrogen imbalance matching the charge imbalance is fixable
    if has_proton
        && unbalanced == [HYDROGEN]
        && (atoms_sum[HYDROGEN] - sum_charge).abs() < 1e-9
    {
        return Ok(ReactionBalance::ProtonsNeeded(-sum_charge));
    }

    Ok(ReactionBalance::MissingAtoms)
}
