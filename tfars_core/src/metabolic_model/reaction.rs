//! This module provides a struct for representing reactions
use derive_builder::Builder;
use indexmap::IndexMap;

use crate::configuration::CONFIGURATION;
use crate::metabolic_model::metabolite::Metabolite;
use crate::thermo::ThermoError;

/// Represents a reaction in the metabolic model
///
/// Stoichiometry is fixed on creation (reactant coefficients negative); the
/// thermodynamic passes only attach the `thermo` annotation and, when the
/// balance checker asks for it, protons.
#[derive(Builder, Debug, Clone)]
#[builder(setter(into))]
pub struct Reaction {
    /// Used to identify the reaction
    pub id: String,
    /// Metabolite stoichiometry of the reaction, metabolite id to coefficient
    #[builder(default = "IndexMap::new()")]
    pub metabolites: IndexMap<String, f64>,
    /// Human-readable reaction name
    #[builder(default)]
    pub name: Option<String>,
    /// Lower flux bound
    #[builder(default = "CONFIGURATION.read().unwrap().lower_bound")]
    pub lower_bound: f64,
    /// Upper flux bound
    #[builder(default = "CONFIGURATION.read().unwrap().upper_bound")]
    pub upper_bound: f64,
    /// Reaction subsystem
    #[builder(default)]
    pub subsystem: Option<String>,
    /// Notes about the reaction
    #[builder(default)]
    pub notes: Option<String>,
    /// Thermodynamic summary, attached by preparation
    #[builder(default)]
    pub thermo: Option<ReactionThermo>,
}

impl Reaction {
    /// A drain (exchange) reaction touches a single metabolite and is never
    /// thermodynamically constrained
    pub fn is_drain(&self) -> bool {
        self.metabolites.len() < 2
    }

    /// Iterate over reactant entries (negative coefficients)
    pub fn reactants(&self) -> impl Iterator<Item = (&String, f64)> {
        self.metabolites
            .iter()
            .filter(|(_, &coeff)| coeff < 0.)
            .map(|(id, &coeff)| (id, coeff))
    }

    /// Iterate over product entries (positive coefficients)
    pub fn products(&self) -> impl Iterator<Item = (&String, f64)> {
        self.metabolites
            .iter()
            .filter(|(_, &coeff)| coeff > 0.)
            .map(|(id, &coeff)| (id, coeff))
    }

    /// Get the thermodynamic summary, failing if the model was never prepared
    pub fn thermo(&self) -> Result<&ReactionThermo, ThermoError> {
        self.thermo
            .as_ref()
            .ok_or(ThermoError::ConversionBeforePreparation)
    }

    /// Whether this reaction only moves water between compartments
    pub fn is_water_transport(&self, metabolites: &IndexMap<String, Metabolite>) -> bool {
        let is_transport = self
            .thermo
            .as_ref()
            .map(|t| t.is_transport)
            .unwrap_or(false);
        if !is_transport {
            return false;
        }
        let mut reactants = self.reactants();
        match (reactants.next(), reactants.next()) {
            (Some((id, _)), None) => metabolites.get(id).map(|m| m.is_water()).unwrap_or(false),
            _ => false,
        }
    }

    /// Determine the upper bound of the variable associated with the forward reaction
    pub(crate) fn get_forward_upper_bound(&self) -> f64 {
        if self.upper_bound > 0f64 {
            self.upper_bound
        } else {
            0f64
        }
    }

    /// Determine the lower bound of the variable associated with the forward reaction
    pub(crate) fn get_forward_lower_bound(&self) -> f64 {
        if self.lower_bound > 0f64 {
            self.lower_bound
        } else {
            0f64
        }
    }

    /// Determine the upper bound of the variable associated with the reverse reaction
    pub(crate) fn get_reverse_upper_bound(&self) -> f64 {
        if self.lower_bound < 0f64 {
            -self.lower_bound
        } else {
            0f64
        }
    }

    /// Determine the lower bound of the variable associated with the reverse reaction
    pub(crate) fn get_reverse_lower_bound(&self) -> f64 {
        if self.upper_bound < 0f64 {
            -self.upper_bound
        } else {
            0f64
        }
    }
}

/// Thermodynamic summary of a reaction, set during preparation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactionThermo {
    /// Whether thermodynamic constraints apply to this reaction
    pub computed: bool,
    /// Whether the reaction moves a species between compartments
    pub is_transport: bool,
    /// Standard Gibbs energy of the reaction, or the sentinel magnitude when unknown
    pub delta_gr: f64,
    /// Uncertainty on the standard Gibbs energy of the reaction
    pub delta_gr_err: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stoich(entries: &[(&str, f64)]) -> IndexMap<String, f64> {
        entries
            .iter()
            .map(|(id, coeff)| (id.to_string(), *coeff))
            .collect()
    }

    #[test]
    fn reactants_and_products() {
        let reaction = ReactionBuilder::default()
            .id("PGI")
            .metabolites(stoich(&[("g6p_c", -1.), ("f6p_c", 1.)]))
            .build()
            .unwrap();
        assert!(!reaction.is_drain());
        assert_eq!(
            reaction.reactants().map(|(id, _)| id.clone()).collect::<Vec<_>>(),
            vec!["g6p_c"]
        );
        assert_eq!(
            reaction.products().map(|(id, _)| id.clone()).collect::<Vec<_>>(),
            vec!["f6p_c"]
        );
    }

    #[test]
    fn drains() {
        let drain = ReactionBuilder::default()
            .id("EX_glc")
            .metabolites(stoich(&[("glc_e", -1.)]))
            .build()
            .unwrap();
        assert!(drain.is_drain());
    }

    #[test]
    fn water_transport_detection() {
        use crate::metabolic_model::metabolite::MetaboliteBuilder;

        let mut metabolites = IndexMap::new();
        for (id, formula) in [
            ("h2o_e", "H2O"),
            ("h2o_c", "H2O"),
            ("glc_e", "C6H12O6"),
            ("glc_c", "C6H12O6"),
        ] {
            metabolites.insert(
                id.to_string(),
                MetaboliteBuilder::default()
                    .id(id)
                    .compartment(&id[id.len() - 1..])
                    .formula(Some(formula.to_string()))
                    .build()
                    .unwrap(),
            );
        }
        let transport = ReactionThermo {
            computed: true,
            is_transport: true,
            delta_gr: 0.,
            delta_gr_err: 2.,
        };

        let mut h2ot = ReactionBuilder::default()
            .id("H2Ot")
            .metabolites(stoich(&[("h2o_e", -1.), ("h2o_c", 1.)]))
            .build()
            .unwrap();
        // Unprepared reactions are never water transport
        assert!(!h2ot.is_water_transport(&metabolites));
        h2ot.thermo = Some(transport);
        assert!(h2ot.is_water_transport(&metabolites));

        let mut glct = ReactionBuilder::default()
            .id("GLCt")
            .metabolites(stoich(&[("glc_e", -1.), ("glc_c", 1.)]))
            .build()
            .unwrap();
        glct.thermo = Some(transport);
        assert!(!glct.is_water_transport(&metabolites));

        // Water consumed by a non-transport reaction doesn't count
        let mut hydrolysis = ReactionBuilder::default()
            .id("HYD")
            .metabolites(stoich(&[("h2o_c", -1.), ("glc_c", 1.)]))
            .build()
            .unwrap();
        hydrolysis.thermo = Some(ReactionThermo {
            is_transport: false,
            ..transport
        });
        assert!(!hydrolysis.is_water_transport(&metabolites));
    }

    #[test]
    fn split_flux_bounds() {
        let reaction = ReactionBuilder::default()
            .id("PGI")
            .metabolites(stoich(&[("g6p_c", -1.), ("f6p_c", 1.)]))
            .lower_bound(-20.)
            .upper_bound(50.)
            .build()
            .unwrap();
        assert_eq!(reaction.get_forward_lower_bound(), 0.);
        assert_eq!(reaction.get_forward_upper_bound(), 50.);
        assert_eq!(reaction.get_reverse_lower_bound(), 0.);
        assert_eq!(reaction.get_reverse_upper_bound(), 20.);

        let irreversible = ReactionBuilder::default()
            .id("PFK")
            .lower_bound(0.)
            .upper_bound(1000.)
            .build()
            .unwrap();
        assert_eq!(irreversible.get_reverse_upper_bound(), 0.);
    }
}
