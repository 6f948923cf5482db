//! Preparation and conversion of a [`ThermoModel`]
//!
//! [`ThermoModel::prepare`] annotates every metabolite and reaction with its
//! thermodynamic data; [`ThermoModel::convert`] then builds the mixed-integer
//! problem coupling fluxes, Gibbs energies and log concentrations.

use indexmap::IndexMap;
use log::{debug, info};

use crate::configuration::CONFIGURATION;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::ThermoModel;
use crate::metabolic_model::reaction::{Reaction, ReactionThermo};
use crate::optimize::constraint::ConstraintKind;
use crate::optimize::staging::ProblemBuilder;
use crate::optimize::variable::VariableKind;
use crate::thermo::balance::{check_reaction_balance, ReactionBalance};
use crate::thermo::constants::{DEFAULT_DELTA_GR_ERROR, MAX_THERMO_METABOLITES};
use crate::thermo::metabolite::MetaboliteThermo;
use crate::thermo::reaction::{
    calc_dgr_cues, calc_transport_rhs, find_transported_metabolites, is_transport_reaction,
};
use crate::thermo::{ThermoError, ThermoSettings};

impl ThermoModel {
    /// Annotate the model with thermodynamic data
    ///
    /// For every metabolite, matches it against the reference database and
    /// computes its transformed Gibbs energy of formation at the compartment
    /// conditions. For every reaction, checks the mass balance (adding protons
    /// when that fixes it), detects transport, and computes the Gibbs energy
    /// of reaction and its error. Running it again recomputes everything.
    pub fn prepare(&mut self) -> Result<(), ThermoError> {
        info!("model preparation starting");
        let settings = self.thermo_settings();

        self.prepare_metabolites(&settings)?;
        self.index_protons()?;

        let reaction_ids: Vec<String> = self.reactions.keys().cloned().collect();
        for reaction_id in reaction_ids {
            self.prepare_reaction(&reaction_id, &settings)?;
        }

        info!(
            "model preparation done: {}/{} metabolites and {}/{} reactions have thermodynamic data",
            self.num_thermo_metabolites(),
            self.metabolites.len(),
            self.num_thermo_reactions(),
            self.reactions.len()
        );
        Ok(())
    }

    fn prepare_metabolites(&mut self, settings: &ThermoSettings) -> Result<(), ThermoError> {
        let compartments = &self.compartments;
        let thermo_data = &self.thermo_data;

        for metabolite in self.metabolites.values_mut() {
            let compartment = compartments.get(&metabolite.compartment).ok_or_else(|| {
                ThermoError::UnknownCompartment {
                    metabolite: metabolite.id.clone(),
                    compartment: metabolite.compartment.clone(),
                }
            })?;

            let entry = match metabolite.seed_id.as_deref() {
                None => {
                    debug!("metabolite `{}` has no SEED id", metabolite.id);
                    None
                }
                Some(seed_id) => match thermo_data.compound(seed_id) {
                    None => {
                        debug!("compound `{}` not in the reference database", seed_id);
                        None
                    }
                    Some(entry) => Some(entry),
                },
            };

            // The database formula takes precedence over the model's
            if let Some(entry) = entry {
                if entry.formula.is_some() {
                    metabolite.formula = entry.formula.clone();
                }
            }

            metabolite.thermo = Some(MetaboliteThermo::compute(
                entry,
                compartment.ph,
                compartment.ionic_strength,
                settings,
            ));
        }
        Ok(())
    }

    fn index_protons(&mut self) -> Result<(), ThermoError> {
        self.proton_of = self
            .metabolites
            .values()
            .filter(|met| met.is_proton())
            .map(|met| (met.compartment.clone(), met.id.clone()))
            .collect();
        if self.proton_of.is_empty() {
            return Err(ThermoError::MissingProton);
        }
        Ok(())
    }

    fn prepare_reaction(
        &mut self,
        reaction_id: &str,
        settings: &ThermoSettings,
    ) -> Result<(), ThermoError> {
        let (balance, compartment) = {
            let Some(reaction) = self.reactions.get(reaction_id) else {
                return Ok(());
            };
            let compartment = reaction_compartment(reaction, &self.metabolites);
            let has_proton = compartment
                .as_deref()
                .map(|c| self.proton_of.contains_key(c))
                .unwrap_or(false);
            (
                check_reaction_balance(reaction, &self.metabolites, has_proton)?,
                compartment,
            )
        };

        // Fix a pure hydrogen imbalance with the compartment's proton
        if let ReactionBalance::ProtonsNeeded(coeff) = balance {
            if let Some(proton_id) = compartment
                .as_deref()
                .and_then(|c| self.proton_of.get(c))
                .cloned()
            {
                if let Some(reaction) = self.reactions.get_mut(reaction_id) {
                    debug!(
                        "adding {} protons to balance reaction `{}`",
                        coeff, reaction.id
                    );
                    *reaction.metabolites.entry(proton_id).or_insert(0.) += coeff;
                }
            }
        }

        let summary = {
            let Some(reaction) = self.reactions.get(reaction_id) else {
                return Ok(());
            };
            self.compute_reaction_thermo(reaction, balance, settings)?
        };
        if let Some(reaction) = self.reactions.get_mut(reaction_id) {
            reaction.thermo = Some(summary);
        }
        Ok(())
    }

    fn compute_reaction_thermo(
        &self,
        reaction: &Reaction,
        balance: ReactionBalance,
        settings: &ThermoSettings,
    ) -> Result<ReactionThermo, ThermoError> {
        let is_transport = is_transport_reaction(reaction, &self.metabolites);

        let mut usable_values = true;
        for (met_id, _) in &reaction.metabolites {
            let metabolite = self
                .metabolites
                .get(met_id)
                .ok_or_else(|| ThermoError::NotPrepared(met_id.clone()))?;
            let thermo = metabolite.thermo()?;
            if thermo.delta_gf_std > 0.9 * settings.sentinel_energy
                || !thermo.has_transformed_energy()
            {
                usable_values = false;
                break;
            }
        }

        let excluded_by_balance = matches!(
            balance,
            ReactionBalance::DrainFlux
                | ReactionBalance::MissingAtoms
                | ReactionBalance::MissingStructures
        );

        if reaction.is_drain()
            || !usable_values
            || reaction.metabolites.len() >= MAX_THERMO_METABOLITES
            || excluded_by_balance
        {
            debug!("`{}`: no thermodynamic constraint", reaction.id);
            return Ok(ReactionThermo {
                computed: false,
                is_transport,
                delta_gr: settings.sentinel_energy,
                delta_gr_err: settings.sentinel_energy,
            });
        }

        let delta_gr = if is_transport {
            match calc_transport_rhs(reaction, &self.metabolites, &self.compartments, settings)? {
                Some(breakdown) => breakdown.total(),
                None => {
                    // Too many unknown formation energies to anchor the value
                    debug!("`{}`: transport ΔG could not be computed", reaction.id);
                    return Ok(ReactionThermo {
                        computed: false,
                        is_transport,
                        delta_gr: settings.sentinel_energy,
                        delta_gr_err: settings.sentinel_energy,
                    });
                }
            }
        } else {
            let mut delta_gr = 0f64;
            for (met_id, &coeff) in &reaction.metabolites {
                let metabolite = self
                    .metabolites
                    .get(met_id)
                    .ok_or_else(|| ThermoError::NotPrepared(met_id.clone()))?;
                if !metabolite.is_proton() && !metabolite.is_water() {
                    delta_gr += coeff * metabolite.thermo()?.delta_gf_tr;
                }
            }
            delta_gr
        };

        // Cue-based error when the cues resolve, formation errors otherwise
        let estimate = calc_dgr_cues(reaction, &self.metabolites, &self.thermo_data, settings)?;
        let mut delta_gr_err = if estimate.unknown_groups {
            let mut err = 0f64;
            for (met_id, &coeff) in &reaction.metabolites {
                let metabolite = self
                    .metabolites
                    .get(met_id)
                    .ok_or_else(|| ThermoError::NotPrepared(met_id.clone()))?;
                if !metabolite.is_proton() && !metabolite.is_water() {
                    err += (coeff * metabolite.thermo()?.delta_gf_err).abs();
                }
            }
            err
        } else {
            estimate.delta_gr_err
        };
        if delta_gr_err == 0. {
            delta_gr_err = DEFAULT_DELTA_GR_ERROR;
        }

        debug!("`{}`: ΔGr = {} ± {}", reaction.id, delta_gr, delta_gr_err);
        Ok(ReactionThermo {
            computed: true,
            is_transport,
            delta_gr,
            delta_gr_err,
        })
    }

    /// Build the thermodynamically constrained optimization problem
    ///
    /// Every reaction gets split flux variables coupled to binary use
    /// variables; reactions with computed thermodynamics additionally get ΔG
    /// variables tied to the log concentrations of their metabolites, and the
    /// use variables are only allowed in the direction of negative ΔG. With
    /// `add_displacement`, a ln(Γ) variable tracking ΔG/RT is added per
    /// constrained reaction.
    pub fn convert(&mut self, add_displacement: bool) -> Result<(), ThermoError> {
        info!("model conversion starting");
        let (big_m, big_m_thermo, big_m_p, epsilon, strict_bounds) = {
            let config = CONFIGURATION.read().unwrap();
            (
                config.big_m,
                config.big_m_thermo,
                config.big_m_p,
                config.tolerance,
                config.strict_bounds,
            )
        };
        let rt = self.rt();

        for reaction in self.reactions.values() {
            if reaction.thermo.is_none() {
                return Err(ThermoError::ConversionBeforePreparation);
            }
        }

        // Flux bounds must fit inside the big M couplings
        for reaction in self.reactions.values_mut() {
            if reaction.lower_bound < -big_m || reaction.upper_bound > big_m {
                if strict_bounds {
                    return Err(ThermoError::FluxBoundsExceedBigM(reaction.id.clone()));
                }
                debug!("clamping flux bounds of `{}` to ±{}", reaction.id, big_m);
                reaction.lower_bound = reaction.lower_bound.max(-big_m);
                reaction.upper_bound = reaction.upper_bound.min(big_m);
            }
        }

        let mut builder = ProblemBuilder::new();
        let mut lc_ids: IndexMap<String, String> = IndexMap::new();

        for metabolite in self.metabolites.values() {
            self.convert_metabolite(metabolite, &mut builder, &mut lc_ids)?;
        }
        for reaction in self.reactions.values() {
            self.convert_reaction(
                reaction,
                &mut builder,
                &lc_ids,
                rt,
                big_m,
                big_m_thermo,
                big_m_p,
                epsilon,
                add_displacement,
            )?;
        }

        let problem = builder.commit()?;
        info!(
            "model conversion done: {} variables, {} constraints",
            problem.num_variables(),
            problem.num_constraints()
        );
        self.problem = Some(problem);
        Ok(())
    }

    fn convert_metabolite(
        &self,
        metabolite: &Metabolite,
        builder: &mut ProblemBuilder,
        lc_ids: &mut IndexMap<String, String>,
    ) -> Result<(), ThermoError> {
        let compartment = self.compartment_of(metabolite)?;
        let kind = VariableKind::LogConcentration {
            metabolite: metabolite.id.clone(),
        };

        // Water activity is fixed to 1, protons are fixed by the compartment
        // pH, and the biomass pseudo-metabolite gets no variable at all
        if metabolite.is_water() {
            let id = builder.stage_variable(kind, 0., 0.);
            lc_ids.insert(metabolite.id.clone(), id);
        } else if metabolite.is_proton() {
            let ln_h = 10f64.powf(-compartment.ph).ln();
            let id = builder.stage_variable(kind, ln_h, ln_h);
            lc_ids.insert(metabolite.id.clone(), id);
        } else if metabolite.is_biomass() {
            debug!("no concentration variable for biomass `{}`", metabolite.id);
        } else if metabolite.thermo()?.has_transformed_energy() {
            let id = builder.stage_variable(
                kind,
                compartment.c_min.ln(),
                compartment.c_max.ln(),
            );
            lc_ids.insert(metabolite.id.clone(), id);
        } else {
            debug!(
                "no concentration variable for `{}`, formation energy unknown",
                metabolite.id
            );
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn convert_reaction(
        &self,
        reaction: &Reaction,
        builder: &mut ProblemBuilder,
        lc_ids: &IndexMap<String, String>,
        rt: f64,
        big_m: f64,
        big_m_thermo: f64,
        big_m_p: f64,
        epsilon: f64,
        add_displacement: bool,
    ) -> Result<(), ThermoError> {
        let thermo = reaction.thermo()?;
        let water_transport = reaction.is_water_transport(&self.metabolites);

        let forward_flux = builder.stage_variable(
            VariableKind::ForwardFlux {
                reaction: reaction.id.clone(),
            },
            reaction.get_forward_lower_bound(),
            reaction.get_forward_upper_bound(),
        );
        let reverse_flux = builder.stage_variable(
            VariableKind::ReverseFlux {
                reaction: reaction.id.clone(),
            },
            reaction.get_reverse_lower_bound(),
            reaction.get_reverse_upper_bound(),
        );
        let forward_use = builder.stage_variable(
            VariableKind::ForwardUse {
                reaction: reaction.id.clone(),
            },
            0.,
            1.,
        );
        let backward_use = builder.stage_variable(
            VariableKind::BackwardUse {
                reaction: reaction.id.clone(),
            },
            0.,
            1.,
        );

        if thermo.computed && !water_transport {
            debug!("`{}`: building thermodynamic constraints", reaction.id);
            let delta_g = builder.stage_variable(
                VariableKind::DeltaG {
                    reaction: reaction.id.clone(),
                },
                -big_m_thermo,
                big_m_thermo,
            );
            let delta_g_std = builder.stage_variable(
                VariableKind::DeltaGStd {
                    reaction: reaction.id.clone(),
                },
                thermo.delta_gr - thermo.delta_gr_err,
                thermo.delta_gr + thermo.delta_gr_err,
            );

            // G: DGo - DG + RT * sum(coeff * LC) = 0
            let mut lc_terms: IndexMap<String, f64> = IndexMap::new();
            self.collect_concentration_terms(reaction, thermo.is_transport, rt, &mut lc_terms)?;

            let mut variables = vec![delta_g_std.clone(), delta_g.clone()];
            let mut coefficients = vec![1., -1.];
            for (met_id, coefficient) in lc_terms {
                let lc = lc_ids
                    .get(&met_id)
                    .ok_or_else(|| ThermoError::NotPrepared(met_id.clone()))?;
                variables.push(lc.clone());
                coefficients.push(coefficient);
            }
            builder.stage_equality(
                ConstraintKind::NegativeDeltaG,
                &reaction.id,
                variables,
                coefficients,
                0.,
            );

            if add_displacement {
                let ln_gamma = builder.stage_variable(
                    VariableKind::ThermoDisplacement {
                        reaction: reaction.id.clone(),
                    },
                    -big_m_p,
                    big_m_p,
                );
                // ln(Γ) = ΔG / RT
                builder.stage_equality(
                    ConstraintKind::DisplacementCoupling,
                    &reaction.id,
                    vec![ln_gamma, delta_g.clone()],
                    vec![1., -1. / rt],
                    0.,
                );
            }

            // FU: ΔG + M * FU <= M - epsilon, so FU = 1 forces ΔG < 0
            builder.stage_inequality(
                ConstraintKind::ForwardDeltaGCoupling,
                &reaction.id,
                vec![delta_g.clone(), forward_use.clone()],
                vec![1., big_m_thermo],
                f64::NEG_INFINITY,
                big_m_thermo - epsilon,
            );
            // BU: M * BU - ΔG <= M - epsilon, so BU = 1 forces ΔG > 0
            builder.stage_inequality(
                ConstraintKind::BackwardDeltaGCoupling,
                &reaction.id,
                vec![backward_use.clone(), delta_g],
                vec![big_m_thermo, -1.],
                f64::NEG_INFINITY,
                big_m_thermo - epsilon,
            );
        } else {
            debug!("`{}`: building only use constraints", reaction.id);
        }

        // SU: FU + BU <= 1
        builder.stage_inequality(
            ConstraintKind::SimultaneousUse,
            &reaction.id,
            vec![forward_use.clone(), backward_use.clone()],
            vec![1., 1.],
            f64::NEG_INFINITY,
            1.,
        );
        // UF: F - M * FU <= 0
        builder.stage_inequality(
            ConstraintKind::ForwardDirectionCoupling,
            &reaction.id,
            vec![forward_flux, forward_use],
            vec![1., -big_m],
            f64::NEG_INFINITY,
            0.,
        );
        // UR: R - M * BU <= 0
        builder.stage_inequality(
            ConstraintKind::BackwardDirectionCoupling,
            &reaction.id,
            vec![reverse_flux, backward_use],
            vec![1., -big_m],
            f64::NEG_INFINITY,
            0.,
        );
        Ok(())
    }

    /// Accumulate the RT-scaled log concentration coefficients of the ΔG
    /// constraint, coalescing metabolites hit by both the transport and the
    /// chemical part
    fn collect_concentration_terms(
        &self,
        reaction: &Reaction,
        is_transport: bool,
        rt: f64,
        terms: &mut IndexMap<String, f64>,
    ) -> Result<(), ThermoError> {
        if is_transport {
            let transported = find_transported_metabolites(reaction, &self.metabolites);
            let mut chem_stoich = reaction.metabolites.clone();

            for entry in transported.values() {
                for (met_id, sign) in [(&entry.reactant, -1f64), (&entry.product, 1f64)] {
                    let metabolite = self
                        .metabolites
                        .get(met_id)
                        .ok_or_else(|| ThermoError::NotPrepared(met_id.clone()))?;
                    if !metabolite.is_proton() {
                        *terms.entry(met_id.clone()).or_insert(0.) +=
                            sign * entry.coeff * rt;
                    }
                    if let Some(coeff) = chem_stoich.get_mut(met_id) {
                        *coeff -= sign * entry.coeff;
                    }
                }
            }

            for (met_id, &coeff) in &chem_stoich {
                let metabolite = self
                    .metabolites
                    .get(met_id)
                    .ok_or_else(|| ThermoError::NotPrepared(met_id.clone()))?;
                if coeff != 0. && !metabolite.is_proton() && !metabolite.is_water() {
                    *terms.entry(met_id.clone()).or_insert(0.) += coeff * rt;
                }
            }
        } else {
            for (met_id, &coeff) in &reaction.metabolites {
                let metabolite = self
                    .metabolites
                    .get(met_id)
                    .ok_or_else(|| ThermoError::NotPrepared(met_id.clone()))?;
                if !metabolite.is_proton() && !metabolite.is_water() {
                    *terms.entry(met_id.clone()).or_insert(0.) += coeff * rt;
                }
            }
        }
        Ok(())
    }
}

/// Compartment a reaction nominally happens in: the shared compartment of its
/// metabolites, or the cytosol when they are spread across several
fn reaction_compartment(
    reaction: &Reaction,
    metabolites: &IndexMap<String, Metabolite>,
) -> Option<String> {
    let mut compartment: Option<&str> = None;
    for (met_id, _) in &reaction.metabolites {
        let Some(metabolite) = metabolites.get(met_id) else {
            continue;
        };
        match compartment {
            None => compartment = Some(&metabolite.compartment),
            Some(c) if c != metabolite.compartment => return Some("c".to_string()),
            Some(_) => {}
        }
    }
    compartment.map(str::to_string)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::metabolic_model::compartment::CompartmentBuilder;
    use crate::metabolic_model::metabolite::MetaboliteBuilder;
    use crate::metabolic_model::reaction::ReactionBuilder;
    use crate::thermo::database::{CompoundEntry, CueEntry, EnergyUnit, ThermoDatabase};
    use approx::assert_relative_eq;

    fn compound(id: &str, formula: &str, dgf: f64, charge: i32, nh: i32) -> CompoundEntry {
        CompoundEntry {
            id: id.to_string(),
            name: None,
            formula: Some(formula.to_string()),
            delta_gf_std: dgf,
            delta_gf_err: 2.0,
            mass: 100.0,
            charge_std: charge,
            nh_std: nh,
            pka: vec![],
            struct_cues: [("Origin".to_string(), 1.)].into_iter().collect(),
            error: "Nil".to_string(),
        }
    }

    fn test_database() -> ThermoDatabase {
        let mut metabolites = IndexMap::new();
        metabolites.insert(
            "cpd00001".to_string(),
            compound("cpd00001", "H2O", -237.0, 0, 2),
        );
        metabolites.insert("cpd00067".to_string(), compound("cpd00067", "H", 0.0, 1, 1));
        metabolites.insert(
            "cpd00027".to_string(),
            compound("cpd00027", "C6H12O6", -400.0, 0, 12),
        );
        metabolites.insert(
            "cpd00082".to_string(),
            compound("cpd00082", "C6H12O6", -400.0, 0, 12),
        );
        metabolites.insert(
            "cpd00221".to_string(),
            compound("cpd00221", "C6H11O6", -380.0, -1, 11),
        );

        let mut cues = IndexMap::new();
        cues.insert(
            "Origin".to_string(),
            CueEntry {
                energy: 0.0,
                error: 0.0,
            },
        );

        ThermoDatabase {
            name: Some("test".to_string()),
            units: EnergyUnit::KjPerMol,
            metabolites,
            cues,
        }
    }

    fn met(id: &str, compartment: &str, seed_id: Option<&str>) -> Metabolite {
        MetaboliteBuilder::default()
            .id(id)
            .compartment(compartment)
            .seed_id(seed_id.map(str::to_string))
            .build()
            .unwrap()
    }

    fn reaction(id: &str, entries: &[(&str, f64)]) -> Reaction {
        ReactionBuilder::default()
            .id(id)
            .metabolites(
                entries
                    .iter()
                    .map(|(met, coeff)| (met.to_string(), *coeff))
                    .collect::<IndexMap<String, f64>>(),
            )
            .build()
            .unwrap()
    }

    fn test_model() -> ThermoModel {
        let mut model = ThermoModel::new(test_database());

        model.add_compartment(
            CompartmentBuilder::default()
                .id("c")
                .ph(7.0)
                .ionic_strength(0.25)
                .c_min(1e-8)
                .c_max(0.02)
                .membrane_potential(
                    [("e".to_string(), -60.)].into_iter().collect::<IndexMap<_, _>>(),
                )
                .build()
                .unwrap(),
        );
        model.add_compartment(
            CompartmentBuilder::default()
                .id("e")
                .ph(7.0)
                .ionic_strength(0.25)
                .c_min(1e-8)
                .c_max(0.02)
                .membrane_potential(
                    [("c".to_string(), 60.)].into_iter().collect::<IndexMap<_, _>>(),
                )
                .build()
                .unwrap(),
        );

        model.add_metabolite(met("glc_e", "e", Some("cpd00027")));
        model.add_metabolite(met("glc_c", "c", Some("cpd00027")));
        model.add_metabolite(met("fru_c", "c", Some("cpd00082")));
        model.add_metabolite(met("gln_c", "c", Some("cpd00221")));
        model.add_metabolite(met("h_c", "c", Some("cpd00067")));
        model.add_metabolite(met("h2o_c", "c", Some("cpd00001")));
        model.add_metabolite(met("orphan_c", "c", None));

        // Isomerisation, transport, drain, deprotonation, unknown partner
        model.add_reaction(reaction("ISO", &[("glc_c", -1.), ("fru_c", 1.)]));
        model.add_reaction(reaction("GLCt", &[("glc_e", -1.), ("glc_c", 1.)]));
        model.add_reaction(reaction("EX_glc", &[("glc_e", -1.)]));
        model.add_reaction(reaction("GLNS", &[("glc_c", -1.), ("gln_c", 1.)]));
        model.add_reaction(reaction("ORPH", &[("glc_c", -1.), ("orphan_c", 1.)]));
        model
    }

    #[test]
    fn preparation_annotates_everything() {
        let mut model = test_model();
        model.prepare().unwrap();

        // Formula pulled from the database
        assert_eq!(model.metabolites["glc_c"].formula.as_deref(), Some("C6H12O6"));
        assert!(model.metabolites["orphan_c"].thermo().unwrap().seed_id.is_none());

        let iso = model.reactions["ISO"].thermo().unwrap();
        assert!(iso.computed);
        assert!(!iso.is_transport);
        // Identical formation data on both sides, so ΔGr is 0 and the error
        // falls back to the default
        assert_relative_eq!(iso.delta_gr, 0., epsilon = 1e-9);
        assert_eq!(iso.delta_gr_err, DEFAULT_DELTA_GR_ERROR);

        let transport = model.reactions["GLCt"].thermo().unwrap();
        assert!(transport.computed);
        assert!(transport.is_transport);
        // Same compound, same conditions on both sides, no charge
        assert_relative_eq!(transport.delta_gr, 0., epsilon = 1e-9);

        let drain = model.reactions["EX_glc"].thermo().unwrap();
        assert!(!drain.computed);

        let orphan = model.reactions["ORPH"].thermo().unwrap();
        assert!(!orphan.computed);
    }

    #[test]
    fn preparation_adds_protons() {
        let mut model = test_model();
        model.prepare().unwrap();

        // glc -> gln- + H+
        let glns = &model.reactions["GLNS"];
        assert_eq!(glns.metabolites.get("h_c"), Some(&1.));
        assert!(glns.thermo().unwrap().computed);
    }

    #[test]
    fn preparation_is_idempotent() {
        let mut model = test_model();
        model.prepare().unwrap();
        let stoich_first = model.reactions["GLNS"].metabolites.clone();
        let thermo_first = *model.reactions["ISO"].thermo().unwrap();

        model.prepare().unwrap();
        assert_eq!(model.reactions["GLNS"].metabolites, stoich_first);
        assert_eq!(*model.reactions["ISO"].thermo().unwrap(), thermo_first);
    }

    #[test]
    fn missing_proton_is_fatal() {
        let mut model = test_model();
        model.metabolites.shift_remove("h_c");
        model.reactions.shift_remove("GLNS");
        assert!(matches!(model.prepare(), Err(ThermoError::MissingProton)));
    }

    #[test]
    fn unknown_compartment_is_fatal() {
        let mut model = test_model();
        model.add_metabolite(met("lost_x", "x", None));
        assert!(matches!(
            model.prepare(),
            Err(ThermoError::UnknownCompartment { .. })
        ));
    }

    #[test]
    fn conversion_before_preparation_fails() {
        let mut model = test_model();
        assert!(matches!(
            model.convert(false),
            Err(ThermoError::ConversionBeforePreparation)
        ));
    }

    #[test]
    fn conversion_builds_the_problem() {
        let mut model = test_model();
        model.prepare().unwrap();
        model.convert(false).unwrap();
        let problem = model.problem.as_ref().unwrap();

        // Water activity pinned to 1, proton concentration pinned by the pH
        let lc_water = problem.get_variable("LC_h2o_c").unwrap();
        assert_eq!(lc_water.read().unwrap().lower_bound, 0.);
        assert_eq!(lc_water.read().unwrap().upper_bound, 0.);
        let lc_proton = problem.get_variable("LC_h_c").unwrap();
        let ln_h = 10f64.powf(-7.0).ln();
        assert_relative_eq!(lc_proton.read().unwrap().lower_bound, ln_h);
        assert_relative_eq!(lc_proton.read().unwrap().upper_bound, ln_h);

        // No concentration variable without a formation energy
        assert!(problem.get_variable("LC_orphan_c").is_none());

        // Constrained reaction: the full variable and constraint complement
        for id in ["F_ISO", "R_ISO", "FU_ISO", "BU_ISO", "DG_ISO", "DGo_ISO"] {
            assert!(problem.get_variable(id).is_some(), "missing {}", id);
        }
        for id in ["G_ISO", "FU_ISO", "BU_ISO", "SU_ISO", "UF_ISO", "UR_ISO"] {
            assert!(problem.get_constraint(id).is_some(), "missing {}", id);
        }
        let dgo = problem.get_variable("DGo_ISO").unwrap();
        assert_relative_eq!(dgo.read().unwrap().lower_bound, -DEFAULT_DELTA_GR_ERROR);
        assert_relative_eq!(dgo.read().unwrap().upper_bound, DEFAULT_DELTA_GR_ERROR);

        // Unconstrained reactions still get their use machinery
        for id in ["FU_EX_glc", "BU_EX_glc"] {
            assert!(problem.get_variable(id).is_some(), "missing {}", id);
        }
        for id in ["SU_EX_glc", "UF_EX_glc", "UR_EX_glc"] {
            assert!(problem.get_constraint(id).is_some(), "missing {}", id);
        }
        assert!(problem.get_variable("DG_EX_glc").is_none());
        assert!(problem.get_constraint("G_EX_glc").is_none());
        assert!(problem.get_variable("DG_ORPH").is_none());

        // Transport reaction is constrained too
        assert!(problem.get_constraint("G_GLCt").is_some());

        // No displacement variables unless asked for
        assert!(problem.get_variable("LnGamma_ISO").is_none());
    }

    #[test]
    fn conversion_with_displacement() {
        let mut model = test_model();
        model.prepare().unwrap();
        model.convert(true).unwrap();
        let problem = model.problem.as_ref().unwrap();
        assert!(problem.get_variable("LnGamma_ISO").is_some());
        assert!(problem.get_constraint("DC_ISO").is_some());
        assert!(problem.get_constraint("DC_EX_glc").is_none());
    }

    #[test]
    fn conversion_skips_water_transport() {
        let mut model = test_model();
        model.add_metabolite(met("h2o_e", "e", Some("cpd00001")));
        model.add_reaction(reaction("H2Ot", &[("h2o_e", -1.), ("h2o_c", 1.)]));
        model.prepare().unwrap();
        model.convert(false).unwrap();

        assert!(model.reactions["H2Ot"].thermo().unwrap().is_transport);
        assert!(model.reactions["H2Ot"].is_water_transport(&model.metabolites));

        // Use machinery only, no Gibbs energy coupling
        let problem = model.problem.as_ref().unwrap();
        for id in ["F_H2Ot", "R_H2Ot", "FU_H2Ot", "BU_H2Ot"] {
            assert!(problem.get_variable(id).is_some(), "missing {}", id);
        }
        for id in ["SU_H2Ot", "UF_H2Ot", "UR_H2Ot"] {
            assert!(problem.get_constraint(id).is_some(), "missing {}", id);
        }
        assert!(problem.get_variable("DG_H2Ot").is_none());
        assert!(problem.get_variable("DGo_H2Ot").is_none());
        assert!(problem.get_constraint("G_H2Ot").is_none());
    }

    // Serializes the tests that depend on `Configuration::strict_bounds`
    static CONFIG_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn conversion_clamps_wide_bounds() {
        let _guard = CONFIG_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut model = test_model();
        if let Some(reaction) = model.reactions.get_mut("ISO") {
            reaction.lower_bound = -5000.;
            reaction.upper_bound = 5000.;
        }
        model.prepare().unwrap();
        model.convert(false).unwrap();
        assert_eq!(model.reactions["ISO"].lower_bound, -1000.);
        assert_eq!(model.reactions["ISO"].upper_bound, 1000.);
        let problem = model.problem.as_ref().unwrap();
        let forward = problem.get_variable("F_ISO").unwrap();
        assert_eq!(forward.read().unwrap().upper_bound, 1000.);
    }

    #[test]
    fn strict_bounds_rejects_wide_bounds() {
        let _guard = CONFIG_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut model = test_model();
        if let Some(reaction) = model.reactions.get_mut("ISO") {
            reaction.lower_bound = -5000.;
            reaction.upper_bound = 5000.;
        }
        model.prepare().unwrap();

        CONFIGURATION.write().unwrap().strict_bounds = true;
        let result = model.convert(false);
        CONFIGURATION.write().unwrap().strict_bounds = false;

        assert!(matches!(
            result,
            Err(ThermoError::FluxBoundsExceedBigM(ref id)) if id == "ISO"
        ));
        // The offending bounds are left untouched
        assert_eq!(model.reactions["ISO"].lower_bound, -5000.);
    }

    #[test]
    fn reaction_compartment_assignment() {
        let model = test_model();
        let same = reaction("ISO", &[("glc_c", -1.), ("fru_c", 1.)]);
        assert_eq!(
            reaction_compartment(&same, &model.metabolites),
            Some("c".to_string())
        );
        let mixed = reaction("GLCt", &[("glc_e", -1.), ("glc_c", 1.)]);
        assert_eq!(
            reaction_compartment(&mixed, &model.metabolites),
            Some("c".to_string())
        );
    }
}
