use std::sync::{LazyLock, RwLock};

use crate::thermo::constants::{DEBYE_HUCKEL_B_0, MAX_PH, MIN_PH, TEMPERATURE_0};

pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

pub struct Configuration {
    /// Default lower flux bound for new reactions
    pub lower_bound: f64,
    /// Default upper flux bound for new reactions
    pub upper_bound: f64,
    /// Solver feasibility tolerance, used as the epsilon in the ΔG/use couplings
    pub tolerance: f64,
    /// Big M constant coupling fluxes to their use variables
    pub big_m: f64,
    /// Big M constant coupling ΔG to the use variables, also bounds the ΔG variables
    ///
    /// # Note:
    /// Historical formulations of these constraints used values between 1e3 and 1e5,
    /// which is why this is configurable rather than fixed
    pub big_m_thermo: f64,
    /// Sentinel magnitude marking unknown thermodynamic data
    pub big_m_dg: f64,
    /// Bound magnitude for thermodynamic displacement variables
    pub big_m_p: f64,
    /// Raise an error instead of clamping when flux bounds exceed `big_m`
    pub strict_bounds: bool,
    /// Temperature (K) at which thermodynamic values are computed
    pub temperature: f64,
    /// Lower edge of the physiologically relevant pH window
    pub min_ph: f64,
    /// Upper edge of the physiologically relevant pH window
    pub max_ph: f64,
    /// Extended Debye-Huckel B parameter
    pub debye_huckel_b: f64,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            lower_bound: -1000.,
            upper_bound: 1000.,
            tolerance: 1e-06,
            big_m: 1000.,
            big_m_thermo: 1000.,
            big_m_dg: 1e7,
            big_m_p: 1000.,
            strict_bounds: false,
            temperature: TEMPERATURE_0,
            min_ph: MIN_PH,
            max_ph: MAX_PH,
            debye_huckel_b: DEBYE_HUCKEL_B_0,
        }
    }
}
