//! Module providing the representation of a metabolic model with thermodynamic
//! annotations: metabolites, reactions, compartments, and the model itself

pub mod compartment;
pub mod metabolite;
pub mod model;
pub mod reaction;
