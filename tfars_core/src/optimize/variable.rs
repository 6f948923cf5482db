//! Module providing representation of optimization problem variables
use std::fmt::{Display, Formatter};
use std::sync::{Arc, RwLock};

/// A variable in the optimization problem
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Solver-level name, the kind prefix concatenated with the owner id
    pub id: String,
    /// What the variable represents, and which model entity owns it
    pub kind: VariableKind,
    /// Continuous or binary
    pub variable_type: VariableType,
    /// Lowest value the variable can take
    pub lower_bound: f64,
    /// Highest value the variable can take
    pub upper_bound: f64,
    /// Column index of the variable in the problem
    pub index: usize,
}

impl Variable {
    /// Create a new variable; the id is derived from the kind and owner
    pub fn new(
        kind: VariableKind,
        variable_type: VariableType,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Variable {
        Variable {
            id: kind.id(),
            kind,
            variable_type,
            lower_bound,
            upper_bound,
            index: 0,
        }
    }

    /// Wrap the variable in an Arc<RwLock<>>
    pub fn wrap(self) -> Arc<RwLock<Variable>> {
        Arc::new(RwLock::new(self))
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.id, self.variable_type)
    }
}

/// The role a variable plays in the thermodynamic flux problem, carrying the id
/// of the reaction or metabolite it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VariableKind {
    /// Forward flux of a reaction
    ForwardFlux { reaction: String },
    /// Reverse flux of a reaction
    ReverseFlux { reaction: String },
    /// Binary variable, 1 when the reaction is declared forward-active
    ForwardUse { reaction: String },
    /// Binary variable, 1 when the reaction is declared backward-active
    BackwardUse { reaction: String },
    /// Gibbs energy change of a reaction under modeled concentrations
    DeltaG { reaction: String },
    /// Standard-condition Gibbs energy change of a reaction
    DeltaGStd { reaction: String },
    /// Thermodynamic displacement ln(Γ) of a reaction
    ThermoDisplacement { reaction: String },
    /// Natural-log concentration of a metabolite
    LogConcentration { metabolite: String },
}

impl VariableKind {
    /// Prefix distinguishing this kind at the solver level
    pub fn prefix(&self) -> &'static str {
        match self {
            VariableKind::ForwardFlux { .. } => "F_",
            VariableKind::ReverseFlux { .. } => "R_",
            VariableKind::ForwardUse { .. } => "FU_",
            VariableKind::BackwardUse { .. } => "BU_",
            VariableKind::DeltaG { .. } => "DG_",
            VariableKind::DeltaGStd { .. } => "DGo_",
            VariableKind::ThermoDisplacement { .. } => "LnGamma_",
            VariableKind::LogConcentration { .. } => "LC_",
        }
    }

    /// Id of the reaction or metabolite owning the variable
    pub fn owner(&self) -> &str {
        match self {
            VariableKind::ForwardFlux { reaction }
            | VariableKind::ReverseFlux { reaction }
            | VariableKind::ForwardUse { reaction }
            | VariableKind::BackwardUse { reaction }
            | VariableKind::DeltaG { reaction }
            | VariableKind::DeltaGStd { reaction }
            | VariableKind::ThermoDisplacement { reaction } => reaction,
            VariableKind::LogConcentration { metabolite } => metabolite,
        }
    }

    /// Solver-level name of the variable of this kind
    pub fn id(&self) -> String {
        format!("{}{}", self.prefix(), self.owner())
    }

    /// The variable type this kind requires
    pub fn variable_type(&self) -> VariableType {
        match self {
            VariableKind::ForwardUse { .. } | VariableKind::BackwardUse { .. } => {
                VariableType::Binary
            }
            _ => VariableType::Continuous,
        }
    }
}

/// Represents the type of variable in an optimization problem
#[derive(Debug, PartialEq, Clone, Hash, Eq)]
pub enum VariableType {
    /// Continuous variable
    Continuous,
    /// Integer variable
    Integer,
    /// Binary Variable
    Binary,
}

impl Display for VariableType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            VariableType::Continuous => write!(f, "CONTINUOUS"),
            VariableType::Integer => write!(f, "INTEGER"),
            VariableType::Binary => write!(f, "BINARY"),
        }
    }
}
