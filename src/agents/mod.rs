//! # Agents
//!
//! The registry of agent variants an experiment configuration may refer to.
//!
//! An agent is addressed by its name as it appears in the `agent` section of a
//! config file. Several hyperparameter sets of the same algorithm can live side
//! by side by appending a lowercase variant suffix, e.g. `TD3_a` and `TD3_b`
//! both refer to [`AgentKind::TD3`].
//!
//! ```
//! use xrl_experiments::agents::{AgentKind, AgentName};
//!
//! let name: AgentName = "LSTMTD3_b".parse().unwrap();
//! assert_eq!(name.kind(), AgentKind::LSTMTD3);
//! assert_eq!(name.variant(), Some('b'));
//! assert!(!name.kind().is_discrete());
//! ```
use {
    crate::error::{
        ConfigError,
        Result,
    },
    serde::{
        Deserialize,
        Serialize,
        Serializer,
    },
    std::{
        fmt::Display,
        str::FromStr,
    },
    strum::{
        Display as StrumDisplay,
        EnumIter,
        EnumString,
        IntoEnumIterator,
    },
};


#[allow(clippy::upper_case_acronyms)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    EnumString, StrumDisplay, EnumIter, Serialize, Deserialize,
)]
pub enum AgentKind {
    DQN,
    DDQN,
    DDPG,
    TD3,
    LSTMDDPG,
    LSTMTD3,
    SAC,
    LSTMSAC,
    TQC,
}
impl AgentKind {
    /// Whether the agent acts in a discrete action space.
    pub fn is_discrete(&self) -> bool {
        matches!(self, Self::DQN | Self::DDQN)
    }

    /// Whether the agent conditions its networks on a history of observations.
    pub fn is_recurrent(&self) -> bool {
        matches!(self, Self::LSTMDDPG | Self::LSTMTD3 | Self::LSTMSAC)
    }

    /// Whether the agent optimizes a maximum-entropy objective with a temperature.
    pub fn is_entropy_regularized(&self) -> bool {
        matches!(self, Self::SAC | Self::LSTMSAC | Self::TQC)
    }

    pub fn all_names() -> Vec<String> {
        Self::iter().map(|kind| kind.to_string()).collect()
    }
}


/// An agent kind plus an optional lowercase variant suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentName {
    kind: AgentKind,
    variant: Option<char>,
}
impl AgentName {
    pub fn new(
        kind: AgentKind,
        variant: Option<char>,
    ) -> Self {
        Self { kind, variant }
    }

    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    pub fn variant(&self) -> Option<char> {
        self.variant
    }
}

impl FromStr for AgentName {
    type Err = ConfigError;

    fn from_str(name: &str) -> Result<Self> {
        let unknown = || ConfigError::UnknownAgent(name.to_owned());

        let (base, variant) = match name.chars().last() {
            Some(last) if last.is_ascii_lowercase() => {
                let stem = &name[..name.len() - 1];
                if !stem.ends_with('_') {
                    return Err(unknown());
                }
                (&stem[..stem.len() - 1], Some(last))
            }
            _ => (name, None),
        };

        let kind = AgentKind::from_str(base).map_err(|_| unknown())?;
        Ok(Self { kind, variant })
    }
}

impl Display for AgentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.variant {
            Some(variant) => write!(f, "{}_{}", self.kind, variant),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl From<AgentKind> for AgentName {
    fn from(kind: AgentKind) -> Self {
        Self::new(kind, None)
    }
}

impl Serialize for AgentName {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}


/// Check that `name` refers to a known agent.
pub fn validate_agent(name: &str) -> Result<AgentName> {
    name.parse()
}

/// Whether the agent called `name` acts in a discrete action space.
pub fn is_discrete(name: &str) -> Result<bool> {
    Ok(validate_agent(name)?.kind().is_discrete())
}
