use {
    crate::{
        agents::{
            AgentKind,
            AgentName,
        },
        error::{
            ConfigError,
            Result,
        },
    },
    serde::{
        de::DeserializeOwned,
        Deserialize,
        Serialize,
        Serializer,
    },
    serde_json::Value,
    std::collections::BTreeMap,
};


fn finite(field: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("must be finite, got {value}")))
    }
}

fn non_negative(field: &str, value: f64) -> Result<()> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigError::invalid(field, format!("must not be negative, got {value}")));
    }
    Ok(())
}

fn positive(field: &str, value: f64) -> Result<()> {
    finite(field, value)?;
    if value <= 0.0 {
        return Err(ConfigError::invalid(field, format!("must be positive, got {value}")));
    }
    Ok(())
}

fn at_least_one(field: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(ConfigError::invalid(field, "must be at least 1"));
    }
    Ok(())
}

fn check_ou_noise(prefix: &str, mu: f64, theta: f64, sigma: f64) -> Result<()> {
    finite(&format!("{prefix}.ou_mu"), mu)?;
    non_negative(&format!("{prefix}.ou_theta"), theta)?;
    non_negative(&format!("{prefix}.ou_sigma"), sigma)
}

fn check_target_smoothing(prefix: &str, noise: f64, clip: f64, delay: usize) -> Result<()> {
    non_negative(&format!("{prefix}.tgt_noise"), noise)?;
    non_negative(&format!("{prefix}.tgt_noise_clip"), clip)?;
    at_least_one(&format!("{prefix}.pol_upd_delay"), delay)
}

fn check_temperature(prefix: &str, lr_temp: f64, init_temp: f64) -> Result<()> {
    positive(&format!("{prefix}.lr_temp"), lr_temp)?;
    positive(&format!("{prefix}.init_temp"), init_temp)
}

fn check_history(prefix: &str, history_length: usize) -> Result<()> {
    at_least_one(&format!("{prefix}.history_length"), history_length)
}


// Defaults shared by several agents
fn default_ou_mu() -> f64 { 0.0 }
fn default_ou_theta() -> f64 { 0.15 }
fn default_ou_sigma() -> f64 { 0.1 }
fn default_tgt_noise() -> f64 { 0.2 }
fn default_tgt_noise_clip() -> f64 { 0.5 }
fn default_pol_upd_delay() -> usize { 2 }
fn default_history_length() -> usize { 2 }
fn default_lr_temp() -> f64 { 0.0001 }
fn default_temp_tuning() -> bool { true }
fn default_init_temp() -> f64 { 0.2 }
fn default_n_qs() -> usize { 25 }
fn default_n_critics() -> usize { 4 }
fn default_eps_decay() -> f64 { 0.995 }
fn default_eps_final() -> f64 { 0.001 }
fn default_n_steps() -> usize { 1 }
fn default_tgt_update_freq() -> usize { 256 }


/// Hyperparameters of DQN and DDQN. The double Q-learning target is implied
/// by the DDQN kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DqnParams {
    // Multiplicative epsilon decay per action selection and its floor.
    #[serde(default = "default_eps_decay")]
    pub eps_decay: f64,
    #[serde(default = "default_eps_final")]
    pub eps_final: f64,
    // Number of steps bootstrapped in the target.
    #[serde(default = "default_n_steps")]
    pub n_steps: usize,
    // Number of updates between hard target network updates.
    #[serde(default = "default_tgt_update_freq")]
    pub tgt_update_freq: usize,
}

/// Hyperparameters of DDPG: the Ornstein-Uhlenbeck exploration noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DdpgParams {
    #[serde(default = "default_ou_mu")]
    pub ou_mu: f64,
    #[serde(default = "default_ou_theta")]
    pub ou_theta: f64,
    #[serde(default = "default_ou_sigma")]
    pub ou_sigma: f64,
}

/// Hyperparameters of TD3: target policy smoothing and delayed policy updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Td3Params {
    #[serde(default = "default_tgt_noise")]
    pub tgt_noise: f64,
    #[serde(default = "default_tgt_noise_clip")]
    pub tgt_noise_clip: f64,
    #[serde(default = "default_pol_upd_delay")]
    pub pol_upd_delay: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LstmDdpgParams {
    #[serde(default = "default_history_length")]
    pub history_length: usize,
    #[serde(default)]
    pub use_past_actions: bool,
    #[serde(default = "default_ou_mu")]
    pub ou_mu: f64,
    #[serde(default = "default_ou_theta")]
    pub ou_theta: f64,
    #[serde(default = "default_ou_sigma")]
    pub ou_sigma: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LstmTd3Params {
    #[serde(default = "default_history_length")]
    pub history_length: usize,
    #[serde(default)]
    pub use_past_actions: bool,
    #[serde(default = "default_tgt_noise")]
    pub tgt_noise: f64,
    #[serde(default = "default_tgt_noise_clip")]
    pub tgt_noise_clip: f64,
    #[serde(default = "default_pol_upd_delay")]
    pub pol_upd_delay: usize,
}

/// Hyperparameters of SAC: the entropy temperature and whether it is tuned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SacParams {
    #[serde(default = "default_lr_temp")]
    pub lr_temp: f64,
    #[serde(default = "default_temp_tuning")]
    pub temp_tuning: bool,
    #[serde(default = "default_init_temp")]
    pub init_temp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LstmSacParams {
    #[serde(default = "default_history_length")]
    pub history_length: usize,
    #[serde(default)]
    pub use_past_actions: bool,
    #[serde(default = "default_lr_temp")]
    pub lr_temp: f64,
    #[serde(default = "default_temp_tuning")]
    pub temp_tuning: bool,
    #[serde(default = "default_init_temp")]
    pub init_temp: f64,
}

/// Hyperparameters of TQC.
///
/// The critic ensemble holds `n_critics` networks with `n_qs` quantiles each;
/// the `top_qs_to_drop` largest of all pooled quantiles are cut from the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TqcParams {
    #[serde(default = "default_lr_temp")]
    pub lr_temp: f64,
    #[serde(default = "default_temp_tuning")]
    pub temp_tuning: bool,
    #[serde(default = "default_init_temp")]
    pub init_temp: f64,
    pub top_qs_to_drop: usize,
    #[serde(default = "default_n_qs")]
    pub n_qs: usize,
    #[serde(default = "default_n_critics")]
    pub n_critics: usize,
}
impl TqcParams {
    /// The number of pooled quantiles, `None` if it does not fit a `usize`.
    pub fn total_quantiles(&self) -> Option<usize> {
        self.n_qs.checked_mul(self.n_critics)
    }
}


/// The hyperparameter set of one entry in the `agent` section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AgentParams {
    Dqn(DqnParams),
    Ddpg(DdpgParams),
    Td3(Td3Params),
    LstmDdpg(LstmDdpgParams),
    LstmTd3(LstmTd3Params),
    Sac(SacParams),
    LstmSac(LstmSacParams),
    Tqc(TqcParams),
}
impl AgentParams {
    /// Interpret a raw hyperparameter mapping for an agent of the given kind.
    ///
    /// `null` is treated as an empty mapping, i.e. all defaults.
    pub fn from_value(
        name: &AgentName,
        value: Value,
    ) -> Result<Self> {
        let value = match value {
            Value::Null => Value::Object(Default::default()),
            value => value,
        };

        fn typed<T: DeserializeOwned>(name: &AgentName, value: Value) -> Result<T> {
            serde_json::from_value(value).map_err(|e| ConfigError::parse(format!("agent.{name}"), e))
        }

        Ok(match name.kind() {
            AgentKind::DQN | AgentKind::DDQN => Self::Dqn(typed(name, value)?),
            AgentKind::DDPG => Self::Ddpg(typed(name, value)?),
            AgentKind::TD3 => Self::Td3(typed(name, value)?),
            AgentKind::LSTMDDPG => Self::LstmDdpg(typed(name, value)?),
            AgentKind::LSTMTD3 => Self::LstmTd3(typed(name, value)?),
            AgentKind::SAC => Self::Sac(typed(name, value)?),
            AgentKind::LSTMSAC => Self::LstmSac(typed(name, value)?),
            AgentKind::TQC => Self::Tqc(typed(name, value)?),
        })
    }

    /// The observation history length for recurrent agents.
    pub fn history_length(&self) -> Option<usize> {
        match self {
            Self::LstmDdpg(p) => Some(p.history_length),
            Self::LstmTd3(p) => Some(p.history_length),
            Self::LstmSac(p) => Some(p.history_length),
            _ => None,
        }
    }

    pub fn check(
        &self,
        name: &AgentName,
    ) -> Result<()> {
        let prefix = format!("agent.{name}");
        let prefix = prefix.as_str();
        match self {
            Self::Dqn(p) => {
                finite(&format!("{prefix}.eps_decay"), p.eps_decay)?;
                if !(p.eps_decay > 0.0 && p.eps_decay <= 1.0) {
                    return Err(ConfigError::invalid(
                        format!("{prefix}.eps_decay"),
                        format!("must be in (0, 1], got {}", p.eps_decay),
                    ));
                }
                finite(&format!("{prefix}.eps_final"), p.eps_final)?;
                if !(0.0..=1.0).contains(&p.eps_final) {
                    return Err(ConfigError::invalid(
                        format!("{prefix}.eps_final"),
                        format!("must be in [0, 1], got {}", p.eps_final),
                    ));
                }
                at_least_one(&format!("{prefix}.n_steps"), p.n_steps)?;
                at_least_one(&format!("{prefix}.tgt_update_freq"), p.tgt_update_freq)
            }
            Self::Ddpg(p) => check_ou_noise(prefix, p.ou_mu, p.ou_theta, p.ou_sigma),
            Self::Td3(p) => check_target_smoothing(prefix, p.tgt_noise, p.tgt_noise_clip, p.pol_upd_delay),
            Self::LstmDdpg(p) => {
                check_history(prefix, p.history_length)?;
                check_ou_noise(prefix, p.ou_mu, p.ou_theta, p.ou_sigma)
            }
            Self::LstmTd3(p) => {
                check_history(prefix, p.history_length)?;
                check_target_smoothing(prefix, p.tgt_noise, p.tgt_noise_clip, p.pol_upd_delay)
            }
            Self::Sac(p) => check_temperature(prefix, p.lr_temp, p.init_temp),
            Self::LstmSac(p) => {
                check_history(prefix, p.history_length)?;
                check_temperature(prefix, p.lr_temp, p.init_temp)
            }
            Self::Tqc(p) => {
                check_temperature(prefix, p.lr_temp, p.init_temp)?;
                at_least_one(&format!("{prefix}.n_qs"), p.n_qs)?;
                at_least_one(&format!("{prefix}.n_critics"), p.n_critics)?;
                let total = p.total_quantiles().ok_or_else(|| {
                    ConfigError::invalid(
                        format!("{prefix}.n_qs"),
                        format!("n_qs * n_critics overflows ({} * {})", p.n_qs, p.n_critics),
                    )
                })?;
                if p.top_qs_to_drop >= total {
                    return Err(ConfigError::invalid(
                        format!("{prefix}.top_qs_to_drop"),
                        format!(
                            "must be smaller than n_qs * n_critics = {total}, got {}",
                            p.top_qs_to_drop,
                        ),
                    ));
                }
                Ok(())
            }
        }
    }
}


/// The `agent` section: one hyperparameter set per agent name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "BTreeMap<String, Value>")]
pub struct AgentSection(BTreeMap<AgentName, AgentParams>);
impl AgentSection {
    pub fn get(
        &self,
        name: &AgentName,
    ) -> Option<&AgentParams> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn check(&self) -> Result<()> {
        if self.is_empty() {
            return Err(ConfigError::invalid("agent", "at least one agent must be configured"));
        }
        for (name, params) in &self.0 {
            params.check(name)?;
        }
        Ok(())
    }
}

impl TryFrom<BTreeMap<String, Value>> for AgentSection {
    type Error = ConfigError;

    fn try_from(raw: BTreeMap<String, Value>) -> Result<Self> {
        raw.into_iter()
            .map(|(key, value)| {
                let name: AgentName = key.parse()?;
                let params = AgentParams::from_value(&name, value)?;
                Ok((name, params))
            })
            .collect::<Result<BTreeMap<AgentName, AgentParams>>>()
            .map(Self)
    }
}

impl Serialize for AgentSection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}
