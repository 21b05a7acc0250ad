//! # Configs
//!
//! The experiment configuration: one YAML or JSON document holding the
//! environment description, the hyperparameters of every configured agent, the
//! training parameters shared by all agents and one network head.
//!
//! ```
//! use xrl_experiments::configs::{ConfigFile, ConfigFormat, EpisodeLimit};
//!
//! let text = r#"
//! env:
//!   name: Ski-v0
//!   max_episode_steps: 200
//!   state_type: feature
//! agent:
//!   DQN: {}
//! seed: 7
//! timesteps: 1000
//! epoch_length: 100
//! eval_episodes: 2
//! gamma: 0.99
//! optimizer: Adam
//! loss: SmoothL1Loss
//! buffer_length: 1000
//! grad_clip: false
//! grad_rescale: false
//! act_start_step: 100
//! upd_start_step: 100
//! upd_every: 1
//! batch_size: 32
//! device: cpu
//! net_struc: [[64, relu], identity]
//! lr: 0.001
//! "#;
//!
//! let config = ConfigFile::from_str(text, ConfigFormat::Yaml).unwrap();
//! assert_eq!(config.epochs(), 10);
//! assert_eq!(config.max_episode_handler(), EpisodeLimit::Steps(200));
//! assert!(config.check_agent(&"DQN".parse().unwrap()).is_ok());
//! ```
mod agent;
mod env;
mod net;

pub use agent::{
    AgentParams,
    AgentSection,
    DdpgParams,
    DqnParams,
    LstmDdpgParams,
    LstmSacParams,
    LstmTd3Params,
    SacParams,
    Td3Params,
    TqcParams,
};
pub use env::{
    EnvConfig,
    EpisodeLimit,
    StateType,
};
pub use net::{
    Activation,
    Layer,
    NetEntry,
    NetStructure,
};

use {
    crate::{
        agents::AgentName,
        error::{
            ConfigError,
            Result,
        },
    },
    serde::{
        de::DeserializeOwned,
        Deserialize,
        Serialize,
    },
    serde_json::{
        Map,
        Value,
    },
    std::{
        collections::BTreeMap,
        fs,
        path::{
            Path,
            PathBuf,
        },
    },
    strum::Display,
    tracing::{
        info,
        warn,
    },
};


pub trait ActorCriticConfig {
    fn actor_lr(&self) -> f64;
    fn critic_lr(&self) -> f64;
    fn tau(&self) -> f64;
    fn set_actor_lr(&mut self, lr: f64);
    fn set_critic_lr(&mut self, lr: f64);
    fn set_tau(&mut self, tau: f64);
}

pub trait OffPolicyConfig {
    fn replay_buffer_capacity(&self) -> usize;
    fn training_batch_size(&self) -> usize;
    fn gamma(&self) -> f64;
    fn set_replay_buffer_capacity(&mut self, capacity: usize);
    fn set_training_batch_size(&mut self, batch_size: usize);
    fn set_gamma(&mut self, gamma: f64);
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum Optimizer {
    Adam,
    RMSprop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum Loss {
    MSELoss,
    SmoothL1Loss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Device {
    Cpu,
    Cuda,
}


/// Training parameters shared by all agents of a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonParams {
    pub seed: u64,
    // Total number of environment steps.
    pub timesteps: usize,
    // Number of steps between two evaluations.
    pub epoch_length: usize,
    // Number of episodes per evaluation.
    pub eval_episodes: usize,
    pub gamma: f64,
    pub optimizer: Optimizer,
    pub loss: Loss,
    pub buffer_length: usize,
    pub grad_clip: bool,
    pub grad_rescale: bool,
    // Number of initial steps with random actions.
    pub act_start_step: usize,
    // Number of initial steps without updates.
    pub upd_start_step: usize,
    // Number of steps between two updates.
    pub upd_every: usize,
    pub batch_size: usize,
    pub device: Device,
    #[serde(default)]
    pub input_norm: bool,
    #[serde(default)]
    pub input_norm_prior: Option<PathBuf>,
    #[serde(default)]
    pub prior_buffer: Option<PathBuf>,
}
impl CommonParams {
    fn check(&self) -> Result<()> {
        if self.timesteps == 0 {
            return Err(ConfigError::invalid("timesteps", "must be at least 1"));
        }
        if self.epoch_length == 0 || self.epoch_length > self.timesteps {
            return Err(ConfigError::invalid(
                "epoch_length",
                format!("must be in [1, timesteps = {}], got {}", self.timesteps, self.epoch_length),
            ));
        }
        if !(0.0..=1.0).contains(&self.gamma()) {
            return Err(ConfigError::invalid(
                "gamma",
                format!("must be in [0, 1], got {}", self.gamma()),
            ));
        }
        if self.training_batch_size() == 0 {
            return Err(ConfigError::invalid("batch_size", "must be at least 1"));
        }
        if self.replay_buffer_capacity() < self.training_batch_size() {
            return Err(ConfigError::invalid(
                "buffer_length",
                format!(
                    "must hold at least one batch of {}, got {}",
                    self.training_batch_size(),
                    self.replay_buffer_capacity(),
                ),
            ));
        }
        if self.upd_start_step < self.training_batch_size() {
            return Err(ConfigError::invalid(
                "upd_start_step",
                format!(
                    "must be at least batch_size = {}, got {}",
                    self.training_batch_size(),
                    self.upd_start_step,
                ),
            ));
        }
        if self.upd_every == 0 {
            return Err(ConfigError::invalid("upd_every", "must be at least 1"));
        }
        if self.input_norm_prior.is_some() && !self.input_norm {
            return Err(ConfigError::invalid(
                "input_norm_prior",
                "requires input_norm to be enabled",
            ));
        }
        Ok(())
    }
}

impl OffPolicyConfig for CommonParams {
    fn replay_buffer_capacity(&self) -> usize {
        self.buffer_length
    }
    fn training_batch_size(&self) -> usize {
        self.batch_size
    }
    fn gamma(&self) -> f64 {
        self.gamma
    }
    fn set_replay_buffer_capacity(&mut self, capacity: usize) {
        self.buffer_length = capacity;
    }
    fn set_training_batch_size(&mut self, batch_size: usize) {
        self.batch_size = batch_size;
    }
    fn set_gamma(&mut self, gamma: f64) {
        self.gamma = gamma;
    }
}


/// Networks and optimizer settings of continuous actor-critic agents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActorCriticParams {
    pub tau: f64,
    pub net_struc_actor: NetStructure,
    pub net_struc_critic: NetStructure,
    pub lr_actor: f64,
    pub lr_critic: f64,
    pub actor_weights: Option<PathBuf>,
    pub critic_weights: Option<PathBuf>,
}
impl ActorCriticParams {
    const KEYS: [&'static str; 7] = [
        "tau",
        "net_struc_actor",
        "net_struc_critic",
        "lr_actor",
        "lr_critic",
        "actor_weights",
        "critic_weights",
    ];

    fn from_raw(raw: &Map<String, Value>) -> Result<Self> {
        Ok(Self {
            tau: required(raw, "tau")?,
            net_struc_actor: net_structure(raw, "net_struc_actor")?,
            net_struc_critic: net_structure(raw, "net_struc_critic")?,
            lr_actor: required(raw, "lr_actor")?,
            lr_critic: required(raw, "lr_critic")?,
            actor_weights: optional(raw, "actor_weights")?,
            critic_weights: optional(raw, "critic_weights")?,
        })
    }

    fn check(&self) -> Result<()> {
        if !(self.tau() > 0.0 && self.tau() <= 1.0) {
            return Err(ConfigError::invalid(
                "tau",
                format!("must be in (0, 1], got {}", self.tau()),
            ));
        }
        if !(self.actor_lr() > 0.0) {
            return Err(ConfigError::invalid(
                "lr_actor",
                format!("must be positive, got {}", self.actor_lr()),
            ));
        }
        if !(self.critic_lr() > 0.0) {
            return Err(ConfigError::invalid(
                "lr_critic",
                format!("must be positive, got {}", self.critic_lr()),
            ));
        }
        if self.net_struc_critic.output() != Activation::Identity {
            warn!(
                "The critic output activation is {}, Q-values will be bounded",
                self.net_struc_critic.output(),
            );
        }
        Ok(())
    }
}

impl ActorCriticConfig for ActorCriticParams {
    fn actor_lr(&self) -> f64 {
        self.lr_actor
    }
    fn critic_lr(&self) -> f64 {
        self.lr_critic
    }
    fn tau(&self) -> f64 {
        self.tau
    }
    fn set_actor_lr(&mut self, lr: f64) {
        self.lr_actor = lr;
    }
    fn set_critic_lr(&mut self, lr: f64) {
        self.lr_critic = lr;
    }
    fn set_tau(&mut self, tau: f64) {
        self.tau = tau;
    }
}


/// Network and optimizer settings of discrete value-based agents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueParams {
    pub net_struc: NetStructure,
    pub lr: f64,
    pub l2_reg: f64,
    pub dqn_weights: Option<PathBuf>,
}
impl ValueParams {
    const KEYS: [&'static str; 4] = ["net_struc", "lr", "l2_reg", "dqn_weights"];

    fn from_raw(raw: &Map<String, Value>) -> Result<Self> {
        Ok(Self {
            net_struc: net_structure(raw, "net_struc")?,
            lr: required(raw, "lr")?,
            l2_reg: optional(raw, "l2_reg")?,
            dqn_weights: optional(raw, "dqn_weights")?,
        })
    }

    fn check(&self) -> Result<()> {
        if !(self.lr > 0.0) {
            return Err(ConfigError::invalid("lr", format!("must be positive, got {}", self.lr)));
        }
        if !(self.l2_reg >= 0.0) {
            return Err(ConfigError::invalid(
                "l2_reg",
                format!("must not be negative, got {}", self.l2_reg),
            ));
        }
        Ok(())
    }
}


/// The network head of a config file, told apart by the keys present.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Head {
    ActorCritic(ActorCriticParams),
    Value(ValueParams),
}
impl Head {
    fn from_raw(raw: &Map<String, Value>) -> Result<Self> {
        let present = |keys: &[&str]| keys.iter().any(|key| raw.contains_key(*key));
        match (present(&ActorCriticParams::KEYS), present(&ValueParams::KEYS)) {
            (true, false) => Ok(Self::ActorCritic(ActorCriticParams::from_raw(raw)?)),
            (false, true) => Ok(Self::Value(ValueParams::from_raw(raw)?)),
            (true, true) => Err(ConfigError::Incompatible(
                "the config mixes actor-critic keys (net_struc_actor, ...) with value keys (net_struc, ...)".to_owned(),
            )),
            (false, false) => Err(ConfigError::invalid(
                "net_struc_actor",
                "no network head given, expected net_struc_actor and net_struc_critic or net_struc",
            )),
        }
    }

    pub fn is_discrete(&self) -> bool {
        matches!(self, Self::Value(_))
    }
}


// Deserialize a single top-level entry, errors name the entry.
fn required<T: DeserializeOwned>(
    raw: &Map<String, Value>,
    key: &str,
) -> Result<T> {
    match raw.get(key) {
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| ConfigError::parse(key, e)),
        None => Err(ConfigError::invalid(key, "is required")),
    }
}

fn optional<T: DeserializeOwned + Default>(
    raw: &Map<String, Value>,
    key: &str,
) -> Result<T> {
    match raw.get(key) {
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| ConfigError::parse(key, e)),
        None => Ok(T::default()),
    }
}

fn net_structure(
    raw: &Map<String, Value>,
    key: &str,
) -> Result<NetStructure> {
    let entries: Vec<NetEntry> = required(raw, key)?;
    NetStructure::try_from(entries).map_err(|e| match e {
        ConfigError::Invalid { reason, .. } => ConfigError::invalid(key, reason),
        e => e,
    })
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
}
impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        match extension {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}


/// Values given on the command line that take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub seed: Option<u64>,
    pub actor_weights: Option<PathBuf>,
    pub critic_weights: Option<PathBuf>,
    pub dqn_weights: Option<PathBuf>,
}


/// A complete experiment configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value")]
pub struct ConfigFile {
    pub env: EnvConfig,
    pub agent: AgentSection,
    #[serde(flatten)]
    pub common: CommonParams,
    #[serde(flatten)]
    pub head: Head,
}
impl ConfigFile {
    /// Read and validate a config file, the format follows the extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config = Self::parse(&text, format, &path.display().to_string())?;
        config.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(
        text: &str,
        format: ConfigFormat,
    ) -> Result<Self> {
        let origin = match format {
            ConfigFormat::Yaml => "YAML config",
            ConfigFormat::Json => "JSON config",
        };
        let config = Self::parse(text, format, origin)?;
        config.validate()?;
        Ok(config)
    }

    fn parse(
        text: &str,
        format: ConfigFormat,
        origin: &str,
    ) -> Result<Self> {
        let raw: Value = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(text).map_err(|e| ConfigError::parse(origin, e))?,
            ConfigFormat::Json => serde_json::from_str(text).map_err(|e| ConfigError::parse(origin, e))?,
        };
        Self::try_from(raw)
    }

    pub fn to_text(
        &self,
        format: ConfigFormat,
    ) -> Result<String> {
        match format {
            ConfigFormat::Yaml => serde_yaml::to_string(self).map_err(|e| ConfigError::parse("config", e)),
            ConfigFormat::Json => serde_json::to_string_pretty(self).map_err(|e| ConfigError::parse("config", e)),
        }
    }

    /// Write the config to `path`, the format follows the extension.
    pub fn save(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let path = path.as_ref();
        let text = self.to_text(ConfigFormat::from_path(path)?)?;
        fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.env.check()?;
        self.agent.check()?;
        self.common.check()?;
        match &self.head {
            Head::ActorCritic(head) => head.check(),
            Head::Value(head) => head.check(),
        }
    }

    /// Replace the top-level entry `key` by `value`.
    ///
    /// Only keys the config already carries can be replaced, optional entries
    /// that are unset included. The config is left untouched if the key is
    /// unknown or the result does not validate.
    pub fn overwrite(
        &mut self,
        key: &str,
        value: Value,
    ) -> Result<()> {
        let mut raw = serde_json::to_value(&*self).map_err(|e| ConfigError::parse("config", e))?;
        match raw.as_object_mut().and_then(|entries| entries.get_mut(key)) {
            Some(entry) => *entry = value,
            None => return Err(ConfigError::UnknownKey(key.to_owned())),
        }

        let updated = Self::try_from(raw)?;
        updated.validate()?;

        info!("Overwrote config entry `{key}`");
        *self = updated;
        Ok(())
    }

    pub fn apply(
        &mut self,
        overrides: &Overrides,
    ) -> Result<()> {
        if let Some(seed) = overrides.seed {
            self.overwrite("seed", Value::from(seed))?;
        }
        let paths = [
            ("actor_weights", &overrides.actor_weights),
            ("critic_weights", &overrides.critic_weights),
            ("dqn_weights", &overrides.dqn_weights),
        ];
        for (key, path) in paths {
            if let Some(path) = path {
                self.overwrite(key, Value::from(path.to_string_lossy().into_owned()))?;
            }
        }
        Ok(())
    }

    pub fn max_episode_handler(&self) -> EpisodeLimit {
        let limit = self.env.episode_limit();
        if limit == EpisodeLimit::Unbounded {
            info!("Episodes of {} are not truncated", self.env.name);
        }
        limit
    }

    pub fn agent_params(
        &self,
        name: &AgentName,
    ) -> Result<&AgentParams> {
        self.agent
            .get(name)
            .ok_or_else(|| ConfigError::MissingAgent(name.to_string()))
    }

    /// Look up the agent and check that the network head fits its action space.
    pub fn check_agent(
        &self,
        name: &AgentName,
    ) -> Result<&AgentParams> {
        let params = self.agent_params(name)?;
        match (name.kind().is_discrete(), self.head.is_discrete()) {
            (true, false) => Err(ConfigError::Incompatible(format!(
                "{name} is a discrete agent but the config has an actor-critic head",
            ))),
            (false, true) => Err(ConfigError::Incompatible(format!(
                "{name} is a continuous agent but the config has a value head",
            ))),
            _ => Ok(params),
        }
    }

    pub fn epochs(&self) -> usize {
        self.common.timesteps / self.common.epoch_length
    }

    pub fn actor_critic(&self) -> Option<&ActorCriticParams> {
        match &self.head {
            Head::ActorCritic(head) => Some(head),
            Head::Value(_) => None,
        }
    }

    pub fn value(&self) -> Option<&ValueParams> {
        match &self.head {
            Head::Value(head) => Some(head),
            Head::ActorCritic(_) => None,
        }
    }

    pub fn log_summary(
        &self,
        name: &AgentName,
    ) {
        info!(
            "Agent {name} on {} ({}), seed {}",
            self.env.name,
            self.env.episode_limit(),
            self.common.seed,
        );
        info!(
            "{} timesteps in {} epochs, gamma {}, buffer {}, batch {}, {} with {} on {}",
            self.common.timesteps,
            self.epochs(),
            self.common.gamma(),
            self.common.replay_buffer_capacity(),
            self.common.training_batch_size(),
            self.common.optimizer,
            self.common.loss,
            self.common.device,
        );
        match &self.head {
            Head::ActorCritic(head) => info!(
                "Actor lr {}, critic lr {}, tau {}",
                head.actor_lr(),
                head.critic_lr(),
                head.tau(),
            ),
            Head::Value(head) => info!("Lr {}, l2 regularization {}", head.lr, head.l2_reg),
        }
    }
}


impl TryFrom<Value> for ConfigFile {
    type Error = ConfigError;

    /// Build the config section by section, so that errors name the entry
    /// they stem from. Range rules are left to [`ConfigFile::validate`].
    fn try_from(value: Value) -> Result<Self> {
        let raw = match value {
            Value::Object(raw) => raw,
            other => return Err(ConfigError::parse("config", format!("expected a mapping, got {other}"))),
        };

        let agents: Option<BTreeMap<String, Value>> = required(&raw, "agent")?;
        let common = serde_json::from_value(Value::Object(raw.clone()))
            .map_err(|e| ConfigError::parse("training parameters", e))?;

        Ok(Self {
            env: required(&raw, "env")?,
            agent: AgentSection::try_from(agents.unwrap_or_default())?,
            common,
            head: Head::from_raw(&raw)?,
        })
    }
}


/// Locate a config file.
///
/// An existing `file` is used as is, otherwise it is looked up in the
/// `continuous_actions` or `discrete_actions` subdirectory of `dir`.
pub fn resolve_config_path(
    dir: impl AsRef<Path>,
    file: impl AsRef<Path>,
    discrete: bool,
) -> PathBuf {
    let file = file.as_ref();
    if file.exists() {
        return file.to_owned();
    }
    let subdir = if discrete { "discrete_actions" } else { "continuous_actions" };
    dir.as_ref().join(subdir).join(file)
}


#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::agents::AgentKind,
        tempdir::TempDir,
    };

    const CONTINUOUS: &str = r#"
env:
  name: Ski-v0
  max_episode_steps: -1
  state_type: feature
  info: MDP
  env_kwargs:
    POMDP_type: MDP
agent:
  DDPG: {}
  TD3_a:
    pol_upd_delay: 3
  TQC:
    top_qs_to_drop: 10
seed: 42
timesteps: 10000
epoch_length: 1000
eval_episodes: 5
gamma: 0.99
tau: 0.001
net_struc_actor: [[128, relu], [128, relu], tanh]
net_struc_critic: [[128, relu], [128, relu], identity]
optimizer: Adam
loss: MSELoss
lr_actor: 0.0001
lr_critic: 0.0001
buffer_length: 100000
grad_clip: false
grad_rescale: false
act_start_step: 5000
upd_start_step: 5000
upd_every: 1
batch_size: 32
device: cpu
"#;

    fn continuous() -> ConfigFile {
        ConfigFile::from_str(CONTINUOUS, ConfigFormat::Yaml).unwrap()
    }

    fn name(text: &str) -> AgentName {
        text.parse().unwrap()
    }

    #[test]
    fn parses_the_actor_critic_head() {
        let config = continuous();
        let head = config.actor_critic().unwrap();
        assert_eq!(head.tau(), 0.001);
        assert_eq!(head.net_struc_actor.output(), Activation::Tanh);
        assert_eq!(head.actor_weights, None);
        assert!(config.value().is_none());
        assert_eq!(config.common.optimizer, Optimizer::Adam);
        assert_eq!(config.common.device, Device::Cpu);
        assert!(!config.common.input_norm);
        assert_eq!(config.epochs(), 10);
        assert_eq!(config.max_episode_handler(), EpisodeLimit::Unbounded);
    }

    #[test]
    fn agent_lookup_uses_the_exact_name() {
        let config = continuous();
        assert!(matches!(config.agent_params(&name("TD3_a")), Ok(AgentParams::Td3(p)) if p.pol_upd_delay == 3));
        assert!(matches!(
            config.agent_params(&name("TD3")),
            Err(ConfigError::MissingAgent(agent)) if agent == "TD3"
        ));
        assert!(matches!(config.check_agent(&name("SAC")), Err(ConfigError::MissingAgent(_))));
    }

    #[test]
    fn discrete_agents_need_a_value_head() {
        let text = CONTINUOUS.replace("  DDPG: {}\n", "  DDPG: {}\n  DQN: {}\n");
        let config = ConfigFile::from_str(&text, ConfigFormat::Yaml).unwrap();
        assert!(config.check_agent(&name("DDPG")).is_ok());
        assert!(matches!(config.check_agent(&name("DQN")), Err(ConfigError::Incompatible(_))));
    }

    #[test]
    fn overwrite_replaces_known_keys() {
        let mut config = continuous();
        config.overwrite("seed", Value::from(7)).unwrap();
        config.overwrite("gamma", Value::from(0.9)).unwrap();
        config.overwrite("actor_weights", Value::from("weights/actor.pth")).unwrap();
        assert_eq!(config.common.seed, 7);
        assert_eq!(config.common.gamma(), 0.9);
        assert_eq!(
            config.actor_critic().unwrap().actor_weights,
            Some(PathBuf::from("weights/actor.pth")),
        );
    }

    #[test]
    fn overwrite_of_unknown_key_leaves_config_unchanged() {
        let mut config = continuous();
        let before = config.clone();
        assert!(matches!(
            config.overwrite("learning_rate", Value::from(0.1)),
            Err(ConfigError::UnknownKey(key)) if key == "learning_rate"
        ));
        // Value head keys are unknown to an actor-critic config.
        assert!(matches!(
            config.overwrite("dqn_weights", Value::from("dqn.pth")),
            Err(ConfigError::UnknownKey(_))
        ));
        assert_eq!(config, before);
    }

    #[test]
    fn overwrite_with_invalid_value_leaves_config_unchanged() {
        let mut config = continuous();
        let before = config.clone();
        assert!(config.overwrite("seed", Value::from("forty-two")).is_err());
        assert_eq!(config, before);
    }

    #[test]
    fn range_rules_name_the_offending_field() {
        let cases = [
            ("gamma", Value::from(1.5)),
            ("tau", Value::from(0.0)),
            ("tau", Value::from(1.5)),
            ("lr_actor", Value::from(0.0)),
            ("lr_critic", Value::from(-0.1)),
            ("timesteps", Value::from(0)),
            ("epoch_length", Value::from(0)),
            ("epoch_length", Value::from(20000)),
            ("batch_size", Value::from(0)),
            ("buffer_length", Value::from(16)),
            ("upd_start_step", Value::from(8)),
            ("upd_every", Value::from(0)),
            ("input_norm_prior", Value::from("prior.pkl")),
        ];
        for (key, value) in cases {
            let mut config = continuous();
            match config.overwrite(key, value.clone()) {
                Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, key),
                other => panic!("{key} = {value} gave {other:?}"),
            }
        }
    }

    #[test]
    fn input_norm_prior_with_input_norm() {
        let mut config = continuous();
        config.overwrite("input_norm", Value::from(true)).unwrap();
        config.overwrite("input_norm_prior", Value::from("prior.pkl")).unwrap();
        assert_eq!(config.common.input_norm_prior, Some(PathBuf::from("prior.pkl")));
    }

    #[test]
    fn apply_only_sets_present_overrides() {
        let mut config = continuous();
        config
            .apply(&Overrides {
                seed: Some(3),
                critic_weights: Some(PathBuf::from("critic.pth")),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(config.common.seed, 3);
        let head = config.actor_critic().unwrap();
        assert_eq!(head.actor_weights, None);
        assert_eq!(head.critic_weights, Some(PathBuf::from("critic.pth")));

        let mut config = continuous();
        let overrides = Overrides {
            dqn_weights: Some(PathBuf::from("dqn.pth")),
            ..Default::default()
        };
        assert!(matches!(config.apply(&overrides), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn save_and_load_in_both_formats() {
        let dir = TempDir::new("configs").unwrap();
        let config = continuous();
        for file in ["config.yaml", "config.json"] {
            let path = dir.path().join(file);
            config.save(&path).unwrap();
            assert_eq!(ConfigFile::load(&path).unwrap(), config);
        }
    }

    #[test]
    fn unsupported_extension() {
        assert!(matches!(
            ConfigFile::load("config.toml"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            ConfigFile::load("does/not/exist.yaml"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let dir = TempDir::new("configs").unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "env: [").unwrap();
        match ConfigFile::load(&path) {
            Err(ConfigError::Parse { origin, .. }) => assert!(origin.ends_with("broken.yaml")),
            other => panic!("unexpected {other:?}"),
        }
    }

    fn from_yaml(text: &str) -> Result<ConfigFile> {
        ConfigFile::from_str(text, ConfigFormat::Yaml)
    }

    #[test]
    fn network_errors_name_the_network() {
        let text = CONTINUOUS.replace(
            "net_struc_actor: [[128, relu], [128, relu], tanh]",
            "net_struc_actor: [[0, relu], tanh]",
        );
        assert!(matches!(
            from_yaml(&text),
            Err(ConfigError::Invalid { field, .. }) if field == "net_struc_actor"
        ));

        let text = CONTINUOUS.replace(
            "net_struc_critic: [[128, relu], [128, relu], identity]",
            "net_struc_critic: [[128, relu], [128, relu]]",
        );
        assert!(matches!(
            from_yaml(&text),
            Err(ConfigError::Invalid { field, .. }) if field == "net_struc_critic"
        ));
    }

    #[test]
    fn head_type_errors_name_the_entry() {
        let text = CONTINUOUS.replace("lr_actor: 0.0001", "lr_actor: fast");
        assert!(matches!(
            from_yaml(&text),
            Err(ConfigError::Parse { origin, .. }) if origin == "lr_actor"
        ));

        let text = CONTINUOUS.replace("tau: 0.001\n", "");
        assert!(matches!(
            from_yaml(&text),
            Err(ConfigError::Invalid { field, .. }) if field == "tau"
        ));
    }

    #[test]
    fn a_config_needs_exactly_one_head() {
        let text = format!("{CONTINUOUS}net_struc: [[64, relu], identity]\nlr: 0.001\n");
        assert!(matches!(from_yaml(&text), Err(ConfigError::Incompatible(_))));

        let text = CONTINUOUS
            .lines()
            .filter(|line| !line.starts_with("net_struc") && !line.starts_with("lr_") && !line.starts_with("tau"))
            .collect::<Vec<_>>()
            .join("\n");
        assert!(matches!(from_yaml(&text), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn unknown_agents_in_a_file() {
        let text = CONTINUOUS.replace("  DDPG: {}\n", "  PPO: {}\n");
        assert!(matches!(
            from_yaml(&text),
            Err(ConfigError::UnknownAgent(agent)) if agent == "PPO"
        ));
    }

    #[test]
    fn shipped_configs_are_valid() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs");

        let continuous = ConfigFile::load(root.join("continuous_actions/ski_mdp.yaml")).unwrap();
        for kind in [
            AgentKind::DDPG,
            AgentKind::TD3,
            AgentKind::LSTMDDPG,
            AgentKind::LSTMTD3,
            AgentKind::SAC,
            AgentKind::LSTMSAC,
            AgentKind::TQC,
        ] {
            assert!(continuous.check_agent(&kind.into()).is_ok(), "{kind} missing");
        }

        let discrete = ConfigFile::load(root.join("discrete_actions/ski_mdp.yaml")).unwrap();
        assert!(discrete.check_agent(&AgentKind::DQN.into()).is_ok());
        assert!(discrete.check_agent(&AgentKind::DDQN.into()).is_ok());
    }

    #[test]
    fn config_paths_fall_back_to_the_action_space_directory() {
        assert_eq!(
            resolve_config_path("configs", "missing.yaml", false),
            PathBuf::from("configs/continuous_actions/missing.yaml"),
        );
        assert_eq!(
            resolve_config_path("configs", "missing.yaml", true),
            PathBuf::from("configs/discrete_actions/missing.yaml"),
        );

        let dir = TempDir::new("configs").unwrap();
        let existing = dir.path().join("mine.yaml");
        fs::write(&existing, "").unwrap();
        assert_eq!(resolve_config_path("configs", &existing, false), existing);
    }
}
