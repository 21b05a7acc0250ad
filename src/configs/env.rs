use {
    crate::error::{
        ConfigError,
        Result,
    },
    serde::{
        Deserialize,
        Serialize,
    },
    serde_json::Value,
    std::{
        collections::BTreeMap,
        fmt::Display,
    },
};


/// How the environment presents its observations to the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateType {
    Feature,
    Image,
}


/// The maximum length of an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EpisodeLimit {
    Steps(usize),
    Unbounded,
}
impl Display for EpisodeLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Steps(steps) => write!(f, "{steps} steps"),
            Self::Unbounded => write!(f, "unbounded"),
        }
    }
}


/// The `env` section of a config file.
///
/// # Fields
/// * `name` - The registered name of the environment, e.g. `Ski-v0`.
/// * `max_episode_steps` - Episode cap, `-1` leaves episodes unbounded.
/// * `state_type` - Either `feature` or `image`.
/// * `wrappers` - Names of the wrappers applied to the environment, in order.
/// * `wrapper_kwargs` - Keyword arguments per wrapper, keyed by wrapper name.
/// * `env_kwargs` - Environment specific keyword arguments, passed through untouched.
/// * `info` - A free label that ends up in the run name, e.g. `MDP`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvConfig {
    pub name: String,
    pub max_episode_steps: i64,
    pub state_type: StateType,
    #[serde(default)]
    pub wrappers: Vec<String>,
    #[serde(default)]
    pub wrapper_kwargs: BTreeMap<String, Value>,
    #[serde(default)]
    pub env_kwargs: BTreeMap<String, Value>,
    #[serde(default)]
    pub info: String,
}
impl EnvConfig {
    pub fn episode_limit(&self) -> EpisodeLimit {
        match self.max_episode_steps {
            -1 => EpisodeLimit::Unbounded,
            steps => EpisodeLimit::Steps(steps.max(0) as usize),
        }
    }

    pub fn check(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::invalid("env.name", "must not be empty"));
        }

        if self.max_episode_steps != -1 && self.max_episode_steps < 1 {
            return Err(ConfigError::invalid(
                "env.max_episode_steps",
                format!("must be -1 or at least 1, got {}", self.max_episode_steps),
            ));
        }

        if let Some(wrapper) = self
            .wrapper_kwargs
            .keys()
            .find(|wrapper| !self.wrappers.contains(wrapper))
        {
            return Err(ConfigError::invalid(
                "env.wrapper_kwargs",
                format!("`{wrapper}` is not listed in env.wrappers"),
            ));
        }

        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn env(yaml: &str) -> EnvConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn defaults_for_optional_fields() {
        let env = env("name: Ski-v0\nmax_episode_steps: 100\nstate_type: feature\n");
        assert!(env.wrappers.is_empty());
        assert!(env.env_kwargs.is_empty());
        assert_eq!(env.info, "");
        assert_eq!(env.episode_limit(), EpisodeLimit::Steps(100));
        assert!(env.check().is_ok());
    }

    #[test]
    fn minus_one_is_unbounded() {
        let env = env("name: Ski-v0\nmax_episode_steps: -1\nstate_type: image\n");
        assert_eq!(env.episode_limit(), EpisodeLimit::Unbounded);
        assert_eq!(env.state_type, StateType::Image);
        assert!(env.check().is_ok());
    }

    #[test]
    fn rejects_bad_episode_caps() {
        for steps in [0, -2] {
            let env = env(&format!("name: Ski-v0\nmax_episode_steps: {steps}\nstate_type: feature\n"));
            assert!(matches!(
                env.check(),
                Err(ConfigError::Invalid { field, .. }) if field == "env.max_episode_steps"
            ));
        }
    }

    #[test]
    fn wrapper_kwargs_need_a_listed_wrapper() {
        let env = env(concat!(
            "name: Ski-v0\n",
            "max_episode_steps: 50\n",
            "state_type: feature\n",
            "wrappers: [FrameStack]\n",
            "wrapper_kwargs:\n",
            "  Normalize: {clip: 5.0}\n",
        ));
        assert!(matches!(
            env.check(),
            Err(ConfigError::Invalid { field, .. }) if field == "env.wrapper_kwargs"
        ));
    }

    #[test]
    fn env_kwargs_pass_through() {
        let env = env(concat!(
            "name: Ski-v0\n",
            "max_episode_steps: 50\n",
            "state_type: feature\n",
            "env_kwargs:\n",
            "  POMDP_type: MDP\n",
            "  frame_stack: 1\n",
        ));
        assert_eq!(env.env_kwargs["POMDP_type"], Value::from("MDP"));
        assert_eq!(env.env_kwargs["frame_stack"], Value::from(1));
    }
}
