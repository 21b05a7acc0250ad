use {
    crate::{
        agents::AgentName,
        configs::{
            ConfigFile,
            EpisodeLimit,
            Head,
        },
        error::{
            ConfigError,
            Result,
        },
    },
    chrono::{
        Local,
        NaiveDate,
    },
    clap::ValueEnum,
    serde::{
        Deserialize,
        Serialize,
    },
    strum::Display,
    tracing::info,
};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Task {
    Train,
    Viz,
}

/// Which feature-effect analysis accompanies a training run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExplainMode {
    None,
    Explainer,
    Pdp,
    Ipdp,
}


/// The external script that carries out a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum EntryPoint {
    #[serde(rename = "train_continuous")]
    #[strum(serialize = "train_continuous")]
    TrainContinuous,
    #[serde(rename = "train_continuous_explainer")]
    #[strum(serialize = "train_continuous_explainer")]
    TrainContinuousExplainer,
    #[serde(rename = "train_continuous_PDP")]
    #[strum(serialize = "train_continuous_PDP")]
    TrainContinuousPdp,
    #[serde(rename = "train_continuous_iPDP")]
    #[strum(serialize = "train_continuous_iPDP")]
    TrainContinuousIpdp,
    #[serde(rename = "train_discrete")]
    #[strum(serialize = "train_discrete")]
    TrainDiscrete,
    #[serde(rename = "visualize_continuous")]
    #[strum(serialize = "visualize_continuous")]
    VisualizeContinuous,
    #[serde(rename = "visualize_discrete")]
    #[strum(serialize = "visualize_discrete")]
    VisualizeDiscrete,
}
impl EntryPoint {
    pub fn select(
        task: Task,
        explain: ExplainMode,
        discrete: bool,
    ) -> Result<Self> {
        match (task, explain, discrete) {
            (Task::Train, ExplainMode::None, true) => Ok(Self::TrainDiscrete),
            (Task::Viz, ExplainMode::None, true) => Ok(Self::VisualizeDiscrete),
            (Task::Train, ExplainMode::None, false) => Ok(Self::TrainContinuous),
            (Task::Train, ExplainMode::Explainer, false) => Ok(Self::TrainContinuousExplainer),
            (Task::Train, ExplainMode::Pdp, false) => Ok(Self::TrainContinuousPdp),
            (Task::Train, ExplainMode::Ipdp, false) => Ok(Self::TrainContinuousIpdp),
            (Task::Viz, ExplainMode::None, false) => Ok(Self::VisualizeContinuous),
            (Task::Viz, explain, _) => Err(ConfigError::Incompatible(format!(
                "explain mode {explain} can only accompany training",
            ))),
            (Task::Train, explain, true) => Err(ConfigError::Incompatible(format!(
                "explain mode {explain} requires a continuous agent",
            ))),
        }
    }
}


/// Everything an external trainer needs to know to carry out one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunPlan {
    pub agent: AgentName,
    pub task: Task,
    pub explain: ExplainMode,
    pub entry_point: EntryPoint,
    pub seed: u64,
    pub episode_limit: EpisodeLimit,
    pub epochs: usize,
    pub run_name: String,
}
impl RunPlan {
    /// Resolve the run of `agent` on `config`, dated today.
    pub fn resolve(
        config: &ConfigFile,
        agent: &AgentName,
        task: Task,
        explain: ExplainMode,
    ) -> Result<Self> {
        Self::resolve_on(config, agent, task, explain, Local::now().date_naive())
    }

    pub fn resolve_on(
        config: &ConfigFile,
        agent: &AgentName,
        task: Task,
        explain: ExplainMode,
        date: NaiveDate,
    ) -> Result<Self> {
        config.check_agent(agent)?;
        let entry_point = EntryPoint::select(task, explain, agent.kind().is_discrete())?;

        if task == Task::Viz {
            check_weights(&config.head)?;
        }

        let plan = Self {
            agent: *agent,
            task,
            explain,
            entry_point,
            seed: config.common.seed,
            episode_limit: config.max_episode_handler(),
            epochs: config.epochs(),
            run_name: run_name(agent, config, date),
        };
        info!("Resolved run {} via {}", plan.run_name, plan.entry_point);
        Ok(plan)
    }
}

fn check_weights(head: &Head) -> Result<()> {
    let missing = |field: &str| ConfigError::invalid(field, "weights are required to visualize an agent");
    match head {
        Head::ActorCritic(head) => {
            if head.actor_weights.is_none() {
                return Err(missing("actor_weights"));
            }
            if head.critic_weights.is_none() {
                return Err(missing("critic_weights"));
            }
        }
        Head::Value(head) => {
            if head.dqn_weights.is_none() {
                return Err(missing("dqn_weights"));
            }
        }
    }
    Ok(())
}

/// The name of a run, e.g. `TD3_a_Ski-v0_MDP_2024-06-11_42`.
///
/// Path separators in the environment name and label are replaced by `-`, the
/// name is a single directory.
pub fn run_name(
    agent: &AgentName,
    config: &ConfigFile,
    date: NaiveDate,
) -> String {
    let flat = |text: &str| text.replace(|c: char| c == '/' || c == '\\', "-");
    let date = date.format("%Y-%m-%d");
    let env = flat(&config.env.name);
    match flat(&config.env.info).as_str() {
        "" => format!("{agent}_{env}_{date}_{}", config.common.seed),
        info => format!("{agent}_{env}_{info}_{date}_{}", config.common.seed),
    }
}
