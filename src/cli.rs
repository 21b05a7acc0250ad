use {
    crate::{
        agents::validate_agent,
        configs::{
            resolve_config_path,
            ConfigFile,
            Overrides,
        },
        engines::{
            ExperimentDir,
            ExplainMode,
            RunPlan,
            Task,
        },
        logging::setup_logging,
        util::parse_scalar,
    },
    anyhow::Result,
    clap::{
        Parser,
        ValueEnum,
    },
    serde_json::Value,
    std::path::PathBuf,
    tracing::{
        warn,
        Level,
    },
};


#[derive(ValueEnum, Debug, Clone)]
pub enum Loglevel {
    Error, // put these only during active debugging and then downgrade later
    Warn,  // main events in the program
    Info,  // all the little details
    Debug, // config internals
    None,  // don't log anything
}
impl Loglevel {
    pub fn level(&self) -> Option<Level> {
        match self {
            Loglevel::Error => Some(Level::ERROR),
            Loglevel::Warn => Some(Level::WARN),
            Loglevel::Info => Some(Level::INFO),
            Loglevel::Debug => Some(Level::DEBUG),
            Loglevel::None => None,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The config file. If it does not exist it is looked up in the
    /// continuous_actions or discrete_actions directory of --config-dir.
    #[arg(long)]
    pub config: PathBuf,

    /// Directory holding the shipped configs.
    #[arg(long, default_value = "configs")]
    pub config_dir: PathBuf,

    /// The agent to run, e.g. TD3 or TD3_a.
    #[arg(long, default_value = "DDPG")]
    pub agent: String,

    #[arg(long, value_enum, default_value_t = Task::Train)]
    pub task: Task,

    /// Feature-effect analysis to run alongside training.
    #[arg(long, value_enum, default_value_t = ExplainMode::None)]
    pub explain: ExplainMode,

    /// Overrides the seed of the config file.
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long)]
    pub actor_weights: Option<PathBuf>,

    #[arg(long)]
    pub critic_weights: Option<PathBuf>,

    #[arg(long)]
    pub dqn_weights: Option<PathBuf>,

    /// Overwrite a top-level config entry, e.g. --set gamma=0.95
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub set: Vec<(String, Value)>,

    /// Create the run directory under this root.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Setup logging
    #[arg(long, value_enum, default_value_t = Loglevel::None)]
    pub log: Loglevel,

    /// Also write the log to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
impl Args {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            seed: self.seed,
            actor_weights: self.actor_weights.clone(),
            critic_weights: self.critic_weights.clone(),
            dqn_weights: self.dqn_weights.clone(),
        }
    }
}

fn parse_key_value(text: &str) -> Result<(String, Value), String> {
    let (key, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{text}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in `{text}`"));
    }
    let value = parse_scalar(value.trim()).map_err(|e| e.to_string())?;
    Ok((key.to_owned(), value))
}


/// Load the config, apply the command line on top of it and resolve the run.
///
/// The plan is returned rather than printed so that callers decide where it
/// goes; the binary writes it to stdout as YAML.
pub fn run(args: &Args) -> Result<RunPlan> {
    if let Some(level) = args.log.level() {
        setup_logging(args.log_file.as_deref(), Some(level), Some(level))?;
    }

    let agent = validate_agent(&args.agent)?;
    let path = resolve_config_path(&args.config_dir, &args.config, agent.kind().is_discrete());

    let mut config = ConfigFile::load(&path)?;
    config.apply(&args.overrides())?;
    for (key, value) in &args.set {
        config.overwrite(key, value.clone())?;
    }
    config.log_summary(&agent);

    let plan = RunPlan::resolve(&config, &agent, args.task, args.explain)?;
    if let Some(root) = &args.output {
        let dir = ExperimentDir::create(root, &plan, &config)?;
        warn!("Launch {} with {}", plan.entry_point, dir.config_path().display());
    }
    Ok(plan)
}
