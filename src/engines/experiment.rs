use {
    super::plan::RunPlan,
    crate::{
        configs::ConfigFile,
        util::write_config,
    },
    anyhow::{
        anyhow,
        Result,
    },
    std::{
        fs::create_dir_all,
        path::{
            Path,
            PathBuf,
        },
    },
    tracing::warn,
};


/// The directory of a single run.
///
/// It holds the resolved configuration the external trainer reads
/// (`config.yaml`) and the plan the run was launched with (`plan.ron`).
#[derive(Debug, Clone)]
pub struct ExperimentDir {
    path: PathBuf,
}
impl ExperimentDir {
    pub const CONFIG_FILE: &'static str = "config.yaml";
    pub const PLAN_FILE: &'static str = "plan.ron";

    /// Create `root/<run name>/` and write the config and plan into it.
    ///
    /// # Arguments
    ///
    /// * `root` - The directory all runs are collected in.
    /// * `plan` - The resolved run, its name names the directory.
    /// * `config` - The configuration the run is carried out with.
    pub fn create(
        root: &dyn AsRef<Path>,
        plan: &RunPlan,
        config: &ConfigFile,
    ) -> Result<Self> {
        let path = root.as_ref().join(&plan.run_name);

        if path.join(Self::CONFIG_FILE).try_exists()? {
            Err(anyhow!(concat!(
                "Config file already exists in this directory!\n",
                "I am assuming I would be overwriting an existing run!",
            )))?
        }

        create_dir_all(path.as_path())?;
        config.save(path.join(Self::CONFIG_FILE))?;
        write_config(plan, path.join(Self::PLAN_FILE))?;

        warn!("Created experiment directory {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config_path(&self) -> PathBuf {
        self.path.join(Self::CONFIG_FILE)
    }

    pub fn plan_path(&self) -> PathBuf {
        self.path.join(Self::PLAN_FILE)
    }
}
