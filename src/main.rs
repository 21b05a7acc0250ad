use {
    anyhow::Result,
    clap::Parser,
    xrl_experiments::cli::{
        run,
        Args,
    },
};


fn main() -> Result<()> {
    let args = Args::parse();
    let plan = run(&args)?;
    print!("{}", serde_yaml::to_string(&plan)?);
    Ok(())
}
