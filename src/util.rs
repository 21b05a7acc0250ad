use {
    anyhow::Result,
    ron::ser::{
        to_string_pretty,
        PrettyConfig,
    },
    serde::Serialize,
    std::{
        fs,
        path::Path,
    },
};


/// Write any serializable config to `path` as pretty RON.
pub fn write_config<T: Serialize>(
    config: &T,
    path: impl AsRef<Path>,
) -> Result<()> {
    fs::write(path, to_string_pretty(config, PrettyConfig::default())?)?;
    Ok(())
}

/// Parse a command line value the way YAML reads a scalar.
///
/// `0.5` becomes a number, `true` a boolean, `null` null and anything else a string.
pub fn parse_scalar(text: &str) -> Result<serde_json::Value> {
    Ok(serde_yaml::from_str(text)?)
}


#[cfg(test)]
mod tests {
    use {
        super::*,
        serde_json::Value,
        tempdir::TempDir,
    };

    #[test]
    fn scalars_follow_yaml() {
        assert_eq!(parse_scalar("42").unwrap(), Value::from(42));
        assert_eq!(parse_scalar("0.5").unwrap(), Value::from(0.5));
        assert_eq!(parse_scalar("true").unwrap(), Value::from(true));
        assert_eq!(parse_scalar("null").unwrap(), Value::Null);
        assert_eq!(parse_scalar("weights/actor.pth").unwrap(), Value::from("weights/actor.pth"));
    }

    #[test]
    fn writes_ron() {
        let dir = TempDir::new("util").unwrap();
        let path = dir.path().join("values.ron");
        write_config(&vec![1, 2, 3], &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let values: Vec<u32> = ron::from_str(&text).unwrap();
        assert_eq!(values, vec![1, 2, 3]);
    }
}
