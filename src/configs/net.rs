use {
    crate::error::ConfigError,
    serde::{
        Deserialize,
        Serialize,
    },
    strum::Display,
};


#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash,
    Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Activation {
    Relu,
    LeakyRelu,
    Tanh,
    Sigmoid,
    Identity,
}


/// A hidden layer given by its number of neurons and its activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layer {
    pub size: usize,
    pub activation: Activation,
}


/// One entry of a network structure as it is written in a config file.
///
/// Hidden layers are `[size, activation]` pairs, the output is a bare activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NetEntry {
    Layer(usize, Activation),
    Output(Activation),
}


/// The structure of a fully connected network.
///
/// In a config file this reads `[[128, relu], [128, relu], tanh]`: a non-empty
/// list of hidden layers followed by the activation of the output layer. The
/// input and output sizes are not part of the structure since they depend on
/// the environment.
///
/// ```
/// use xrl_experiments::configs::{Activation, NetStructure};
///
/// let net: NetStructure = serde_yaml::from_str("[[64, relu], [32, tanh], identity]").unwrap();
/// assert_eq!(net.hidden().len(), 2);
/// assert_eq!(net.hidden()[1].size, 32);
/// assert_eq!(net.output(), Activation::Identity);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<NetEntry>", into = "Vec<NetEntry>")]
pub struct NetStructure {
    hidden: Vec<Layer>,
    output: Activation,
}
impl NetStructure {
    pub fn new(
        hidden: Vec<Layer>,
        output: Activation,
    ) -> Result<Self, ConfigError> {
        if hidden.is_empty() {
            return Err(ConfigError::invalid("net_struc", "at least one hidden layer is required"));
        }
        if let Some(idx) = hidden.iter().position(|layer| layer.size == 0) {
            return Err(ConfigError::invalid("net_struc", format!("hidden layer {idx} has size 0")));
        }
        Ok(Self { hidden, output })
    }

    pub fn hidden(&self) -> &[Layer] {
        &self.hidden
    }

    pub fn output(&self) -> Activation {
        self.output
    }
}

impl TryFrom<Vec<NetEntry>> for NetStructure {
    type Error = ConfigError;

    fn try_from(mut entries: Vec<NetEntry>) -> Result<Self, Self::Error> {
        let output = match entries.pop() {
            Some(NetEntry::Output(activation)) => activation,
            Some(NetEntry::Layer(..)) => {
                return Err(ConfigError::invalid(
                    "net_struc",
                    "the last entry must be the output activation",
                ))
            }
            None => return Err(ConfigError::invalid("net_struc", "structure is empty")),
        };

        let hidden = entries
            .into_iter()
            .map(|entry| match entry {
                NetEntry::Layer(size, activation) => Ok(Layer { size, activation }),
                NetEntry::Output(_) => Err(ConfigError::invalid(
                    "net_struc",
                    "only the last entry may be a bare activation",
                )),
            })
            .collect::<Result<Vec<Layer>, ConfigError>>()?;

        Self::new(hidden, output)
    }
}

impl From<NetStructure> for Vec<NetEntry> {
    fn from(net: NetStructure) -> Self {
        net.hidden
            .into_iter()
            .map(|layer| NetEntry::Layer(layer.size, layer.activation))
            .chain(std::iter::once(NetEntry::Output(net.output)))
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_yaml_structure() {
        let net: NetStructure =
            serde_yaml::from_str("[[128, relu], [128, leaky_relu], tanh]").unwrap();
        assert_eq!(
            net.hidden(),
            &[
                Layer { size: 128, activation: Activation::Relu },
                Layer { size: 128, activation: Activation::LeakyRelu },
            ]
        );
        assert_eq!(net.output(), Activation::Tanh);
    }

    #[test]
    fn round_trips_through_json() {
        let net: NetStructure = serde_json::from_str(r#"[[256, "relu"], "identity"]"#).unwrap();
        let text = serde_json::to_string(&net).unwrap();
        assert_eq!(text, r#"[[256,"relu"],"identity"]"#);
    }

    #[test]
    fn rejects_malformed_structures() {
        for bad in [
            "[]",
            "[tanh]",
            "[[128, relu]]",
            "[[128, relu], tanh, identity]",
            "[[0, relu], tanh]",
            "[[128, swish], tanh]",
        ] {
            assert!(serde_yaml::from_str::<NetStructure>(bad).is_err(), "{bad} should fail");
        }
    }
}
