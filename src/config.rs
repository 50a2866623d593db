use tracing::trace;

/// Joint declaration, covering the shapes the module accepts.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(untagged)]
pub enum JointLists {
    /// Flat list of joint indices on a single device.
    Flat(Vec<usize>),
    /// One list of joint indices per entry in `listofsubparts`.
    PerSubpart(Vec<Vec<usize>>),
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// The `general` group is optional; a missing group means defaults.
    pub general: Option<GeneralConfig>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_robot_name")]
    pub robotname: String,

    /// Update period in seconds.
    #[serde(default = "default_period")]
    pub period: f64,

    /// Prefix for the locally-opened port names.
    #[serde(default)]
    pub portprefix: String,

    pub listofsubparts: Option<Vec<String>>,

    pub listofjoints: Option<JointLists>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            robotname: default_robot_name(),
            period: default_period(),
            portprefix: String::new(),
            listofsubparts: None,
            listofjoints: None,
        }
    }
}

fn default_robot_name() -> String {
    String::from("icub")
}

fn default_period() -> f64 {
    1.0
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|_| anyhow::anyhow!("Invalid configuration file provided!"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}
