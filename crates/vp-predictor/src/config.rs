//! Predictor configuration.
//!
//! Loaded from YAML. Every field has a default, so an empty file (or no file)
//! is a valid configuration. Paths may start with `~/` or `$HOME/`; they are
//! expanded when the runtime environment is resolved at first start, not
//! when the file is read.

use crate::model_size::ModelSize;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming a config file to use instead of defaults.
pub const CONFIG_ENV_VAR: &str = "VP_PREDICTOR_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    pub runtime: RuntimeConfig,
    pub analysis: AnalysisDefaults,
    pub mesh: MeshDefaults,
}

/// Where the predictor runtime lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Interpreter executable. Defaults to `<venv>/bin/python3`, then `python3`.
    pub python: Option<String>,
    /// Virtual environment holding the predictor package.
    pub venv: String,
    /// Directory containing the bridge adapter module. Defaults to
    /// `<venv>/../flow5/fl5-lib/python`.
    pub bridge_dir: Option<String>,
    /// Adapter module run with `python -m`.
    pub module: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            python: None,
            venv: "~/Loftimizer-V2/venv".to_string(),
            bridge_dir: None,
            module: "vp_bridge".to_string(),
        }
    }
}

/// Defaults applied to point queries and mesh builds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisDefaults {
    pub model_size: ModelSize,
    pub n_crit: f64,
    pub xtr_top: f64,
    pub xtr_bot: f64,
}

impl Default for AnalysisDefaults {
    fn default() -> Self {
        Self {
            model_size: ModelSize::Xlarge,
            n_crit: 9.0,
            xtr_top: 1.0,
            xtr_bot: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshDefaults {
    /// Reynolds numbers in the log-spaced ladder.
    pub reynolds_points: usize,
    /// Angle-of-attack increment for mesh sweeps [deg].
    pub alpha_step_deg: f64,
    /// Hash every coordinate instead of sampling two nodes.
    pub full_fingerprint: bool,
}

impl Default for MeshDefaults {
    fn default() -> Self {
        Self {
            reynolds_points: 16,
            alpha_step_deg: 0.25,
            full_fingerprint: false,
        }
    }
}

impl PredictorConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Load from `$VP_PREDICTOR_CONFIG` if set, defaults otherwise.
    pub fn load_default() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(PathBuf::from(path)),
            None => Ok(Self::default()),
        }
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Concrete launch environment derived from a `RuntimeConfig`.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeEnv {
    pub python: PathBuf,
    pub module: String,
    /// Module search path: bridge directory first, then site-packages.
    pub search_path: Vec<PathBuf>,
}

impl RuntimeEnv {
    /// Resolve against the current user's home directory.
    pub fn resolve(config: &RuntimeConfig) -> Self {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        Self::resolve_with_home(config, home.as_deref())
    }

    pub fn resolve_with_home(config: &RuntimeConfig, home: Option<&Path>) -> Self {
        let venv = expand_home(&config.venv, home);

        let bridge_dir = match &config.bridge_dir {
            Some(dir) => expand_home(dir, home),
            None => venv.join("..").join("flow5").join("fl5-lib").join("python"),
        };

        let python = match &config.python {
            Some(p) => expand_home(p, home),
            None => {
                let venv_python = venv.join("bin").join("python3");
                if venv_python.exists() {
                    venv_python
                } else {
                    PathBuf::from("python3")
                }
            }
        };

        Self {
            python,
            module: config.module.clone(),
            search_path: vec![bridge_dir, site_packages(&venv)],
        }
    }

    /// Joined search path for `PYTHONPATH`.
    pub fn python_path(&self) -> OsString {
        std::env::join_paths(&self.search_path).unwrap_or_default()
    }
}

/// Expand a leading `~/` or `$HOME/`.
pub fn expand_home(path: &str, home: Option<&Path>) -> PathBuf {
    let rest = path
        .strip_prefix("~/")
        .or_else(|| path.strip_prefix("$HOME/"));
    match (rest, home) {
        (Some(rest), Some(home)) => home.join(rest),
        _ if path == "~" => home.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(path)),
        _ => PathBuf::from(path),
    }
}

/// `<venv>/lib/python3.*/site-packages`, preferring the highest version present.
fn site_packages(venv: &Path) -> PathBuf {
    let lib = venv.join("lib");
    let mut found: Vec<PathBuf> = std::fs::read_dir(&lib)
        .into_iter()
        .flatten()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with("python3"))
        .map(|e| e.path().join("site-packages"))
        .filter(|p| p.is_dir())
        .collect();
    found.sort_by_key(|p| python_minor(p));
    found
        .pop()
        .unwrap_or_else(|| lib.join("python3.12").join("site-packages"))
}

fn python_minor(site_packages: &Path) -> u32 {
    site_packages
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_prefix("python3."))
        .and_then(|m| m.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(PredictorConfig::from_yaml_str("").unwrap(), PredictorConfig::default());
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let cfg = PredictorConfig::from_yaml_str(
            "analysis:\n  model_size: small\n  n_crit: 7.5\nmesh:\n  reynolds_points: 8\n",
        )
        .unwrap();
        assert_eq!(cfg.analysis.model_size, ModelSize::Small);
        assert_eq!(cfg.analysis.n_crit, 7.5);
        assert_eq!(cfg.analysis.xtr_top, 1.0);
        assert_eq!(cfg.mesh.reynolds_points, 8);
        assert_eq!(cfg.mesh.alpha_step_deg, 0.25);
        assert_eq!(cfg.runtime, RuntimeConfig::default());
    }

    #[test]
    fn unknown_model_size_decodes_to_xlarge() {
        let cfg = PredictorConfig::from_yaml_str("analysis:\n  model_size: enormous\n").unwrap();
        assert_eq!(cfg.analysis.model_size, ModelSize::Xlarge);
    }

    #[test]
    fn yaml_round_trip() {
        let mut cfg = PredictorConfig::default();
        cfg.runtime.python = Some("/usr/bin/python3".into());
        cfg.mesh.full_fingerprint = true;
        let text = cfg.to_yaml().unwrap();
        assert_eq!(PredictorConfig::from_yaml_str(&text).unwrap(), cfg);
    }

    #[test]
    fn malformed_yaml_is_error() {
        assert!(matches!(
            PredictorConfig::from_yaml_str("mesh: [1, 2"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn home_expansion() {
        let home = Path::new("/home/pilot");
        assert_eq!(expand_home("~/venv", Some(home)), PathBuf::from("/home/pilot/venv"));
        assert_eq!(expand_home("$HOME/venv", Some(home)), PathBuf::from("/home/pilot/venv"));
        assert_eq!(expand_home("/opt/venv", Some(home)), PathBuf::from("/opt/venv"));
        assert_eq!(expand_home("~/venv", None), PathBuf::from("~/venv"));
    }

    #[test]
    fn default_search_path_is_home_relative() {
        let env = RuntimeEnv::resolve_with_home(
            &RuntimeConfig::default(),
            Some(Path::new("/nonexistent-home")),
        );
        assert_eq!(env.module, "vp_bridge");
        assert_eq!(env.python, PathBuf::from("python3"));
        assert_eq!(
            env.search_path[0],
            PathBuf::from("/nonexistent-home/Loftimizer-V2/venv/../flow5/fl5-lib/python")
        );
        assert_eq!(
            env.search_path[1],
            PathBuf::from("/nonexistent-home/Loftimizer-V2/venv/lib/python3.12/site-packages")
        );
    }

    #[test]
    fn explicit_bridge_dir_and_python() {
        let cfg = RuntimeConfig {
            python: Some("~/bin/py".into()),
            venv: "/opt/venv".into(),
            bridge_dir: Some("/srv/bridge".into()),
            module: "custom_bridge".into(),
        };
        let env = RuntimeEnv::resolve_with_home(&cfg, Some(Path::new("/h")));
        assert_eq!(env.python, PathBuf::from("/h/bin/py"));
        assert_eq!(env.search_path[0], PathBuf::from("/srv/bridge"));
        assert_eq!(env.module, "custom_bridge");
    }
}
