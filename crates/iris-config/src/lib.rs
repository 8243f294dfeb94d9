use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum EnvError {
    #[error("failed to read config from env: {0}")]
    EnvError(#[source] anyhow::Error),
}

pub trait Env {
    fn set_from_env(&mut self) -> Result<(), EnvError>;
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigFileError {
    #[error("failed to read config file: {0}")]
    ConfigFileError(#[source] anyhow::Error),
}

pub trait ConfigFile {
    fn set_from_config_file(&mut self, config_file: &Path) -> Result<(), ConfigFileError>;
}

/// Directory holding the iris config. `IRIS_CONFIG_HOME` wins over the
/// platform config dir.
pub fn config_home() -> PathBuf {
    std::env::var("IRIS_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            directories::ProjectDirs::from("io", "iris", "iris")
                .map(|project| project.config_dir().to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".").join(".config"))
        })
}

pub fn config_file() -> PathBuf {
    config_home().join("iris.kdl")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn config_home_prefers_the_env_override() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::env::set_var("IRIS_CONFIG_HOME", dir.path());

        assert_eq!(dir.path(), config_home());
        assert_eq!(dir.path().join("iris.kdl"), config_file());

        std::env::remove_var("IRIS_CONFIG_HOME");

        Ok(())
    }
}
