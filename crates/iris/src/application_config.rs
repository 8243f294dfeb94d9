use std::ops::Deref;

use iris_config_derive::AppConfig;

/// Process-wide settings, resolved once at startup. The git pat is
/// deliberately not part of this; it only ever travels as a flag or env var
/// on the submit commands.
#[derive(AppConfig, Clone, Debug)]
pub struct InnerApplicationConfig {
    #[config(default = "http://localhost:8000")]
    pub backend_url: String,
    pub user_email: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ApplicationConfig {
    config: InnerApplicationConfig,
}

impl ApplicationConfig {
    pub fn new(args: inner_application_config::InnerApplicationConfig) -> anyhow::Result<Self> {
        let config = InnerApplicationConfig::from(args)?;

        Ok(Self { config })
    }
}

impl Deref for ApplicationConfig {
    type Target = InnerApplicationConfig;

    fn deref(&self) -> &Self::Target {
        &self.config
    }
}

#[cfg(test)]
mod test {
    use std::sync::Mutex;

    use clap::Parser;

    use crate::cli::Command;

    use super::*;

    // Every parse reads IRIS_* vars, so tests that touch the environment
    // serialize on this.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn parse(config_path: &std::path::Path) -> anyhow::Result<ApplicationConfig> {
        let cli = Command::try_parse_from([
            "iris",
            "--config-file",
            config_path.to_str().unwrap(),
            "status",
            "job-1",
        ])?;

        ApplicationConfig::new(cli.config)
    }

    fn clear_env() {
        std::env::remove_var("IRIS_BACKEND_URL");
        std::env::remove_var("IRIS_USER_EMAIL");
    }

    #[test]
    fn config_file_values_apply() -> anyhow::Result<()> {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let dir = tempfile::tempdir()?;
        let config_path = dir.path().join("iris.kdl");
        std::fs::write(
            &config_path,
            r#"
config {
    backend_url "http://config-file:9000"
    user_email "file@acme.io"
}
"#,
        )?;

        let config = parse(&config_path)?;

        assert_eq!("http://config-file:9000", config.backend_url);
        assert_eq!(Some("file@acme.io".to_string()), config.user_email);

        Ok(())
    }

    #[test]
    fn missing_config_file_leaves_the_defaults() -> anyhow::Result<()> {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let dir = tempfile::tempdir()?;
        let config = parse(&dir.path().join("missing.kdl"))?;

        assert_eq!("http://localhost:8000", config.backend_url);
        assert_eq!(None, config.user_email);

        Ok(())
    }

    #[test]
    fn env_overrides_the_config_file() -> anyhow::Result<()> {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let dir = tempfile::tempdir()?;
        let config_path = dir.path().join("iris.kdl");
        std::fs::write(
            &config_path,
            r#"
config {
    backend_url "http://config-file:9000"
}
"#,
        )?;
        std::env::set_var("IRIS_BACKEND_URL", "http://env:7000");

        let config = parse(&config_path);
        clear_env();

        assert_eq!("http://env:7000", config?.backend_url);

        Ok(())
    }

    #[test]
    fn cli_flag_overrides_env() -> anyhow::Result<()> {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let dir = tempfile::tempdir()?;
        std::env::set_var("IRIS_USER_EMAIL", "env@acme.io");

        let missing = dir.path().join("missing.kdl");
        let cli = Command::try_parse_from([
            "iris",
            "--config-file",
            missing.to_str().unwrap(),
            "--user-email",
            "cli@acme.io",
            "status",
            "job-1",
        ]);
        clear_env();

        let config = ApplicationConfig::new(cli?.config)?;

        assert_eq!(Some("cli@acme.io".to_string()), config.user_email);

        Ok(())
    }
}
