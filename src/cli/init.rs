use super::config::GateConfig;
use std::path::PathBuf;

/// Write a default configuration file for `name`
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn execute(config: String, name: String, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = PathBuf::from(config);

    if name.trim().is_empty() {
        return Err("Service name must not be empty".into());
    }

    if config_path.exists() && !force {
        return Err(format!(
            "Config file '{}' already exists (use --force to overwrite)",
            config_path.display()
        )
        .into());
    }

    GateConfig::create_default(&config_path, &name)?;
    println!("📝 Created: {}", config_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_loadable_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gate.toml");

        execute(path.display().to_string(), "foo".to_string(), false).unwrap();

        let config = GateConfig::load(&path).unwrap();
        assert_eq!(config.service.name, "foo");
    }

    #[test]
    fn test_init_refuses_overwrite_without_force() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gate.toml");
        let path_str = path.display().to_string();

        execute(path_str.clone(), "foo".to_string(), false).unwrap();
        assert!(execute(path_str.clone(), "bar".to_string(), false).is_err());

        execute(path_str, "bar".to_string(), true).unwrap();
        assert_eq!(GateConfig::load(&path).unwrap().service.name, "bar");
    }

    #[test]
    fn test_init_rejects_empty_name() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gate.toml");
        assert!(execute(path.display().to_string(), " ".to_string(), false).is_err());
        assert!(!path.exists());
    }
}
