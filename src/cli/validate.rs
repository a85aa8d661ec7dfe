use super::config::GateConfig;
use service_suspend::pattern::AllowList;
use std::path::PathBuf;

/// Load a configuration file and print the effective gate settings
pub fn execute(config: String) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = PathBuf::from(config);
    let config = GateConfig::load(&config_path)?;
    super::logging::init(&config.logging)?;

    if config.service.name.trim().is_empty() {
        return Err("Service name must not be empty".into());
    }

    println!("✅ {} is valid", config_path.display());
    println!();
    println!("Service: {}", config.service.name);
    println!("Node: {}", config.service.node_id);
    println!(
        "Allowed actions while suspended: {}",
        describe(&config.suspend.allowed_actions)
    );
    println!(
        "Allowed events while suspended: {}",
        describe(&config.suspend.allowed_events)
    );
    match &config.suspend.handler {
        Some(handler) => println!("Transition handler: {} (resolved by the host)", handler),
        None => println!("Transition handler: none"),
    }
    if !config.suspend.dependencies.is_empty() {
        println!("Dependencies: {}", config.suspend.dependencies.join(", "));
    }

    Ok(())
}

/// One-line summary of an allow-list
pub fn describe(list: &AllowList) -> String {
    match list {
        AllowList::All => "all".to_string(),
        AllowList::Patterns(patterns) if patterns.is_empty() => "none".to_string(),
        AllowList::Patterns(patterns) => patterns
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    }
}
