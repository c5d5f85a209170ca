use anyhow::Result;
use stargazer_etl::{config, Config};

/// Show the effective configuration, CLI overrides included.
pub fn show_config(config: &Config) {
    println!("Current Configuration");
    println!("=====================\n");

    println!("Config file: {}", config::config_file_path().display());

    let exists = config::config_file_path().exists();
    println!("File exists: {}\n", if exists { "yes" } else { "no (using defaults)" });

    println!("Settings:");
    println!(
        "  api_key: {}",
        if config.api_key.is_some() {
            "<set>"
        } else {
            "<not set, using DEMO_KEY>"
        }
    );
    println!("  database_path: {}", config.database_path.display());
    println!("  max_retries: {}", config.max_retries);
    println!("  retry_wait_secs: {}", config.retry_wait_secs);
    println!("  base_url: {}", config.base_url);

    println!("\nPriority: CLI args > ENV vars (APOD_*) > Config file > Defaults");
}

/// Show the config file path.
pub fn show_path() {
    println!("{}", config::config_file_path().display());
}

/// Show example configuration.
pub fn show_example() {
    print!("{}", config::example_config());
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to configure stargazer.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
