//! `chatsieve config` — Configuration management commands.

use std::path::Path;

use chatsieve_config::AppConfig;

use super::load_config;

pub fn defaults() {
    print!("{}", AppConfig::default_toml());
}

pub fn show(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub fn path(config_path: Option<&Path>) {
    match config_path {
        Some(path) => println!("{}", path.display()),
        None => println!("{}", AppConfig::config_dir().join("config.toml").display()),
    }
}

pub fn validate(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match load_config(config_path) {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let mut warnings = Vec::new();
            let filter = &config.filter;
            if filter.similarity_threshold < 0.5 {
                warnings.push("similarity_threshold below 0.5 matches unrelated messages");
            }
            if filter.copy_paste_window_secs > filter.per_user_window_secs {
                warnings.push("copy_paste_window_secs is longer than per_user_window_secs");
            }
            if !filter.block_all_caps && !filter.block_char_repetition && !filter.block_ascii_art {
                warnings.push("All optional content rules are disabled");
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!("   Per-user window:  {}s", filter.per_user_window_secs);
            println!("   Copy-paste:       {}s", filter.copy_paste_window_secs);
            println!(
                "   Emote train:      {}s, {} senders",
                filter.train_window_secs, filter.train_threshold
            );
            println!("   Batch size:       {}", config.ingest.batch_size);
            println!("   Exempt senders:   {}", config.ingest.exempt_senders.len());
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}
