//! `pagetrack init` — Write the default configuration.

use pagetrack_config::TrackerConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = TrackerConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("📦 pagetrack — Setup");
    println!("====================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run init.\n");
        return Ok(());
    }

    std::fs::write(&config_path, TrackerConfig::default_toml())?;
    println!("✅ Created config.toml at: {}", config_path.display());
    println!("\n📝 Next steps:");
    println!("   1. Set `endpoint` in {}", config_path.display());
    println!("   2. Run: pagetrack doctor");
    println!("   3. Run: pagetrack replay --buffer queue.json\n");

    Ok(())
}
