//! `pagetrack status` — Show the effective configuration.

use pagetrack_config::TrackerConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = TrackerConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let policy = config.retry.to_policy();

    println!("📦 pagetrack Status");
    println!("===================");
    println!("  Config dir:   {}", TrackerConfig::config_dir().display());
    println!("  Track URL:    {}", config.track_url());
    println!(
        "  Remote log:   {}",
        if config.remote_log { config.log_url() } else { "disabled".to_string() }
    );
    println!("  Timeout:      {}s", config.request_timeout_secs);
    match policy.max_attempts {
        Some(max) => println!("  Retries:      up to {max} attempts"),
        None => println!("  Retries:      unlimited"),
    }
    println!("  Backoff:      {}ms", config.retry.backoff_ms);
    println!(
        "  Auto-seed:    {}",
        if config.seed.enabled { config.seed.marker_attribute.as_str() } else { "disabled" }
    );
    println!("  Log level:    {}", config.logging.level);

    let config_path = TrackerConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `pagetrack init` first");
    }

    Ok(())
}
