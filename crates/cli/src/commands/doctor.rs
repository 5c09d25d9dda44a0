//! `pagetrack doctor` — Diagnose configuration and collector health.

use pagetrack_collector::HttpCollector;
use pagetrack_config::TrackerConfig;
use pagetrack_core::collector::Collector;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 pagetrack Doctor — Diagnostics");
    println!("=================================\n");

    let mut issues = 0;

    let config_path = TrackerConfig::config_dir().join("config.toml");
    if !config_path.exists() {
        println!("  ⚠️  No config file — run `pagetrack init` (using defaults)");
        issues += 1;
    }

    let config = match TrackerConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  {} issue(s) found. See above for details.", issues + 1);
            return Ok(());
        }
    };

    match HttpCollector::from_config(&config) {
        Ok(collector) => match collector.health_check().await {
            Ok(true) => println!("  ✅ Collector reachable at {}", config.endpoint),
            Ok(false) => {
                println!("  ⚠️  Collector at {} reported unhealthy", config.endpoint);
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Collector unreachable: {e}");
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Could not build HTTP client: {e}");
            issues += 1;
        }
    }

    if config.retry.max_attempts == 0 && config.retry.backoff_ms == 0 {
        println!("  ℹ️  Unlimited retries, no backoff: failed deliveries are re-sent immediately");
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
