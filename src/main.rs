//! Honeypot Scan - static honeypot screening for EVM token contracts
//!
//! Usage:
//!   honeypot_scan <file.sol|0xADDRESS>...
//!
//! Local `.sol` files are scanned offline. Addresses go through the full
//! pipeline (chain detection, verified source fetch, detection) and need
//! explorer API keys in the environment (`ETHERSCAN_API_KEY_1..6` or
//! `ETHERSCAN_API_KEYS`).
//!
//! Exit status: 0 when nothing was flagged, 1 when at least one target is a
//! honeypot, 2 on usage errors or when a target could not be scanned.

use honeypot_scan::{AppConfig, ContractAnalyzer, Finding};

use eyre::{Result, WrapErr};
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

enum Outcome {
    Clean,
    Honeypot,
    Failed,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let targets: Vec<String> = std::env::args().skip(1).collect();
    if targets.is_empty() || targets.iter().any(|t| t == "-h" || t == "--help") {
        print_usage();
        return Ok(ExitCode::from(2));
    }

    let config = AppConfig::from_env();
    let analyzer = ContractAnalyzer::new(&config)?;

    let mut honeypots = 0usize;
    let mut failures = 0usize;

    for target in &targets {
        match scan_target(&analyzer, target).await {
            Outcome::Clean => {}
            Outcome::Honeypot => honeypots += 1,
            Outcome::Failed => failures += 1,
        }
    }

    println!();
    println!("📊 Summary:");
    println!("   Targets scanned:  {}", targets.len());
    println!("   Honeypots:        {}", honeypots);
    println!("   Failed:           {}", failures);

    let code = if honeypots > 0 {
        1
    } else if failures > 0 {
        2
    } else {
        0
    };
    Ok(ExitCode::from(code))
}

async fn scan_target(analyzer: &ContractAnalyzer, target: &str) -> Outcome {
    println!();
    println!("🔍 {}", target);

    if looks_like_address(target) {
        return match analyzer.scan_address(target, false).await {
            Ok(result) => {
                println!("   Chain:       {}", result.chain.display_name());
                if let Some(meta) = &result.token_metadata {
                    if let Some(name) = &meta.name {
                        println!("   Contract:    {}", name);
                    }
                    if let Some(symbol) = &meta.symbol {
                        println!("   Symbol:      {}", symbol);
                    }
                }
                if result.cached {
                    println!("   (served from cache)");
                }
                print_verdict(result.is_honeypot, result.confidence, &result.message);
                print_findings(&result.patterns);
                print_warnings(&result.warnings);
                verdict_outcome(result.is_honeypot)
            }
            Err(e) => {
                println!("   ❌ {} ({})", e.public_message(), e.code_str());
                Outcome::Failed
            }
        };
    }

    let code = match read_source(Path::new(target)) {
        Ok(code) => code,
        Err(e) => {
            println!("   ❌ {:#}", e);
            return Outcome::Failed;
        }
    };

    match analyzer.scan_code(&code) {
        Ok(result) => {
            println!("   Lines:       {}", result.stats.lines);
            println!("   Characters:  {}", result.stats.chars);
            print_verdict(result.is_honeypot, result.confidence, &result.message);
            print_findings(&result.patterns);
            print_warnings(&result.warnings);
            verdict_outcome(result.is_honeypot)
        }
        Err(e) => {
            println!("   ❌ {} ({})", e.public_message(), e.code_str());
            Outcome::Failed
        }
    }
}

fn looks_like_address(target: &str) -> bool {
    let lower = target.to_ascii_lowercase();
    lower.starts_with("0x") && !lower.ends_with(".sol") && !Path::new(target).exists()
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).wrap_err_with(|| format!("Failed to read {}", path.display()))
}

fn verdict_outcome(is_honeypot: bool) -> Outcome {
    if is_honeypot {
        Outcome::Honeypot
    } else {
        Outcome::Clean
    }
}

fn print_verdict(is_honeypot: bool, confidence: u8, message: &str) {
    let label = if is_honeypot { "🍯 HONEYPOT" } else { "✅ SAFE" };
    println!("   Verdict:     {} ({}% confidence)", label, confidence);
    println!("   {}", message);
}

fn print_findings(findings: &[Finding]) {
    for finding in findings {
        println!(
            "   - {} (line {}): {}",
            finding.pattern_name, finding.line_number, finding.code_snippet
        );
    }
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        println!("   ⚠️ {}", warning);
    }
}

fn print_usage() {
    eprintln!("Usage: honeypot_scan <file.sol|0xADDRESS>...");
    eprintln!();
    eprintln!("  file.sol    Scan a local Solidity file (offline)");
    eprintln!("  0xADDRESS   Scan a deployed contract via the block explorer");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  ETHERSCAN_API_KEY_1..6 / ETHERSCAN_API_KEYS   Explorer API keys");
    eprintln!("  MIN_PATTERNS_FOR_DETECTION                     Detection threshold (default 1)");
    eprintln!("  RUST_LOG                                       Log level (default info)");
}
