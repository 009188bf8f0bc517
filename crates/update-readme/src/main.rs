use anyhow::{Context, Result};
use clap::Parser;
use readme_digest::{Config, DigestBuilder, Document, FailurePolicy, ListOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "update-readme")]
#[command(about = "Refresh the latest repos, releases and TILs sections of a README")]
struct Args {
    /// README to update in place
    #[arg(short, long, default_value = "README.md")]
    readme: PathBuf,

    /// Number of entries per section
    #[arg(short, long, default_value = "5")]
    limit: usize,

    /// Render a failed list as empty instead of aborting
    #[arg(long)]
    keep_going: bool,

    /// Print the updated README instead of writing it
    #[arg(long)]
    dry_run: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "readme_digest=info,update_readme=info",
        1 => "readme_digest=debug,update_readme=debug",
        _ => "readme_digest=trace,update_readme=trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let config = Config::from_env()?;

    let options = ListOptions {
        limit: args.limit,
        policy: if args.keep_going {
            FailurePolicy::Empty
        } else {
            FailurePolicy::Fatal
        },
        ..ListOptions::default()
    };

    // Progress goes to stderr on dry runs so stdout carries only the document.
    let dry_run = args.dry_run;
    let say = |message: String| {
        if dry_run {
            eprintln!("{}", message);
        } else {
            println!("{}", message);
        }
    };

    say(format!("📄 Reading {}", args.readme.display()));
    let mut document = Document::load(&args.readme)?;

    say(format!("\n🐙 Fetching repos, releases and TILs for {}...", config.username));
    let builder = DigestBuilder::from_config(&config, options)?;
    let digest = builder.build().await.context("Failed to build digest")?;

    let missing = digest.apply(&mut document)?;
    if !missing.is_empty() {
        say(format!("\n⚠ Markers not found for {} section(s):", missing.len()));
        for section in &missing {
            say(format!("  ✗ <!-- {0} starts --> / <!-- {0} ends -->", section.marker()));
        }
    }

    if args.dry_run {
        print!("{}", document.as_str());
        return Ok(());
    }

    document
        .save(&args.readme)
        .context("Failed to save updated README")?;

    let name = args
        .readme
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.readme.display().to_string());
    println!("\n✅ {} updated successfully!", name);

    Ok(())
}
