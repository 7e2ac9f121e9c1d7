use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use snapkeep::{FixedClock, NameFormat, PruneOptions, PrunePlan, Pruner, ScheduleCache};

#[derive(Parser, Debug)]
#[command(name = "snapkeep-plan")]
#[command(about = "Preview which snapshots a retention policy would keep or remove")]
struct Args {
    /// File with one snapshot name per line (default: stdin)
    #[arg(long)]
    names: Option<PathBuf>,

    /// Rotation policy, e.g. "6,1h2d,1d2w" (empty keeps everything)
    #[arg(short, long, default_value = "")]
    policy: String,

    /// Prefix of managed snapshot names
    #[arg(long, default_value = NameFormat::DEFAULT_PREFIX)]
    prefix: String,

    /// Timestamp layout following the prefix (time format description)
    #[arg(long, default_value = NameFormat::DEFAULT_TIMESTAMP)]
    format: String,

    /// Reference time as RFC 3339 (default: now)
    #[arg(long)]
    now: Option<String>,

    /// Snapshot names to keep regardless of policy
    #[arg(long)]
    pin: Vec<String>,

    /// Fail if any snapshot is dated after the reference time
    #[arg(long)]
    strict: bool,

    /// Print the plan as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let raw = match &args.names {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read names from {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read names from stdin")?;
            buf
        }
    };
    let names: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let format = NameFormat::new(args.prefix, &args.format)?;
    let mut options = PruneOptions::default()
        .with_dry_run(true)
        .with_format(format)
        .with_reject_future(args.strict);
    options.pinned.extend(args.pin);

    let mut pruner = Pruner::new().with_cache(Arc::new(ScheduleCache::new()));
    if let Some(now) = &args.now {
        let now = OffsetDateTime::parse(now, &Rfc3339)
            .with_context(|| format!("invalid --now {now:?}"))?;
        pruner = pruner.with_clock(Arc::new(FixedClock(now)));
    }

    let plan = pruner
        .build_plan(&names, &args.policy, &options)
        .with_context(|| format!("failed to evaluate policy {:?}", args.policy))?;

    info!("{} names read; {}", names.len(), plan.summary());
    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

fn print_plan(plan: &PrunePlan) {
    for entry in &plan.keep {
        let marker = if plan.future.iter().any(|f| f.name == entry.name) {
            "keep (future)"
        } else {
            "keep"
        };
        println!("{marker:<14} {}", entry.name);
    }
    for entry in &plan.remove {
        println!("{:<14} {}", "remove", entry.name);
    }
    for name in &plan.unmanaged {
        println!("{:<14} {}", "unmanaged", name);
    }
}
