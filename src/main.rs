use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use retrace_core::{init_logging, AppConfig};
use retrace_data::Viewport;
use retrace_io::{latest_recording, session_name, FileLogStore, LogStore};
use retrace_lib::app::{self, Inspection, RecordSummary, ReplaySummary};

#[derive(Parser, Debug)]
#[command(author, version, about = "Record and replay 2D scene sessions", long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, default_value = "retrace.toml")]
    config: String,

    /// Recordings directory (overrides the config)
    #[arg(short, long)]
    dir: Option<String>,

    /// Default log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output format for command results
    #[arg(long, value_enum, default_value = "text")]
    format: Format,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the demo battle headlessly and record it
    Record {
        /// Simulated seconds to run
        #[arg(short, long, default_value_t = 10)]
        seconds: u64,

        /// Session name (defaults to a timestamped one)
        #[arg(short, long)]
        name: Option<String>,

        /// Seed for the demo (overrides the config)
        #[arg(long)]
        seed: Option<u64>,

        /// Write per-entity ordinals into snapshots
        #[arg(long)]
        stable_ids: bool,
    },

    /// List stored recordings
    List,

    /// Summarize a recording
    Inspect {
        name: String,
    },

    /// Play a recording back headlessly (defaults to the latest)
    Replay {
        name: Option<String>,

        /// Playback speed multiplier (overrides the config)
        #[arg(long)]
        speed: Option<f32>,

        /// Target viewport as WIDTHxHEIGHT
        #[arg(long, value_parser = parse_viewport)]
        viewport: Option<Viewport>,
    },
}

fn parse_viewport(value: &str) -> Result<Viewport, String> {
    let (w, h) = value
        .split_once(|c: char| c == 'x' || c == 'X')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {value}"))?;
    let width = w.trim().parse::<u32>().map_err(|e| e.to_string())?;
    let height = h.trim().parse::<u32>().map_err(|e| e.to_string())?;
    Ok(Viewport::new(width, height))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let mut config = AppConfig::load(&args.config);
    if let Some(dir) = &args.dir {
        config.recording.directory = dir.clone();
    }

    match args.command {
        Command::Record {
            seconds,
            name,
            seed,
            stable_ids,
        } => {
            if let Some(seed) = seed {
                config.demo.seed = seed;
            }
            config.recording.stable_ids |= stable_ids;
            config.validate()?;
            let name = name.unwrap_or_else(|| session_name("session", chrono::Utc::now()));
            let store = FileLogStore::new_at(&config.recording.directory);
            let duration_ms = seconds.saturating_mul(1000);
            let (summary, _) = app::record_demo(
                &config,
                store,
                &name,
                duration_ms,
                app::default_script(duration_ms),
            )?;
            print_record(&summary, args.format)?;
        }
        Command::List => {
            let store = FileLogStore::new_at(&config.recording.directory);
            let names = store.list_recordings()?;
            match args.format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&names)?),
                Format::Text if names.is_empty() => {
                    println!("No recordings in {}", store.dir().display());
                }
                Format::Text => {
                    for name in names {
                        println!("{name}");
                    }
                }
            }
        }
        Command::Inspect { name } => {
            let store = FileLogStore::new_at(&config.recording.directory);
            let report = app::inspect_recording(&config, &store, &name)?;
            print_inspection(&report, args.format)?;
        }
        Command::Replay {
            name,
            speed,
            viewport,
        } => {
            if let Some(speed) = speed {
                config.replay.speed = speed;
            }
            config.validate()?;
            let store = FileLogStore::new_at(&config.recording.directory);
            let name = match name {
                Some(name) => name,
                None => latest_recording(&store)?.with_context(|| {
                    format!("no recordings in {}", store.dir().display())
                })?,
            };
            let summary = app::replay_recording(&config, &store, &name, viewport)?;
            print_replay(&summary, args.format)?;
        }
    }

    Ok(())
}

fn print_record(summary: &RecordSummary, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(summary)?),
        Format::Text => {
            println!("Recorded {}", summary.name);
            println!(
                "  {} ms over {} ticks, {} keyframes, {} inputs",
                summary.duration_ms,
                summary.ticks,
                summary.metrics.keyframes,
                summary.metrics.inputs
            );
            println!(
                "  final population {}, score {}",
                summary.final_population, summary.score
            );
            if summary.metrics.write_failures > 0 {
                println!("  recording stopped early after a write failure");
            }
        }
    }
    Ok(())
}

fn print_inspection(report: &Inspection, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(report)?),
        Format::Text => {
            println!("{}", report.name);
            println!(
                "  version {}, viewport {}x{}",
                report.version.as_deref().unwrap_or("?"),
                report.width,
                report.height
            );
            println!(
                "  {} keyframes, {} inputs, {} ms",
                report.frames, report.inputs, report.duration_ms
            );
            if report.skipped_lines > 0 {
                println!("  {} unreadable lines skipped", report.skipped_lines);
            }
            for (group, peak) in &report.peak_population {
                println!("  {group:<12} peak {peak}");
            }
            println!("  fingerprint {}", report.fingerprint);
        }
    }
    Ok(())
}

fn print_replay(summary: &ReplaySummary, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(summary)?),
        Format::Text => {
            println!(
                "Replaying {} ({} keyframes, {} ms)",
                summary.name, summary.frames, summary.duration_ms
            );
            for sample in &summary.samples {
                let groups: Vec<String> = sample
                    .population
                    .iter()
                    .map(|(name, count)| format!("{name}={count}"))
                    .collect();
                println!("  t={:>6}ms  {}", sample.t_ms, groups.join(" "));
            }
            println!(
                "  {} ticks, {} spawned, {} retired, {} inputs",
                summary.ticks,
                summary.spawned,
                summary.retired,
                summary.inputs.len()
            );
        }
    }
    Ok(())
}
