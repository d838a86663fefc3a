mod config;
mod generate_cmd;
mod render;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use vigor_core::completion::CompletionTracker;
use vigor_core::profile::{
    DEFAULT_SLEEP_TIME, DEFAULT_WAKE_TIME, DietaryPreference, ExerciseLevel, ProfileDraft,
    WorkSchedule,
};
use vigor_core::progress::projected_levels;
use vigor_core::schedule::fallback_ref;

use config::{Overrides, Provider};

#[derive(Parser)]
#[command(name = "vigor", about = "Weekly health-routine planner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a vigor config file
    Init {
        /// Gemini API key to store in the config file
        #[arg(long)]
        api_key: Option<String>,
        /// AI provider: gemini or command
        #[arg(long, default_value = "gemini")]
        provider: Provider,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Generate a weekly plan for a profile
    Generate {
        #[command(flatten)]
        profile: ProfileArgs,
        /// Day to show in detail (0 = first day)
        #[arg(long, default_value_t = 0)]
        day: usize,
        /// Comma-separated item indices already done on that day (e.g. "0,2")
        #[arg(long, value_delimiter = ',')]
        done: Vec<usize>,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
        /// Skip the AI backend and use the built-in plan
        #[arg(long)]
        offline: bool,
        /// AI request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Language for generated text (e.g. "Korean")
        #[arg(long)]
        language: Option<String>,
    },
    /// Show the 7-day projected level series
    Project {
        /// Current level in mg/dL
        #[arg(long)]
        level: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the built-in weekly plan
    Fallback {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate a profile without generating anything
    Check {
        #[command(flatten)]
        profile: ProfileArgs,
    },
}

/// Profile fields shared by `generate` and `check`.
#[derive(Args, Debug, Clone)]
pub struct ProfileArgs {
    /// Current level in mg/dL
    #[arg(long)]
    level: String,
    /// Wake-up time (HH:MM)
    #[arg(long, default_value = DEFAULT_WAKE_TIME)]
    wake: String,
    /// Bedtime (HH:MM)
    #[arg(long, default_value = DEFAULT_SLEEP_TIME)]
    sleep: String,
    /// Work schedule: standard, shift, remote, irregular
    #[arg(long, default_value = "standard")]
    work: WorkSchedule,
    /// Exercise level: beginner, intermediate, advanced
    #[arg(long, default_value = "beginner")]
    exercise: ExerciseLevel,
    /// Diet: general, korean, vegetarian, pescatarian
    #[arg(long, default_value = "general")]
    diet: DietaryPreference,
}

impl ProfileArgs {
    fn to_draft(&self) -> ProfileDraft {
        ProfileDraft {
            current_level: self.level.clone(),
            wake_time: self.wake.clone(),
            sleep_time: self.sleep.clone(),
            work_schedule: self.work,
            exercise_level: self.exercise,
            dietary_preference: self.diet,
        }
    }
}

/// Execute the `vigor init` command: write config file.
fn cmd_init(api_key: Option<&str>, provider: Provider, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        ai: config::AiSection {
            provider: Some(provider),
            api_key: api_key.map(str::to_string),
            ..config::AiSection::default()
        },
        generation: config::GenerationSection::default(),
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  ai.provider = {provider}");
    match api_key {
        Some(key) => println!("  ai.api_key = {}", mask_key(key)),
        None if provider == Provider::Gemini => {
            println!();
            println!(
                "No API key stored: set VIGOR_GEMINI_API_KEY or re-run with --api-key to enable AI generation."
            );
        }
        None => {}
    }

    Ok(())
}

/// Show only the ends of a secret.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Execute the `vigor project` command.
fn cmd_project(level: &str, json: bool) -> anyhow::Result<()> {
    let profile = ProfileDraft::with_level(level).validate()?;
    let series = projected_levels(profile.current_level);
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&series).context("failed to serialize projection")?
        );
    } else {
        print!("{}", render::format_projection(&series));
    }
    Ok(())
}

/// Execute the `vigor fallback` command.
fn cmd_fallback(json: bool) -> anyhow::Result<()> {
    let schedule = fallback_ref();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(schedule).context("failed to serialize schedule")?
        );
        return Ok(());
    }

    let completions = CompletionTracker::new();
    print!("{}", render::format_week(schedule, &completions));
    for (idx, day) in schedule.week_schedule.iter().enumerate() {
        println!();
        print!("{}", render::format_day(day, idx, &completions));
    }
    Ok(())
}

/// Execute the `vigor check` command.
fn cmd_check(profile: &ProfileArgs) -> anyhow::Result<()> {
    let profile = profile.to_draft().validate()?;
    println!("Profile OK");
    println!("  level:    {} mg/dL", profile.current_level);
    println!("  wake:     {}", profile.wake_time);
    println!("  sleep:    {}", profile.sleep_time);
    println!("  work:     {}", profile.work_schedule);
    println!("  exercise: {}", profile.exercise_level);
    println!("  diet:     {}", profile.dietary_preference);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `--json` output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            api_key,
            provider,
            force,
        } => {
            cmd_init(api_key.as_deref(), provider, force)?;
        }
        Commands::Generate {
            profile,
            day,
            done,
            json,
            offline,
            timeout,
            language,
        } => {
            let overrides = Overrides {
                offline,
                timeout_secs: timeout,
                language,
            };
            generate_cmd::run_generate(&profile.to_draft(), day, &done, json, &overrides).await?;
        }
        Commands::Project { level, json } => {
            cmd_project(&level, json)?;
        }
        Commands::Fallback { json } => {
            cmd_fallback(json)?;
        }
        Commands::Check { profile } => {
            cmd_check(&profile)?;
        }
    }

    Ok(())
}
