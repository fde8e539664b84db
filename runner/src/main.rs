// ═══════════════════════════════════════════════════════════════════════
// Runner — CLI entry point for single battles, bot tournaments, reports
// ═══════════════════════════════════════════════════════════════════════

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use warband_agents::{Agent, BotAgent, BotConfig, Difficulty};
use warband_engine::setup::BattleSetup;
use warband_engine::types::*;
use warband_engine::EngineConfig;
use warband_tournament::{run_batch, run_battle, BatchPlan, BattleResult, Database};

#[derive(Parser)]
#[command(name = "warband-runner", about = "Tactical card-combat lab")]
struct Cli {
    /// Debug-level logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
    /// JSON file holding `{ "engine": {...}, "bot": {...} }`
    #[arg(short, long, global = true)]
    config: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single bot-vs-bot battle and print its log
    Play {
        #[arg(short, long, default_value_t = 42)]
        seed: u64,
        #[command(flatten)]
        lineup: Lineup,
        #[command(flatten)]
        battlefield: Battlefield,
        /// Print the result as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Run a batch of battles in parallel and store the results
    Tournament {
        #[arg(short, long, default_value_t = 100)]
        battles: u64,
        #[arg(short, long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value = "results.db")]
        db: String,
        #[command(flatten)]
        lineup: Lineup,
        #[command(flatten)]
        battlefield: Battlefield,
    },
    /// Show bot win rates from the database
    Report {
        #[arg(long, default_value = "results.db")]
        db: String,
    },
}

#[derive(Args)]
struct Lineup {
    /// Attacker culture; the attacking bot picks one when omitted
    #[arg(long)]
    attacker: Option<String>,
    /// Defender culture; the defending bot picks one when omitted
    #[arg(long)]
    defender: Option<String>,
    #[arg(long, default_value = "hard")]
    attacker_bot: String,
    #[arg(long, default_value = "medium")]
    defender_bot: String,
}

#[derive(Args)]
struct Battlefield {
    /// Terrain; a random battlefield is rolled when omitted
    #[arg(long)]
    terrain: Option<String>,
    #[arg(long)]
    climate: Option<String>,
    #[arg(long)]
    season: Option<String>,
    /// Secondary terrain marker (repeatable)
    #[arg(long = "feature")]
    features: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    engine: EngineConfig,
    bot: BotConfig,
}

const MAX_DECISIONS: usize = 50_000;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Play { seed, lineup, battlefield, json } => cmd_play(&config, seed, &lineup, &battlefield, json),
        Commands::Tournament { battles, seed, db, lineup, battlefield } => {
            cmd_tournament(&config, battles, seed, &db, &lineup, &battlefield)
        }
        Commands::Report { db } => cmd_report(&db),
    });

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn load_config(path: Option<&str>) -> Result<ConfigFile, String> {
    let Some(path) = path else {
        return Ok(ConfigFile::default());
    };
    let text = std::fs::read_to_string(path).map_err(|e| format!("reading {}: {}", path, e))?;
    let config: ConfigFile = serde_json::from_str(&text).map_err(|e| format!("parsing {}: {}", path, e))?;
    info!(path, "loaded config");
    Ok(config)
}

// ── Argument parsing ───────────────────────────────────────────────────

fn parse<T>(kind: &str, name: &str, from_name: fn(&str) -> Option<T>) -> Result<T, String> {
    from_name(name).ok_or_else(|| format!("unknown {}: {}", kind, name))
}

fn parse_opt<T>(kind: &str, name: Option<&str>, from_name: fn(&str) -> Option<T>) -> Result<Option<T>, String> {
    name.map(|n| parse(kind, n, from_name)).transpose()
}

impl Lineup {
    fn difficulties(&self) -> Result<(Difficulty, Difficulty), String> {
        Ok((
            parse("difficulty", &self.attacker_bot, Difficulty::from_name)?,
            parse("difficulty", &self.defender_bot, Difficulty::from_name)?,
        ))
    }

    /// Cultures for both sides. An omitted culture is picked by that side's bot.
    fn cultures(&self, agents: &mut [Box<dyn Agent>; 2]) -> Result<(Culture, Culture), String> {
        let mut pick = |side: Side, name: Option<&str>| -> Result<Culture, String> {
            match parse_opt("culture", name, Culture::from_name)? {
                Some(c) => Ok(c),
                None => Ok(agents[side.index()].choose_culture(&Culture::ALL)),
            }
        };
        Ok((pick(Side::Attacker, self.attacker.as_deref())?, pick(Side::Defender, self.defender.as_deref())?))
    }
}

impl Battlefield {
    /// `None` when no terrain was given; partial flags fill in from the default.
    fn environment(&self) -> Result<Option<Environment>, String> {
        let Some(terrain) = parse_opt("terrain", self.terrain.as_deref(), Terrain::from_name)? else {
            return Ok(None);
        };
        let defaults = Environment::default();
        Ok(Some(Environment {
            terrain,
            secondary_terrain: self.features.iter()
                .map(|f| parse("terrain feature", f, SecondaryTerrain::from_name))
                .collect::<Result<_, _>>()?,
            climate: parse_opt("climate", self.climate.as_deref(), Climate::from_name)?.unwrap_or(defaults.climate),
            season: parse_opt("season", self.season.as_deref(), Season::from_name)?.unwrap_or(defaults.season),
        }))
    }
}

fn bots(config: &BotConfig, attacker: Difficulty, defender: Difficulty, seed: u64) -> [Box<dyn Agent>; 2] {
    [
        Box::new(BotAgent::with_config(Side::Attacker, attacker, config.clone(), seed)),
        Box::new(BotAgent::with_config(Side::Defender, defender, config.clone(), seed.wrapping_add(1))),
    ]
}

// ── Commands ───────────────────────────────────────────────────────────

fn cmd_play(config: &ConfigFile, seed: u64, lineup: &Lineup, battlefield: &Battlefield, json: bool) -> Result<(), String> {
    let (attacker_bot, defender_bot) = lineup.difficulties()?;
    let mut agents = bots(&config.bot, attacker_bot, defender_bot, seed);
    let (attacker, defender) = lineup.cultures(&mut agents)?;
    let environment = battlefield.environment()?
        .unwrap_or_else(|| warband_tournament::random_environment(seed));
    let setup = BattleSetup::new(attacker, defender, seed).with_environment(environment);

    let result = run_battle(&mut agents, &setup, &config.engine, MAX_DECISIONS)?;
    if json {
        let text = serde_json::to_string_pretty(&result).map_err(|e| e.to_string())?;
        println!("{}", text);
    } else {
        print_battle(&result);
    }
    Ok(())
}

fn print_battle(result: &BattleResult) {
    let env = &result.environment;
    println!("=== Battle (seed {}) ===", result.seed);
    println!("  {:?} / {:?} / {:?} {:?}\n", env.terrain, env.climate, env.season, env.secondary_terrain);

    for entry in &result.log {
        let actor = entry.actor.map_or_else(|| "-".to_string(), |s| s.to_string());
        println!("  [r{:>2} {:<12}] {:<8} {}", entry.round, entry.phase.to_string(), actor, entry.summary);
    }

    println!();
    match result.winner() {
        Some(side) => println!("Winner: {} ({})", side, result.side(side).agent_name),
        None => println!("Result: draw"),
    }
    println!("Rounds: {}, decisions: {}", result.rounds_played, result.decisions);
    for s in &result.sides {
        println!("  {:<8} {:<12} {:<10} hp {:>3}  cards {}", s.side.to_string(), s.agent_name, s.culture.to_string(), s.final_hp, s.cards_played);
    }
}

fn cmd_tournament(
    config: &ConfigFile,
    battles: u64,
    seed: u64,
    db_path: &str,
    lineup: &Lineup,
    battlefield: &Battlefield,
) -> Result<(), String> {
    let (attacker_bot, defender_bot) = lineup.difficulties()?;
    let mut pickers = bots(&config.bot, attacker_bot, defender_bot, seed);
    let (attacker, defender) = lineup.cultures(&mut pickers)?;
    println!(
        "=== Tournament: {} battles, {} ({}) vs {} ({}) ===\n",
        battles, attacker, attacker_bot, defender, defender_bot
    );

    let plan = BatchPlan {
        attacker: (attacker, attacker_bot),
        defender: (defender, defender_bot),
        environment: battlefield.environment()?,
        engine: config.engine.clone(),
        bot: config.bot.clone(),
        first_seed: seed,
        battles,
        max_decisions: MAX_DECISIONS,
    };
    let results = run_batch(&plan);

    let mut db = Database::new(db_path).map_err(|e| e.to_string())?;
    let mut tally: BTreeMap<&str, u64> = BTreeMap::new();
    let mut errors = 0u64;
    for (i, result) in results.iter().enumerate() {
        match result {
            Ok(r) => {
                db.store_battle(r).map_err(|e| e.to_string())?;
                let key = match r.winner() {
                    Some(Side::Attacker) => "attacker",
                    Some(Side::Defender) => "defender",
                    None => "draw",
                };
                *tally.entry(key).or_insert(0) += 1;
            }
            Err(e) => {
                errors += 1;
                eprintln!("Battle {} (seed {}): ERROR -- {}", i + 1, seed.wrapping_add(i as u64), e);
            }
        }
    }

    println!("--- Summary ({} battles, {} errors) ---", battles, errors);
    for key in ["attacker", "defender", "draw"] {
        let n = tally.get(key).copied().unwrap_or(0);
        let pct = if battles > 0 { n as f64 / battles as f64 * 100.0 } else { 0.0 };
        println!("  {:10}: {:>5} ({:.1}%)", key, n, pct);
    }
    println!("\nResults saved to: {}", db_path);
    println!("Total battles in DB: {}", db.battle_count().map_err(|e| e.to_string())?);
    Ok(())
}

fn cmd_report(db_path: &str) -> Result<(), String> {
    let db = Database::new(db_path).map_err(|e| e.to_string())?;
    let rates = db.win_rates().map_err(|e| e.to_string())?;
    if rates.is_empty() {
        println!("No bots found. Run a tournament first.");
        return Ok(());
    }
    println!("=== Win rates ===\n");
    println!("{:<16} {:>8} {:>8} {:>8} {:>8}", "Bot", "Battles", "Wins", "Draws", "Win %");
    println!("{}", "-".repeat(52));
    for r in &rates {
        println!("{:<16} {:>8} {:>8} {:>8} {:>7.1}%", r.name, r.battles, r.wins, r.draws, r.win_rate() * 100.0);
    }
    Ok(())
}
