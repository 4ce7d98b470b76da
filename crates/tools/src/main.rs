//! Headless expedition tools: a simulator that drives a full run with the
//! stock content provider, and a replayer that re-drives a recorded journal
//! and reports the final hash.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use expedition_core::content::keys;
use expedition_core::journal_file::{JournalWriter, load_journal_from_file};
use expedition_core::replay::replay_to_end;
use expedition_core::{
    ExpeditionRun, InputPayload, PlayerSnapshot, RunJournal, StockProvider,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate one full expedition
    Run {
        /// Run seed; a fresh one is generated when omitted
        #[arg(short, long)]
        seed: Option<u64>,
        /// Dungeon tier id
        #[arg(short, long, default_value_t = 1)]
        tier: u8,
        /// Player level fed into the run
        #[arg(short, long, default_value_t = 1)]
        level: u32,
        /// Goal kind for the run
        #[arg(short, long, default_value = keys::GOAL_FIND_KEY)]
        goal: String,
        /// Record the input journal to this JSONL file
        #[arg(short, long)]
        journal: Option<PathBuf>,
    },
    /// Re-drive a recorded journal and print the final hash
    Replay {
        /// Path to the journal JSONL file
        #[arg(short, long)]
        journal: PathBuf,
    },
}

static GENERATED_SEED_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Entropy for unseeded invocations: wall clock, pid, and a process-local
/// counter, passed through a finalizing mixer.
fn generate_runtime_seed() -> u64 {
    let now_nanos =
        SystemTime::now().duration_since(UNIX_EPOCH).map_or(0_u128, |duration| duration.as_nanos());
    let pid = u64::from(std::process::id());
    let counter = GENERATED_SEED_COUNTER.fetch_add(1, Ordering::Relaxed);

    let mut mixed = (now_nanos as u64)
        ^ ((now_nanos >> 64) as u64)
        ^ pid.rotate_left(17)
        ^ counter.rotate_left(7);
    mixed ^= mixed >> 30;
    mixed = mixed.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    mixed ^= mixed >> 27;
    mixed = mixed.wrapping_mul(0x94D0_49BB_1331_11EB);
    mixed ^ (mixed >> 31)
}

fn player_for_level(level: u32) -> PlayerSnapshot {
    PlayerSnapshot {
        health: 30 + level as i32 * 4,
        max_health: 30 + level as i32 * 4,
        mana: 12 + level as i32,
        max_mana: 12 + level as i32,
        dexterity: 10 + level,
        luck: 5,
        level,
    }
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Commands::Run { seed, tier, level, goal, journal } => {
            simulate(seed.unwrap_or_else(generate_runtime_seed), tier, level, &goal, journal)
        }
        Commands::Replay { journal } => replay(&journal),
    }
}

fn simulate(seed: u64, tier: u8, level: u32, goal: &str, journal_path: Option<PathBuf>) -> Result<()> {
    let provider = StockProvider::new(seed);
    let mut run = ExpeditionRun::start(tier, player_for_level(level), goal, seed)
        .map_err(|e| anyhow::anyhow!("failed to start run: {e}"))?;

    println!("== {} (tier {}, seed {seed}) ==", run.tier().name, run.tier().id);
    println!("Goal: {}", run.goal().description);
    for affix in run.affixes() {
        println!("Affix: {} - {}", affix.name, affix.description);
    }
    println!();

    let journal = RunJournal::new(seed, tier, goal, player_for_level(level));
    let mut writer = match &journal_path {
        Some(path) => Some(
            JournalWriter::create(path, &journal)
                .with_context(|| format!("failed to create journal at {}", path.display()))?,
        ),
        None => None,
    };

    for (index, room_id) in run.room_order().to_vec().into_iter().enumerate() {
        let result = run
            .enter_room(room_id, &provider)
            .map_err(|e| anyhow::anyhow!("room {index} refused entry: {e}"))?;
        if let Some(writer) = writer.as_mut() {
            writer.append(&InputPayload::EnterRoom { room_index: index })?;
        }

        for line in &result.lines {
            println!("  {line}");
        }
        for item in &result.items {
            println!("  * Looted {} x{}", item.name, item.quantity);
        }
        if let Some(enemy) = &result.enemy {
            println!(
                "  > Battle: {} (lv {}, hp {}, atk {})",
                enemy.name, enemy.level, enemy.health, enemy.attack
            );
        }
        if result.sub_flow.is_some() {
            run.resolve_room().map_err(|e| anyhow::anyhow!("resolve failed: {e}"))?;
            if let Some(writer) = writer.as_mut() {
                writer.append(&InputPayload::ResolveRoom)?;
            }
        }
    }

    println!();
    println!("Torches: {}", run.torch_status().describe());
    println!("Rank: {}", run.rank().label());
    println!("Advice: {:?} ({:?})", run.exit_recommendation(), run.exit_risk());

    let hash = run.snapshot_hash();
    let goal_completed = run.goal().completed;
    let rewards = run.exit_run().map_err(|e| anyhow::anyhow!("exit failed: {e}"))?;

    println!();
    println!("== Rewards ==");
    if !goal_completed {
        println!("(the expedition's goal was left incomplete)");
    }
    println!("Base: {} gold, {} exp", rewards.base_gold, rewards.base_exp);
    println!(
        "Multiplier: {:.2} (exploration {:.2} + torches {:.2} + goal {:.2})",
        rewards.total_multiplier,
        rewards.exploration_multiplier,
        rewards.torch_bonus,
        rewards.goal_bonus
    );
    println!("Final: {} gold, {} exp", rewards.final_gold, rewards.final_exp);
    for item in &rewards.items {
        println!("Item: {} x{}", item.name, item.quantity);
    }
    println!("Snapshot hash: {hash:#018x}");

    Ok(())
}

fn replay(path: &PathBuf) -> Result<()> {
    let loaded = load_journal_from_file(path)
        .map_err(|e| anyhow::anyhow!("failed to load journal: {e}"))?;
    let provider = StockProvider::new(loaded.journal.seed);
    let result = replay_to_end(&loaded.journal, &provider)
        .map_err(|e| anyhow::anyhow!("replay failed: {e}"))?;

    println!("Replay complete.");
    println!("Rooms resolved: {}", result.rooms_resolved);
    println!("Final: {} gold, {} exp", result.rewards.final_gold, result.rewards.final_exp);
    println!("Snapshot hash: {:#018x}", result.final_snapshot_hash);
    Ok(())
}
