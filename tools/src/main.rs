//! mapping-runner: headless driver for one worker-to-role mapping board.
//!
//! Usage:
//!   mapping-runner --pool da --seed 7 --db mapping.db --apply 5
//!   mapping-runner --pool ta --ipc-mode
//!
//! A database without workers of the requested pool is seeded from the
//! synthetic pool generator first.

use anyhow::Result;
use chrono::NaiveDate;
use mapping_core::{
    command::{DragDrop, Intent},
    config::MappingConfig,
    controller::IntentOutcome,
    engine::MappingEngine,
    fulfillment::FulfillmentSummary,
    pool_generator::{PoolGenerator, PoolShape},
    recommendation::Recommendation,
    snapshot::{RoleSnapshot, WorkerSnapshot},
    store::MappingStore,
    types::{LifecycleStatus, WorkerKind},
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Intent { intent: Intent },
    Drag { drag: DragDrop },
    Recommend,
    Refresh,
    Quit,
}

#[derive(serde::Serialize)]
struct BoardState {
    pool:        WorkerKind,
    workers:     Vec<WorkerSnapshot>,
    roles:       Vec<RoleSnapshot>,
    summary:     FulfillmentSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome:     Option<IntentOutcome>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let workers = parse_arg(&args, "--workers", 12usize);
    let roles = parse_arg(&args, "--roles", 8usize);
    let apply = parse_arg(&args, "--apply", 5usize);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let data_dir = flag_value(&args, "--data-dir").unwrap_or("./data");
    let kind = match flag_value(&args, "--pool").unwrap_or("da") {
        "ta" => WorkerKind::TalentAcquisition,
        "da" => WorkerKind::DeliveryAssociate,
        other => anyhow::bail!("unknown pool '{other}', expected da or ta"),
    };

    if !ipc_mode {
        println!("mapping-runner: worker-to-role mapping board");
        println!("  pool:      {}", kind.label());
        println!("  seed:      {seed}");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!();
    }

    let config = MappingConfig::load(data_dir)?;
    let store = MappingStore::open(db)?;
    store.migrate()?;

    if store.workers_of_kind(kind)?.is_empty() {
        let epoch = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
        let shape = PoolShape { delivery_workers: workers, talent_workers: workers, roles };
        store.import_snapshot(&PoolGenerator::new(seed, epoch).generate(shape))?;
        log::info!("runner: seeded {} pool from generator (seed {seed})", kind.label());
    }

    let mut engine = MappingEngine::load(kind, config, store)?;

    if ipc_mode {
        run_ipc_loop(&mut engine)?;
    } else {
        let applied = apply_top_recommendations(&mut engine, apply)?;
        print_summary(&engine, applied)?;
    }

    Ok(())
}

fn run_ipc_loop(engine: &mut MappingEngine<MappingStore>) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetState => {
                writeln!(stdout, "{}", serde_json::to_string(&board_state(engine, None))?)?;
            }
            IpcCommand::Intent { intent } => {
                let outcome = engine.dispatch(intent)?;
                writeln!(stdout, "{}", serde_json::to_string(&board_state(engine, Some(outcome)))?)?;
            }
            IpcCommand::Drag { drag } => {
                let outcome = engine.drag_and_drop(drag)?;
                writeln!(stdout, "{}", serde_json::to_string(&board_state(engine, Some(outcome)))?)?;
            }
            IpcCommand::Recommend => {
                let recs: Vec<Recommendation> = engine.recommendations();
                writeln!(stdout, "{}", serde_json::to_string(&recs)?)?;
            }
            IpcCommand::Refresh => {
                engine.refresh()?;
                writeln!(stdout, "{}", serde_json::to_string(&board_state(engine, None))?)?;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn board_state(engine: &MappingEngine<MappingStore>, outcome: Option<IntentOutcome>) -> BoardState {
    BoardState {
        pool: engine.kind,
        workers: engine.worker_snapshot(),
        roles: engine.role_snapshot(),
        summary: engine.fulfillment_summary(),
        outcome,
    }
}

/// Greedily apply the best suggestion, re-ranking after each success.
fn apply_top_recommendations(engine: &mut MappingEngine<MappingStore>, limit: usize) -> Result<usize> {
    let mut applied = 0;
    while applied < limit {
        let Some(best) = engine.recommendations().into_iter().next() else {
            break;
        };
        let outcome = engine.dispatch(Intent::ApplyRecommendation {
            recommendation_id: best.recommendation_id.clone(),
        })?;
        match outcome.rejection() {
            None => {
                println!(
                    "  applied  {} -> {} as {} ({:.2}): {}",
                    best.worker_id, best.role_id, best.suggested_type, best.confidence, best.rationale
                );
                applied += 1;
            }
            Some(rejection) => {
                println!("  skipped  {}: {}", best.recommendation_id, rejection.message);
                break;
            }
        }
    }
    Ok(applied)
}

fn print_summary(engine: &MappingEngine<MappingStore>, applied: usize) -> Result<()> {
    let summary = engine.fulfillment_summary();
    let store = engine.repository();

    println!();
    println!("=== BOARD SUMMARY ===");
    println!("  pool:               {}", engine.kind.label());
    println!("  applied:            {applied}");
    println!("  roles:              {}", summary.total_roles);
    println!("  unassigned:         {}", summary.unassigned);
    println!("  partially assigned: {}", summary.partially_assigned);
    println!("  fully assigned:     {}", summary.fully_assigned);
    println!("  closed:             {}", summary.closed);
    println!("  overall:            {:.1}%", summary.overall_percent);
    println!("  active records:     {}", store.count_assignments(LifecycleStatus::Active)?);
    println!("  events logged:      {}", store.events_for_pool(engine.kind)?.len());

    println!();
    println!("=== WORKLOAD ===");
    for w in engine.worker_snapshot().iter().filter(|w| w.committed > 0) {
        println!(
            "  {:<8} {:<22} {:>3}% / {:>3}%  ({} live)",
            w.worker_id, w.name, w.committed, w.max_capacity, w.live_assignments
        );
    }
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
