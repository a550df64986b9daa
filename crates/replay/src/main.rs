mod model;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use anyhow::Result;
use clap::Parser;
use dnd_tree::{DragSession, DropOutcome, DropZoneConfig, FlatRecord, Forest};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::model::{Key, Payload, Step, label, parse_step};

/// Replay drag-and-drop moves against a tree stored as JSON.
#[derive(Debug, Parser)]
#[command(name = "dnd-tree-replay", version)]
struct Args {
    /// JSON file holding the tree.
    #[arg(long)]
    tree: PathBuf,

    /// Read the tree as a flat list of `{ id, pid, .. }` records.
    #[arg(long)]
    flat: bool,

    /// JSON file holding an array of moves.
    #[arg(long)]
    moves: Option<PathBuf>,

    /// A move as `<dragged>:<before|after|child>:<target>`, applied after `--moves`.
    #[arg(long = "move", value_name = "MOVE", value_parser = parse_step)]
    steps: Vec<Step>,

    /// Half-height of the "drop inside" band for pointer replays.
    #[arg(long, default_value_t = dnd_tree::DEFAULT_DROP_BAND)]
    band: f32,

    /// Print the resulting tree as JSON instead of an outline.
    #[arg(long)]
    json: bool,
}

type Tree = Forest<Key, Payload>;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let forest = load_tree(&args)?;
    info!(nodes = forest.len(), "tree loaded");

    let mut steps = match args.moves.as_ref() {
        Some(path) => load_steps(path)?,
        None => Vec::new(),
    };
    steps.extend(args.steps.iter().cloned());

    let mut session = DragSession::new().config(DropZoneConfig::new(args.band));
    let (forest, applied) = replay_all(forest, &mut session, &steps);
    info!(applied, skipped = steps.len() - applied, "replay finished");

    if args.json {
        println!("{}", forest.to_json_pretty()?);
    } else {
        print!("{}", forest.outline_with(label));
    }
    Ok(())
}

fn load_tree(args: &Args) -> Result<Tree> {
    let text = fs::read_to_string(&args.tree)
        .with_context(|| format!("failed to read {}", args.tree.display()))?;

    if args.flat {
        let records: Vec<FlatRecord<Key, Payload>> = serde_json::from_str(&text)
            .with_context(|| format!("{} is not a list of records", args.tree.display()))?;
        Forest::from_flat(records).context("failed to build tree from records")
    } else {
        Forest::from_json_str(&text)
            .with_context(|| format!("{} is not a valid tree", args.tree.display()))
    }
}

fn load_steps(path: &Path) -> Result<Vec<Step>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not a list of moves", path.display()))
}

/// Apply `steps` in order, skipping the ones that fail. Returns the final tree
/// and the number of steps applied.
fn replay_all(mut forest: Tree, session: &mut DragSession<Key>, steps: &[Step]) -> (Tree, usize) {
    let mut applied = 0;
    for step in steps {
        match replay_step(&forest, session, step) {
            Ok(next) => {
                forest = next;
                applied += 1;
            }
            Err(reason) => eprintln!("skipped {step}: {reason}"),
        }
    }
    (forest, applied)
}

fn replay_step(
    forest: &Tree,
    session: &mut DragSession<Key>,
    step: &Step,
) -> Result<Tree, String> {
    if let Some(position) = step.position {
        debug!(%step, "applying move");
        return forest
            .move_node(&step.dragged, &step.target, position)
            .map_err(|err| err.to_string());
    }

    debug!(%step, "replaying drop from pointer geometry");
    session
        .begin(forest, step.dragged.clone())
        .map_err(|err| err.to_string())?;
    session.hover(forest, step.target.clone(), step.rect, step.pointer_y);
    match session.drop_on(forest, step.target.clone(), step.rect, step.pointer_y) {
        DropOutcome::Moved { forest, .. } => Ok(forest),
        DropOutcome::Rejected { error, .. } => Err(error.to_string()),
        DropOutcome::Vetoed(_) => Err("vetoed".to_string()),
        DropOutcome::Cancelled(reason) => Err(format!("cancelled ({reason:?})")),
    }
}
