mod draft;
pub use draft::cmd_draft;

use std::io::{BufRead, Write};
use std::path::Path;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::data_io::{self, DataDir, DataError};
use crate::io::repository::{EntryRepository, FileRepository};
use crate::model::config::EngineConfig;
use crate::model::grow::{Grow, find_grow};
use crate::model::stage::{CanonicalStage, StageVocabulary};
use crate::ops::aggregate::aggregate_with;
use crate::ops::save::{ConfirmationPrompt, Confirmer, build_save_decision};
use crate::ops::sync::SyncController;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let root = Path::new(&cli.data_dir);

    match cli.command {
        Commands::Init => cmd_init(root),
        Commands::Stage(args) => cmd_stage(root, args, json),
        Commands::Grows => cmd_grows(root, json),
        Commands::Aggregate(args) => cmd_aggregate(root, args, json),
        Commands::Draft(args) => cmd_draft(root, args, json),
        Commands::Save(args) => cmd_save(root, args, json),
        Commands::Config(args) => cmd_config(root, args, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Everything a command needs from the data directory
pub(crate) struct Session {
    pub dir: DataDir,
    pub grows: Vec<Grow>,
    pub vocab: StageVocabulary,
    pub controller: SyncController,
}

pub(crate) fn load_session(root: &Path) -> Result<Session, DataError> {
    let dir = DataDir::open(root)?;
    let (config, vocab) = config_io::load_config(&dir)?;
    let grows = data_io::load_grows(&dir)?;
    let EngineConfig { sync, .. } = config;
    Ok(Session {
        controller: SyncController::new(vocab.clone(), sync),
        dir,
        grows,
        vocab,
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse a stage typed by the user: a label or any known raw spelling.
pub(crate) fn parse_stage_arg(vocab: &StageVocabulary, raw: &str) -> Result<CanonicalStage, String> {
    CanonicalStage::from_label(raw)
        .or_else(|| vocab.normalize(Some(raw)))
        .ok_or_else(|| format!("unrecognized stage: {}", raw))
}

/// Reads y/n from stdin
struct StdinConfirmer;

impl Confirmer for StdinConfirmer {
    fn confirm(&mut self, prompt: &ConfirmationPrompt) -> bool {
        eprint!("{} [y/N] ", prompt);
        let _ = std::io::stderr().flush();
        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

/// `--yes`: approves every prompt
struct AssumeYes;

impl Confirmer for AssumeYes {
    fn confirm(&mut self, prompt: &ConfirmationPrompt) -> bool {
        tracing::info!(%prompt, "confirmed by --yes");
        true
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_init(root: &Path) -> CmdResult {
    let dir = DataDir::init(root)?;
    println!("Initialized stagesync data in {}/", dir.root.display());
    Ok(())
}

fn cmd_stage(root: &Path, args: StageArgs, json: bool) -> CmdResult {
    // Works outside a data directory with the built-in vocabulary
    let vocab = match DataDir::open(root) {
        Ok(dir) => config_io::load_config(&dir)?.1,
        Err(_) => StageVocabulary::default(),
    };
    let stage = vocab.normalize(Some(&args.raw));
    let legacy_key = stage.map(|s| vocab.denormalize(s));

    if json {
        return print_json(&StageJson {
            raw: args.raw,
            stage,
            legacy_key,
        });
    }
    match (stage, legacy_key) {
        (Some(stage), Some(key)) => println!("{} (stored as \"{}\")", stage, key),
        _ => println!("no stage"),
    }
    Ok(())
}

fn cmd_grows(root: &Path, json: bool) -> CmdResult {
    let session = load_session(root)?;
    let rows: Vec<_> = session
        .grows
        .iter()
        .map(|g| (g, aggregate_with(&session.vocab, Some(g), &[])))
        .collect();

    if json {
        let out: Vec<GrowJson> = rows.iter().map(|(g, a)| grow_to_json(g, *a)).collect();
        return print_json(&out);
    }
    if rows.is_empty() {
        println!("no grows");
    }
    for (grow, aggregate) in rows {
        println!("{}", format_grow_line(grow, aggregate));
    }
    Ok(())
}

fn cmd_aggregate(root: &Path, args: AggregateArgs, json: bool) -> CmdResult {
    let session = load_session(root)?;
    let grow = find_grow(&session.grows, &args.grow)
        .ok_or_else(|| format!("grow not found: {}", args.grow))?;
    let aggregate = aggregate_with(&session.vocab, Some(grow), &args.plants);

    if json {
        return print_json(&grow_to_json(grow, aggregate));
    }
    println!("{}", format_aggregate(aggregate));
    Ok(())
}

fn cmd_save(root: &Path, args: SaveArgs, json: bool) -> CmdResult {
    let session = load_session(root)?;
    let mut entry = data_io::load_draft(&session.dir)?;
    let before = entry.clone();
    session.controller.reopen(&mut entry, &session.grows);
    if entry != before {
        data_io::save_draft(&session.dir, &entry)?;
    }

    let grow = entry
        .grow
        .as_deref()
        .and_then(|id| find_grow(&session.grows, id));
    let decision = build_save_decision(&session.vocab, &entry, grow)?;

    let payload = if args.yes {
        decision.confirm_with(&mut AssumeYes)
    } else {
        decision.confirm_with(&mut StdinConfirmer)
    };

    let Some(payload) = payload else {
        if json {
            return print_json(&SaveJson {
                saved: false,
                entry: None,
                payload: None,
            });
        }
        println!("Save cancelled; draft unchanged");
        return Ok(());
    };

    let mut repo = FileRepository::new(session.dir.clone());
    let entry_id = match &args.update {
        Some(id) => {
            repo.update_entry(id, &payload)?;
            id.clone()
        }
        None => repo.create_entry(&payload)?,
    };
    data_io::clear_draft(&session.dir)?;

    if json {
        return print_json(&SaveJson {
            saved: true,
            entry: Some(entry_id),
            payload: Some(&payload),
        });
    }
    println!("Saved {}", entry_id);
    Ok(())
}

fn cmd_config(root: &Path, args: ConfigCmd, json: bool) -> CmdResult {
    let dir = DataDir::open(root)?;
    match args.action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => {
            let (_, vocab) = config_io::load_config(&dir)?;
            if json {
                return print_json(&vocabulary_to_json(&vocab));
            }
            for stage in CanonicalStage::ALL {
                println!("{:<10} {}", stage, vocab.denormalize(stage));
            }
            for (alias, stage) in vocab.aliases() {
                println!("alias {} -> {}", alias, stage);
            }
            Ok(())
        }
        ConfigAction::SetLegacyKey { stage, key } => {
            let stage = CanonicalStage::from_label(&stage)
                .ok_or_else(|| format!("unknown stage label: {}", stage))?;
            let (_, mut doc) = config_io::read_config(&dir)?;
            config_io::set_legacy_key(&mut doc, stage, &key)?;
            config_io::write_config(&dir, &doc)?;
            println!("{} is now stored as \"{}\"", stage, key);
            Ok(())
        }
    }
}
