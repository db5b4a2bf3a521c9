use std::path::Path;

use super::{CmdResult, load_session, parse_stage_arg, print_json};
use crate::cli::commands::{DraftAction, DraftCmd, OnOff};
use crate::cli::output::{DraftJson, format_draft};
use crate::io::data_io;
use crate::model::grow::find_grow;
use crate::ops::sync::ToggleOutcome;

/// Apply one draft edit, re-running the sync controller, then report the
/// resulting state. A refused toggle is saved as-is and reported as an error.
pub fn cmd_draft(root: &Path, args: DraftCmd, json: bool) -> CmdResult {
    let session = load_session(root)?;
    let ctl = &session.controller;
    let grows = &session.grows;

    let action = args.action.unwrap_or(DraftAction::Show);
    if let DraftAction::Clear = action {
        data_io::clear_draft(&session.dir)?;
        println!("Draft cleared");
        return Ok(());
    }

    let mut entry = data_io::load_draft(&session.dir)?;
    // The snapshot may have changed since the draft was last written
    ctl.reopen(&mut entry, grows);

    let mut rejection = None;
    match action {
        DraftAction::Show | DraftAction::Clear => {}
        DraftAction::Grow { id } => {
            let grow = if id == "none" {
                None
            } else {
                if find_grow(grows, &id).is_none() {
                    return Err(format!("grow not found: {}", id).into());
                }
                Some(id.as_str())
            };
            ctl.select_grow(&mut entry, grows, grow);
        }
        DraftAction::Plants { ids } => {
            ctl.select_plants(&mut entry, grows, ids);
        }
        DraftAction::TogglePlant { id } => {
            ctl.toggle_plant(&mut entry, grows, &id);
        }
        DraftAction::Stage { raw } => {
            let stage = if raw == "none" {
                None
            } else {
                Some(parse_stage_arg(ctl.vocabulary(), &raw)?)
            };
            ctl.set_stage(&mut entry, stage);
        }
        DraftAction::Apply { value } => {
            let enabled = matches!(value, OnOff::On);
            if let ToggleOutcome::Rejected { reason } =
                ctl.set_apply_stage_to_plants(&mut entry, grows, enabled)
            {
                rejection = Some(reason);
            }
        }
        DraftAction::Text(text) => {
            if let Some(title) = text.title {
                entry.title = title;
            }
            if let Some(notes) = text.notes {
                entry.notes = notes;
            }
            if !text.photos.is_empty() {
                entry.photos = text.photos;
            }
        }
    }

    data_io::save_draft(&session.dir, &entry)?;
    let status = ctl.evaluate(&entry, grows);

    if json {
        print_json(&DraftJson {
            draft: &entry,
            state: status.state,
            aggregate: status.aggregate,
            toggle_enabled: status.toggle_enabled(),
            message: rejection.clone(),
        })?;
    } else {
        print!("{}", format_draft(&entry, &status));
    }

    match rejection {
        Some(reason) => Err(reason.into()),
        None => Ok(()),
    }
}
