//! Plain-text rendering of view-model changes for the terminal.

use ftm_types::{Stage, ViewModel};

/// Lines describing what changed between two consecutive views.
pub fn changes(previous: &ViewModel, current: &ViewModel) -> Vec<String> {
    let mut lines = Vec::new();

    if current.stage != previous.stage {
        match current.stage {
            Stage::Selector => lines.push("Back to the publication list.".to_owned()),
            Stage::Gathering => {
                if let Some(publication) = &current.publication {
                    lines.push(format!(
                        "Investigating {} ({}) [{} | Factuality: {} | {}]",
                        publication.name,
                        publication.owner,
                        publication.bias,
                        publication.factuality,
                        publication.category
                    ));
                }
            }
            Stage::Conversation | Stage::Failed => {}
        }
    }

    if current.gathering_message != previous.gathering_message {
        if let Some(message) = &current.gathering_message {
            lines.push(format!("  {message}"));
        }
    }

    if current.investigating != previous.investigating {
        if let Some(loader) = &current.investigating {
            lines.push(format!(
                "  {} {} {}",
                loader.display_name, loader.role_text, loader.message
            ));
        }
    }

    for turn in &current.turns {
        if previous.turn(turn.index).is_none() {
            let clip = if turn.has_audio { " [clip]" } else { "" };
            lines.push(format!(
                "[{}] {} ({}){clip}: {}",
                turn.index, turn.display_name, turn.role_label, turn.text
            ));
        }
    }

    if current.failure != previous.failure {
        if let Some(failure) = &current.failure {
            lines.push(failure.clone());
        }
    }

    let highlighted = current.highlighted_turn();
    if highlighted != previous.highlighted_turn() {
        if let Some(index) = highlighted {
            lines.push(format!("  > playing turn {index}"));
        }
    }

    if current.play_all_visible && !previous.play_all_visible {
        lines.push("  (type 'all' to play every clip)".to_owned());
    }

    lines
}
