use serenity::all::{ButtonStyle, CreateActionRow, CreateButton, ReactionType};

use super::actions::Action;
use super::embedded_messages::PlayerView;
use super::session::PlayerState;

/// The player panel's buttons. Each one maps onto a single action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlButton {
    Previous,
    PauseResume,
    Next,
    Clear,
    Leave,
}

impl ControlButton {
    pub const ALL: [ControlButton; 5] = [
        ControlButton::Previous,
        ControlButton::PauseResume,
        ControlButton::Next,
        ControlButton::Clear,
        ControlButton::Leave,
    ];

    /// Stable id carried by the Discord component.
    pub fn custom_id(self) -> &'static str {
        match self {
            ControlButton::Previous => "prev_track",
            ControlButton::PauseResume => "pp_track",
            ControlButton::Next => "next_track",
            ControlButton::Clear => "clear_queue",
            ControlButton::Leave => "leave",
        }
    }

    pub fn from_custom_id(custom_id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|button| button.custom_id() == custom_id)
    }

    pub fn action(self) -> Action {
        match self {
            ControlButton::Previous => Action::Previous,
            ControlButton::PauseResume => Action::TogglePause,
            ControlButton::Next => Action::Next,
            ControlButton::Clear => Action::Clear,
            ControlButton::Leave => Action::Leave,
        }
    }
}

fn button(control: ControlButton, emoji: &str, label: &str, style: ButtonStyle) -> CreateButton {
    CreateButton::new(control.custom_id())
        .emoji(ReactionType::Unicode(emoji.to_string()))
        .style(style)
        .label(label)
}

/// Creates the music control buttons based on player status
pub fn create_music_control_buttons(view: &PlayerView) -> Vec<CreateActionRow> {
    let is_playing = view.state == PlayerState::Playing;

    let previous = button(
        ControlButton::Previous,
        "⏮️",
        "Previous",
        ButtonStyle::Secondary,
    )
    .disabled(!view.has_previous);

    let play_pause = button(
        ControlButton::PauseResume,
        if is_playing { "⏸️" } else { "▶️" },
        if is_playing { "Pause" } else { "Play" },
        ButtonStyle::Primary,
    )
    .disabled(view.now_playing.is_none());

    let next = button(ControlButton::Next, "⏭️", "Next", ButtonStyle::Secondary)
        .disabled(!view.has_next);

    let clear = button(ControlButton::Clear, "🗑️", "Clear", ButtonStyle::Danger)
        .disabled(view.total == 0);

    let leave = button(ControlButton::Leave, "👋", "Leave", ButtonStyle::Danger);

    vec![CreateActionRow::Buttons(vec![
        previous, play_pause, next, clear, leave,
    ])]
}
