//! User actions: rejections, panel handling, buttons, remove and leave

use assert_matches::assert_matches;
use carrot_jams::commands::music::utils::actions::{Action, ActionRequest};
use carrot_jams::commands::music::utils::button_controls::ControlButton;
use carrot_jams::commands::music::utils::music_manager::MusicError;
use carrot_jams::commands::music::utils::session::PlayerState;
use pretty_assertions::assert_eq;
use rstest::*;
use serenity::model::id::{ChannelId, MessageId};
use test_case::test_case;

use crate::common::Harness;
use crate::common::fixtures::{guild, other_session_key, session_key, text_channel, tracks};

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[test_case(Action::Next ; "skip")]
#[test_case(Action::Previous ; "previous")]
#[test_case(Action::Leave ; "leave")]
#[tokio::test]
async fn test_requires_voice_connection(action: Action) {
    let mut harness = Harness::new();

    assert_matches!(harness.run(action).await, Err(MusicError::NotConnected));
    assert!(harness.transport.played().is_empty());
    assert!(harness.display.sent().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_skip_on_last_track_is_rejected(mut harness: Harness) {
    harness.run(Action::Play(tracks(&["a"]))).await.unwrap();
    let generation = harness.session().generation();

    assert_matches!(harness.run(Action::Next).await, Err(MusicError::NoNextTrack));
    assert_eq!(harness.transport.played(), vec!["a"]);
    assert_eq!(harness.session().queue.current_index(), Some(0));
    assert_eq!(harness.session().generation(), generation);
}

#[rstest]
#[tokio::test]
async fn test_previous_on_first_track_is_rejected(mut harness: Harness) {
    harness.run(Action::Play(tracks(&["a", "b"]))).await.unwrap();

    assert_matches!(
        harness.run(Action::Previous).await,
        Err(MusicError::NoPreviousTrack)
    );
    assert_eq!(harness.session().queue.current_index(), Some(0));
    assert_eq!(harness.transport.now_playing(guild()).as_deref(), Some("a"));
}

#[test_case(Action::Pause ; "pause")]
#[test_case(Action::Resume ; "resume")]
#[test_case(Action::Loop(true) ; "loop")]
#[test_case(Action::Clear ; "clear")]
#[test_case(Action::Show ; "show")]
#[tokio::test]
async fn test_only_play_creates_a_session(action: Action) {
    let mut harness = Harness::new();

    assert_matches!(harness.run(action).await, Err(MusicError::NotConnected));
    assert!(harness.manager.sessions().is_empty());
    assert!(harness.display.sent().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_pause_and_resume_with_nothing_loaded(mut harness: Harness) {
    harness.run(Action::Play(tracks(&["a"]))).await.unwrap();
    harness.run(Action::Clear).await.unwrap();

    assert_matches!(harness.run(Action::Pause).await, Err(MusicError::NothingPlaying));
    assert_matches!(
        harness.run(Action::Resume).await,
        Err(MusicError::NothingToResume)
    );
    assert_eq!(harness.session().state(), PlayerState::Stopped);
}

#[rstest]
#[tokio::test]
async fn test_rejected_command_keeps_the_text_channel(mut harness: Harness) {
    harness.run(Action::Play(tracks(&["a"]))).await.unwrap();
    let panels = harness.display.sent().len();

    let rejected = harness
        .manager
        .apply(ActionRequest::command(
            session_key(),
            ChannelId::new(7),
            Action::Next,
        ))
        .await;

    assert_matches!(rejected, Err(MusicError::NoNextTrack));
    assert_eq!(harness.manager.sessions().len(), 1);
    assert_eq!(harness.session().text_channel, text_channel());
    assert_eq!(harness.display.sent().len(), panels);
}

#[rstest]
#[tokio::test]
async fn test_empty_play_is_rejected(mut harness: Harness) {
    assert_matches!(
        harness.run(Action::Play(Vec::new())).await,
        Err(MusicError::ResolutionError(_))
    );
    assert!(harness.manager.sessions().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_failed_join_creates_nothing(mut harness: Harness) {
    harness.transport.set_fail_connect(true);

    assert_matches!(
        harness.run(Action::Play(tracks(&["a"]))).await,
        Err(MusicError::JoinError(_))
    );
    assert!(harness.manager.sessions().is_empty());
    assert!(harness.display.sent().is_empty());
    assert!(harness.transport.played().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_resume_restarts_track_after_setup_failure(mut harness: Harness) {
    harness.transport.set_fail_play(true);
    assert_matches!(
        harness.run(Action::Play(tracks(&["a", "b"]))).await,
        Err(MusicError::PlaybackSetupError(_))
    );
    assert_eq!(harness.session().state(), PlayerState::Stopped);
    assert_eq!(harness.session().queue.len(), 2);
    // The panel still shows the queued tracks
    assert_eq!(harness.display.last_view().unwrap().total, 2);

    harness.transport.set_fail_play(false);
    harness.run(Action::Resume).await.unwrap();

    assert_eq!(harness.transport.played(), vec!["a"]);
    assert_eq!(harness.session().state(), PlayerState::Playing);
}

#[rstest]
#[tokio::test]
async fn test_commands_replace_the_panel(mut harness: Harness) {
    harness.run(Action::Play(tracks(&["a"]))).await.unwrap();
    harness.run(Action::Show).await.unwrap();

    let sent = harness.display.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(harness.display.deleted(), vec![sent[0]]);
    assert_eq!(harness.session().status_message, Some(sent[1]));
}

#[rstest]
#[tokio::test]
async fn test_buttons_edit_the_panel_in_place(mut harness: Harness) {
    harness.run(Action::Play(tracks(&["a", "b"]))).await.unwrap();
    let panel = harness.session().status_message;

    harness.press(ControlButton::Next).await.unwrap();

    assert_eq!(harness.transport.played(), vec!["a", "b"]);
    assert_eq!(harness.display.sent().len(), 1);
    assert!(harness.display.deleted().is_empty());
    assert!(harness.display.edit_count() >= 1);
    assert_eq!(harness.session().status_message, panel);
    assert_eq!(
        harness.display.last_view().unwrap().now_playing.unwrap().title(),
        "b"
    );
}

#[rstest]
#[tokio::test]
async fn test_pause_button_toggles(mut harness: Harness) {
    harness.run(Action::Play(tracks(&["a"]))).await.unwrap();

    harness.press(ControlButton::PauseResume).await.unwrap();
    assert_eq!(harness.session().state(), PlayerState::Paused);

    harness.press(ControlButton::PauseResume).await.unwrap();
    assert_eq!(harness.session().state(), PlayerState::Playing);
}

#[rstest]
#[tokio::test]
async fn test_unknown_panel_is_stale(mut harness: Harness) {
    let request = ActionRequest::button(MessageId::new(424242), text_channel(), Action::Next);

    assert_matches!(
        harness.manager.apply(request).await,
        Err(MusicError::StalePanel)
    );
    assert!(harness.manager.sessions().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_only_commands_move_the_text_channel(mut harness: Harness) {
    harness.run(Action::Play(tracks(&["a", "b"]))).await.unwrap();

    harness
        .press_from(ControlButton::Next, ChannelId::new(7))
        .await
        .unwrap();
    assert_eq!(harness.session().text_channel, text_channel());

    harness
        .manager
        .apply(ActionRequest::command(
            session_key(),
            ChannelId::new(7),
            Action::Show,
        ))
        .await
        .unwrap();
    assert_eq!(harness.session().text_channel, ChannelId::new(7));
}

#[rstest]
#[tokio::test]
async fn test_clear_button_empties_the_queue(mut harness: Harness) {
    harness.run(Action::Play(tracks(&["a", "b", "c"]))).await.unwrap();

    harness.press(ControlButton::Clear).await.unwrap();

    assert!(harness.session().queue.is_empty());
    assert!(!harness.session().queue.is_loop_enabled());
    assert_eq!(harness.transport.now_playing(guild()), None);
    assert_eq!(harness.display.last_view().unwrap().total, 0);
}

#[rstest]
#[tokio::test]
async fn test_leave_disconnects_and_keeps_queue(mut harness: Harness) {
    harness.run(Action::Play(tracks(&["a", "b"]))).await.unwrap();

    harness.press(ControlButton::Leave).await.unwrap();

    assert_eq!(harness.session().state(), PlayerState::Stopped);
    assert_eq!(harness.session().queue.len(), 2);
    assert_eq!(harness.transport.played(), vec!["a"]);
    assert_matches!(harness.run(Action::Next).await, Err(MusicError::NotConnected));
}

#[rstest]
#[tokio::test]
async fn test_remove_entries(mut harness: Harness) {
    harness.run(Action::Play(tracks(&["a", "b", "c"]))).await.unwrap();

    assert_matches!(
        harness.run(Action::Remove(0)).await,
        Err(MusicError::CannotRemoveCurrent)
    );
    assert_matches!(
        harness.run(Action::Remove(5)).await,
        Err(MusicError::OutOfRange { index: 5, len: 3 })
    );

    harness.run(Action::Remove(1)).await.unwrap();
    let titles: Vec<&str> = harness.session().queue.iter().map(|t| t.title()).collect();
    assert_eq!(titles, vec!["a", "c"]);

    harness.finish_track().await;
    assert_eq!(harness.transport.played(), vec!["a", "c"]);
}

#[rstest]
#[tokio::test]
async fn test_other_channel_cannot_drive_the_call(mut harness: Harness) {
    harness.run(Action::Play(tracks(&["a1", "a2", "a3"]))).await.unwrap();
    let other = other_session_key();

    assert_matches!(
        harness.run_as(other, Action::Play(tracks(&["b1", "b2"]))).await,
        Err(MusicError::ChannelBusy)
    );
    assert_eq!(harness.manager.sessions().len(), 1);

    for action in [Action::Next, Action::Previous, Action::Leave, Action::Pause] {
        assert_matches!(
            harness.run_as(other, action).await,
            Err(MusicError::NotConnected)
        );
    }

    assert_eq!(harness.transport.played(), vec!["a1"]);
    assert_eq!(harness.transport.now_playing(guild()).as_deref(), Some("a1"));
    assert_eq!(harness.transport.call_channel(guild()), Some(session_key().voice_channel_id));
    assert_eq!(harness.session().queue.current_index(), Some(0));
}

#[rstest]
#[tokio::test]
async fn test_second_session_commands_touch_only_their_own_queue(mut harness: Harness) {
    harness.run(Action::Play(tracks(&["a1", "a2"]))).await.unwrap();
    harness.finish_track().await;
    harness.finish_track().await;
    assert_eq!(harness.session().state(), PlayerState::Stopped);

    let other = other_session_key();
    harness
        .run_as(other, Action::Play(tracks(&["b1", "b2"])))
        .await
        .unwrap();
    assert_eq!(harness.transport.call_channel(guild()), Some(other.voice_channel_id));

    harness.run_as(other, Action::Next).await.unwrap();

    assert_eq!(harness.transport.played(), vec!["a1", "a2", "b1", "b2"]);
    assert_eq!(harness.session().queue.current_index(), Some(1));
    assert_eq!(harness.session().state(), PlayerState::Stopped);
    let second = harness.manager.sessions().get(&other).unwrap();
    assert_eq!(second.queue.current_index(), Some(1));

    // The first session lost the call and no longer controls it
    assert_matches!(harness.run(Action::Previous).await, Err(MusicError::NotConnected));
    assert_matches!(harness.run(Action::Resume).await, Err(MusicError::ChannelBusy));
    assert_eq!(harness.transport.now_playing(guild()).as_deref(), Some("b2"));
}
