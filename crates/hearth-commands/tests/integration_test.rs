//! Integration tests for hearth-commands crate.
//!
//! These tests verify command registration and the pure decision logic of the
//! event dispatch and confirmation dialogue.

use hearth_commands::confirmation::ConfirmationAnswer;
use hearth_commands::{commands, is_workout_candidate, EnabledCogs, PostFacts};
use hearth_common::test_utils::discord_fixtures;

fn names(cogs: EnabledCogs) -> Vec<String> {
    commands(cogs)
        .into_iter()
        .map(|command| command.name)
        .collect()
}

#[test]
fn test_all_commands_registered() {
    let mut registered = names(EnabledCogs::all());
    registered.sort();
    let mut expected = vec![
        "about",
        "addconnection",
        "check_flights",
        "config",
        "connectionchart",
        "leaderboard",
        "list_birthdays",
        "my_workouts",
        "opt_out",
        "remove_birthday",
        "removeconnection",
        "server_wrapped",
        "set_birthday",
        "set_goal",
        "when_is",
    ];
    if cfg!(feature = "voice") {
        expected.extend(["join", "leave", "play", "queue", "say", "skip", "stop"]);
        expected.sort();
    }
    assert_eq!(registered, expected);
}

#[test]
fn test_birthday_commands_follow_the_cog_switch() {
    let registered = names(EnabledCogs {
        birthdays: false,
        ..EnabledCogs::all()
    });
    assert!(registered.iter().any(|name| name == "set_goal"));
    assert!(!registered.iter().any(|name| name.contains("birthday") || name == "when_is"));
}

#[test]
fn test_disabled_cogs_register_only_the_core() {
    let mut registered = names(EnabledCogs::default());
    registered.sort();
    assert_eq!(
        registered,
        vec!["about", "config", "leaderboard", "my_workouts", "opt_out", "set_goal"]
    );
}

#[test]
fn test_config_command_carries_reload() {
    let config = commands(EnabledCogs::default())
        .into_iter()
        .find(|command| command.name == "config")
        .unwrap();
    let subcommands: Vec<&str> = config.subcommands.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(subcommands, vec!["view", "reload"]);
    assert!(config.required_permissions.administrator());
}

#[test]
fn test_every_slash_command_has_a_description() {
    for command in commands(EnabledCogs::all()) {
        assert!(command.slash_action.is_some(), "{} is not a slash command", command.name);
        assert!(
            command.description.as_deref().is_some_and(|d| !d.is_empty()),
            "{} has no description",
            command.name
        );
    }
}

#[test]
fn test_workout_post_requires_thread_and_attachment() {
    let thread = discord_fixtures::test_channel_id();
    let post = PostFacts {
        author_is_bot: false,
        channel: thread,
        attachments: 1,
    };

    assert!(is_workout_candidate(&post, thread));
    assert!(!is_workout_candidate(
        &PostFacts {
            attachments: 0,
            ..post
        },
        thread
    ));
}

#[test]
fn test_only_yes_logs() {
    assert_eq!(ConfirmationAnswer::parse(" YES "), Some(ConfirmationAnswer::Yes));
    assert_eq!(ConfirmationAnswer::parse("no"), Some(ConfirmationAnswer::No));
    assert_eq!(ConfirmationAnswer::parse("maybe"), None);
}
