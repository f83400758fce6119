//! Argument parsing and commands that need no server.

use clap::Parser;
use matchhub_cli::{Args, CliError, Command, Context, run};
use matchhub_client::{
    ClientConfig, TokenStore,
    models::{AuthTokens, MatchMode, PaymentMethod},
};

fn parse(args: &[&str]) -> Args {
    Args::try_parse_from(std::iter::once("matchhub").chain(args.iter().copied())).unwrap()
}

fn context(dir: &tempfile::TempDir) -> Context {
    let store = TokenStore::new(dir.path().join("tokens.json"));
    Context::new(ClientConfig::default(), store).unwrap()
}

#[test]
fn subcommands_parse_with_defaults() {
    let args = parse(&["match", "u-2"]);
    assert_eq!(args.command, Command::Match { target_user_id: "u-2".into(), mode: MatchMode::Friend });

    let args = parse(&["pay", "room-1", "--method", "card"]);
    assert_eq!(args.command, Command::Pay { room_id: "room-1".into(), method: PaymentMethod::Card });

    let args = parse(&["history", "room-1"]);
    assert_eq!(args.command, Command::History { room_id: "room-1".into(), page: 1 });
    assert_eq!(args.log_level, "warn");
}

#[test]
fn unknown_modes_are_rejected() {
    let result = Args::try_parse_from(["matchhub", "match", "u-2", "--mode", "enemy"]);
    assert!(result.is_err());
}

#[tokio::test]
async fn authenticated_commands_need_a_login() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&dir);
    let mut out = Vec::<u8>::new();

    let result = run(Command::Rooms, &ctx, &mut out).await;
    assert!(matches!(result, Err(CliError::NotLoggedIn)));
    assert!(out.is_empty());
}

#[tokio::test]
async fn logout_forgets_saved_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&dir);
    let tokens = AuthTokens { access: "a".into(), refresh: "r".into() };
    ctx.store.save(&tokens).await.unwrap();
    assert_eq!(ctx.tokens().await.unwrap(), tokens);

    let mut out = Vec::<u8>::new();
    run(Command::Logout, &ctx, &mut out).await.unwrap();

    assert_eq!(String::from_utf8(out).unwrap(), "Logged out\n");
    assert!(matches!(ctx.tokens().await, Err(CliError::NotLoggedIn)));
}

#[tokio::test]
async fn missing_upload_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&dir);
    let path = dir.path().join("nope.png");

    let err = run(Command::Upload { path: path.clone() }, &ctx, &mut Vec::<u8>::new()).await.unwrap_err();
    assert!(matches!(err, CliError::File { .. }));
    assert!(err.to_string().starts_with(&path.display().to_string()));
}
