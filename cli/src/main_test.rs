use clap::CommandFactory;

use super::*;

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn login_takes_username_and_password_flags() {
    let cli = Cli::try_parse_from(["portal", "login", "--username", "testuser", "--password", "password"]).unwrap();
    let Command::Login { username, password } = cli.command else {
        panic!("expected login, got {:?}", cli.command);
    };
    assert_eq!(username.as_deref(), Some("testuser"));
    assert_eq!(password.as_deref(), Some("password"));
}

#[test]
fn global_flags_override_config() {
    let cli = Cli::try_parse_from(["portal", "status", "--store-dir", "/tmp/sessions", "--origin", "http://demo.test/"])
        .unwrap();
    let config = resolve_config(PortalConfig::default(), &cli);
    assert_eq!(config.store_dir, PathBuf::from("/tmp/sessions"));
    assert_eq!(config.origin, "http://demo.test");
}

#[test]
fn unknown_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["portal", "signup"]).is_err());
}
