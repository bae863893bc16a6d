//! Argument-parsing tests for the CLI surface.

use clap::Parser;

use mcw::Cli;

#[test]
fn server_start_accepts_mode_host_port_namespace() {
    let cli = Cli::try_parse_from([
        "mcw",
        "server",
        "start",
        "--mode",
        "stdio",
        "--host",
        "0.0.0.0",
        "--port",
        "8080",
        "--namespace",
        "team-a",
    ]);
    assert!(cli.is_ok(), "{cli:?}");
}

#[test]
fn invalid_mode_is_rejected() {
    let cli = Cli::try_parse_from(["mcw", "server", "start", "--mode", "carrier-pigeon"]);
    assert!(cli.is_err());
}

#[test]
fn tools_subcommands_parse() {
    for args in [
        vec!["mcw", "tools", "health-check"],
        vec!["mcw", "tools", "validate-config"],
        vec!["mcw", "tools", "backup", "create", "--namespace", "demo"],
        vec!["mcw", "tools", "backup", "restore", "demo-1.tar.gz"],
        vec!["mcw", "tools", "backup", "list"],
    ] {
        assert!(Cli::try_parse_from(args.iter().copied()).is_ok(), "{args:?}");
    }
}

#[test]
fn global_config_flag_parses_anywhere() {
    let cli = Cli::try_parse_from([
        "mcw",
        "tools",
        "validate-config",
        "--config",
        "/tmp/custom.toml",
    ]);
    assert!(cli.is_ok());
}
