//! Tests for table and share subcommands.

use super::parse;
use crate::cli::{CliCommand, ShareCommand, TableCommand};

#[test]
fn cli_parse_table_insert() {
    let json = r#"{"PartitionKey":"eu","RowKey":"1","Name":"Ada"}"#;
    match parse(&["strata", "table", "insert", "Customers", json, "--upsert"]) {
        CliCommand::Table {
            command:
                TableCommand::Insert {
                    table,
                    entity,
                    upsert,
                },
        } => {
            assert_eq!(table, "Customers");
            assert_eq!(entity, json);
            assert!(upsert);
        }
        _ => panic!("expected Table Insert"),
    }
}

#[test]
fn cli_parse_table_get_and_query() {
    match parse(&["strata", "table", "get", "Customers", "eu", "1"]) {
        CliCommand::Table {
            command:
                TableCommand::Get {
                    table,
                    partition_key,
                    row_key,
                },
        } => {
            assert_eq!(table, "Customers");
            assert_eq!(partition_key, "eu");
            assert_eq!(row_key, "1");
        }
        _ => panic!("expected Table Get"),
    }
    match parse(&["strata", "table", "query", "Customers", "eu"]) {
        CliCommand::Table {
            command: TableCommand::Query { partition_key, .. },
        } => assert_eq!(partition_key, "eu"),
        _ => panic!("expected Table Query"),
    }
}

#[test]
fn cli_parse_share_mkdir_parents() {
    match parse(&["strata", "share", "mkdir", "home", "a/b/c", "-p"]) {
        CliCommand::Share {
            command:
                ShareCommand::Mkdir {
                    share,
                    path,
                    parents,
                },
        } => {
            assert_eq!(share, "home");
            assert_eq!(path, "a/b/c");
            assert!(parents);
        }
        _ => panic!("expected Share Mkdir"),
    }
}

#[test]
fn cli_parse_share_ls_defaults_to_root() {
    match parse(&["strata", "share", "ls", "home"]) {
        CliCommand::Share {
            command: ShareCommand::Ls { share, path },
        } => {
            assert_eq!(share, "home");
            assert_eq!(path, "");
        }
        _ => panic!("expected Share Ls"),
    }
}

#[test]
fn cli_parse_share_put_get() {
    match parse(&["strata", "share", "put", "home", "docs/a.txt", "a.txt"]) {
        CliCommand::Share {
            command: ShareCommand::Put { share, path, file },
        } => {
            assert_eq!(share, "home");
            assert_eq!(path, "docs/a.txt");
            assert_eq!(file, std::path::PathBuf::from("a.txt"));
        }
        _ => panic!("expected Share Put"),
    }
    match parse(&["strata", "share", "get", "home", "docs/a.txt"]) {
        CliCommand::Share {
            command: ShareCommand::Get { output, .. },
        } => assert!(output.is_none()),
        _ => panic!("expected Share Get"),
    }
}

#[test]
fn cli_requires_subcommand() {
    use crate::cli::Cli;
    use clap::Parser;
    assert!(Cli::try_parse_from(["strata", "blob"]).is_err());
}
