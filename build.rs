// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Optional positional revision argument
fn revision_arg() -> Arg {
    Arg::new("revision")
        .value_name("REVISION")
        .help("Revision to act on (default: the remote head)")
}

fn build_cli() -> Command {
    Command::new("treeota")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Over-the-air updates for tree-based deployments")
        .arg(
            Arg::new("settings")
                .short('s')
                .long("settings")
                .value_name("PATH")
                .default_value("/etc/treeota/client.toml")
                .help("Client settings file"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print the resulting state as JSON"),
        )
        .subcommand(Command::new("status").about("Show booted, default and rollback revisions"))
        .subcommand(Command::new("check").about("Check the remote for a newer revision"))
        .subcommand(
            Command::new("fetch")
                .about("Fetch a revision")
                .arg(revision_arg()),
        )
        .subcommand(
            Command::new("apply")
                .about("Make a revision the next boot target")
                .arg(revision_arg()),
        )
        .subcommand(Command::new("rollback").about("Boot the most recent previous deployment next"))
        .subcommand(Command::new("refresh").about("Re-read local deployment state"))
        .subcommand(
            Command::new("config")
                .about("Manage the repository configuration")
                .subcommand(Command::new("show").about("Print the repository configuration"))
                .subcommand(
                    Command::new("set")
                        .about("Write a new repository configuration")
                        .arg(Arg::new("url").long("url").required(true).help("Repository URL")),
                )
                .subcommand(Command::new("remove").about("Delete the repository configuration")),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("treeota.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
