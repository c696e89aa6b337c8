// vidtree-cli/src/main.rs
//
// Entry point for the vidtree binary: parses arguments, runs the selected
// command and maps the outcome to a process exit status.
//
// Exit status: 0 when the run completes, 2 for `--strict` runs with failed
// files, 1 for fatal errors (bad arguments to the core, unreadable input
// root, output root creation, missing tools).

use clap::Parser;
use std::process;

use vidtree_cli::logging::{FATAL_TARGET, use_color};
use vidtree_cli::terminal::print_fatal;
use vidtree_cli::{Cli, dispatch};

fn main() {
    let cli = Cli::parse();

    match dispatch(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            log::error!(target: FATAL_TARGET, "{e:#}");
            print_fatal(&e, use_color(supports_color::Stream::Stderr));
            process::exit(1);
        }
    }
}
