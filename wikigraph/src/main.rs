use clap;
use colored::Colorize;
use commands::command_argument_builder;
use wikigraph::handlers;

mod commands;

fn main() {
    tracing_subscriber::fmt::init();

    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    let outcome = match chosen_command.subcommand() {
        Some(("init", primary_command)) => handlers::handle_init(primary_command),
        Some(("import", primary_command)) => handlers::handle_import(primary_command, quiet),
        Some(("stats", primary_command)) => handlers::handle_stats(primary_command),
        Some(("frontier", primary_command)) => handlers::handle_frontier(primary_command),
        None => {
            let mut cmd = command_argument_builder();
            cmd.print_help().map_err(anyhow::Error::from)
        }
        _ => unreachable!("clap should ensure we don't get here"),
    };

    if let Err(e) = outcome {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
