use crate::CLAP_STYLING;
use clap::{arg, command};

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("wikigraph")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("wikigraph")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress progress bars and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Creates a new graph store on your filesystem")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location of the graph store file")
                        .default_value("~/.local/share/wikigraph/graph.db"),
                )
                .arg(
                    arg!(-f - -"force")
                        .help("Removes any existing store at the location before creating")
                        .required(false),
                ),
        )
        .subcommand(
            command!("import")
                .about(
                    "Imports crawl records into the graph store. Each line of the records \
                file is one JSON object with 'name', 'links' and 'redirects' fields.",
                )
                .arg(
                    arg!(-s --"store" <PATH>)
                        .required(true)
                        .help("Path to the graph store file"),
                )
                .arg(
                    arg!(-r --"records" <PATH>)
                        .required(true)
                        .help("Path to a newline-delimited JSON file of crawl records")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(
            command!("stats")
                .about("Prints article, redirect and edge counts for a graph store")
                .arg(
                    arg!(-s --"store" <PATH>)
                        .required(true)
                        .help("Path to the graph store file"),
                ),
        )
        .subcommand(
            command!("frontier")
                .about("Lists known-but-unexpanded articles, the crawler's next work items")
                .arg(
                    arg!(-s --"store" <PATH>)
                        .required(true)
                        .help("Path to the graph store file"),
                )
                .arg(
                    arg!(-l --"limit" <N>)
                        .required(false)
                        .help("Maximum number of names to print")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("50"),
                ),
        )
}
