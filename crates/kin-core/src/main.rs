//! `kin` command line
//!
//! Imports, exports, lays out and summarises family trees.

use anyhow::{anyhow, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use kin_core::{KinConfig, TreeStore};
use kin_gedcom::read_gedcom_file;
use kin_layout::{compute_layout, LayeredEngine};
use kin_model::{Person, PersonGraph};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let input = |help: &'static str| {
        Arg::new("input")
            .required(true)
            .value_parser(value_parser!(PathBuf))
            .help(help)
    };

    Command::new("kin")
        .version(kin_core::VERSION)
        .about("Family tree toolkit: GEDCOM interchange, layout and statistics")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("import")
                .about("Convert a GEDCOM file to a JSON person list")
                .arg(input("GEDCOM file to read")),
        )
        .subcommand(
            Command::new("export")
                .about("Convert a JSON person list to GEDCOM")
                .arg(input("JSON person list"))
                .arg(
                    Arg::new("original")
                        .long("original")
                        .value_parser(value_parser!(PathBuf))
                        .help("Merge into this GEDCOM file, keeping unknown records and tags"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Write to a file instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("layout")
                .about("Lay out a JSON person list and print the positioned tree")
                .arg(input("JSON person list")),
        )
        .subcommand(
            Command::new("stats")
                .about("Print statistics for a GEDCOM file or JSON person list")
                .arg(input("GEDCOM file or JSON person list"))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
}

fn init_tracing(config: &KinConfig, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn path_arg<'a>(args: &'a ArgMatches, name: &str) -> anyhow::Result<&'a PathBuf> {
    args.get_one::<PathBuf>(name)
        .ok_or_else(|| anyhow!("missing argument <{name}>"))
}

fn read_persons(path: &Path) -> anyhow::Result<Vec<Person>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not a person list", path.display()))
}

fn is_gedcom(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ged"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();

    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => KinConfig::load(path)?,
        None => KinConfig::default(),
    };
    init_tracing(&config, matches.get_flag("log-json"));

    match matches.subcommand() {
        Some(("import", args)) => {
            let mut store = TreeStore::new(config);
            store.import_gedcom_file(path_arg(args, "input")?).await?;
            println!("{}", serde_json::to_string_pretty(&store.persons().to_vec())?);
        }
        Some(("export", args)) => {
            let mut store = TreeStore::new(config);
            let persons = read_persons(path_arg(args, "input")?)?;
            if let Some(original) = args.get_one::<PathBuf>("original") {
                store.set_original_nodes(Some(read_gedcom_file(original).await?));
            }
            store.set_persons(persons);
            match args.get_one::<PathBuf>("output") {
                Some(output) => store.export_gedcom_file(output).await?,
                None => println!("{}", store.render_gedcom()),
            }
        }
        Some(("layout", args)) => {
            let graph = PersonGraph::from_persons(read_persons(path_arg(args, "input")?)?);
            let layout = compute_layout(&graph, &LayeredEngine, &config.layout)
                .await
                .context("layout failed")?;
            println!("{}", serde_json::to_string_pretty(&layout)?);
        }
        Some(("stats", args)) => {
            let input = path_arg(args, "input")?;
            let mut store = TreeStore::new(config);
            if is_gedcom(input) {
                store.import_gedcom_file(input).await?;
            } else {
                store.set_persons(read_persons(input)?);
            }
            store.refresh_layout().await?;

            let stats = store.stats();
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                if let Some(name) = store.tree_name() {
                    println!("Tree:         {name}");
                }
                println!("{stats}");
            }
        }
        _ => unreachable!("subcommand_required"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn parses_export_flags() {
        let matches = cli()
            .try_get_matches_from(["kin", "export", "tree.json", "--original", "a.ged", "-o", "b.ged"])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "export");
        assert_eq!(path_arg(args, "input").unwrap(), &PathBuf::from("tree.json"));
        assert_eq!(args.get_one::<PathBuf>("output"), Some(&PathBuf::from("b.ged")));
    }

    #[test]
    fn detects_gedcom_by_extension() {
        assert!(is_gedcom(Path::new("family.GED")));
        assert!(!is_gedcom(Path::new("family.json")));
        assert!(!is_gedcom(Path::new("family")));
    }
}
