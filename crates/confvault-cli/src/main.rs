//! `confvault`: offline inspection of configuration backups

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use confvault_model::KindRegistry;
use confvault_store::{Store, StoreConfig, DEFAULT_ROOT_DIR};
use tracing_subscriber::EnvFilter;

use crate::commands::{KindArgs, RewriteArgs};

fn kind_args() -> [Arg; 3] {
    [
        Arg::new("kind")
            .long("kind")
            .help("Registered item kind (e.g. device_template)"),
        Arg::new("id-key")
            .long("id-key")
            .help("Key holding the item identifier"),
        Arg::new("name-key")
            .long("name-key")
            .help("Key holding the item name"),
    ]
}

fn file_arg(name: &'static str) -> Arg {
    Arg::new(name)
        .required(true)
        .value_parser(value_parser!(PathBuf))
}

fn cli() -> Command {
    Command::new("confvault")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect, compare and rewrite controller configuration backups")
        .subcommand_required(true)
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .env("CONFVAULT_DATA_DIR")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Backup root directory [default: data]"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(
            Command::new("kinds").about("List registered item kinds"),
        )
        .subcommand(
            Command::new("refs")
                .about("Print identifiers an item refers to")
                .arg(file_arg("file"))
                .args(kind_args()),
        )
        .subcommand(
            Command::new("diff")
                .about("Compare two payloads ignoring key order and volatile keys")
                .arg(file_arg("left"))
                .arg(file_arg("right"))
                .args(kind_args())
                .arg(
                    Arg::new("ignore")
                        .long("ignore")
                        .action(ArgAction::Append)
                        .help("Additional top-level key to ignore"),
                ),
        )
        .subcommand(
            Command::new("rewrite")
                .about("Rewrite identifiers in a payload")
                .arg(file_arg("file"))
                .arg(
                    Arg::new("map")
                        .long("map")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON object of old to new identifiers"),
                )
                .args(kind_args())
                .arg(
                    Arg::new("create")
                        .long("create")
                        .action(ArgAction::SetTrue)
                        .help("Build a creation payload (identity and filtered keys dropped)"),
                )
                .arg(
                    Arg::new("drop")
                        .long("drop")
                        .action(ArgAction::Append)
                        .requires("create")
                        .help("Additional key dropped from the creation payload"),
                )
                .arg(
                    Arg::new("rename")
                        .long("rename")
                        .requires("create")
                        .help("New item name for the creation payload"),
                ),
        )
        .subcommand(
            Command::new("names")
                .about("Report whether an index needs extended file names")
                .arg(file_arg("file"))
                .args(kind_args()),
        )
        .subcommand(
            Command::new("show")
                .about("Print a backed-up item")
                .arg(Arg::new("kind").required(true).help("Registered item kind"))
                .arg(Arg::new("node").required(true).help("Node directory"))
                .arg(Arg::new("name").help("Item name (not needed for index kinds)"))
                .arg(
                    Arg::new("id")
                        .long("id")
                        .help("Item identifier, for items saved with extended names"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn collect_kind_args(args: &ArgMatches) -> KindArgs {
    KindArgs {
        kind: args.get_one::<String>("kind").cloned(),
        id_key: args.get_one::<String>("id-key").cloned(),
        name_key: args.get_one::<String>("name-key").cloned(),
        drop: args
            .try_get_many::<String>("drop")
            .ok()
            .flatten()
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
    }
}

fn path_arg<'a>(args: &'a ArgMatches, name: &str) -> &'a PathBuf {
    args.get_one::<PathBuf>(name)
        .unwrap_or_else(|| unreachable!("clap enforces required argument '{name}'"))
}

fn run(matches: &ArgMatches) -> Result<ExitCode> {
    let registry = KindRegistry::builtin();
    let root_dir = matches
        .get_one::<PathBuf>("data-dir")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT_DIR));

    match matches.subcommand() {
        Some(("kinds", _)) => {
            for name in registry.names() {
                println!("{name}");
            }
        }
        Some(("refs", args)) => {
            let kind = commands::resolve_kind(&registry, &collect_kind_args(args))?;
            let payload = commands::read_json(path_arg(args, "file"))?;
            for id in commands::refs(kind, payload) {
                println!("{id}");
            }
        }
        Some(("diff", args)) => {
            let kind = commands::resolve_kind(&registry, &collect_kind_args(args))?;
            let left = commands::read_json(path_arg(args, "left"))?;
            let right = commands::read_json(path_arg(args, "right"))?;
            let ignored: Vec<String> = args
                .get_many::<String>("ignore")
                .map(|values| values.cloned().collect())
                .unwrap_or_default();
            if commands::diff(kind, &left, &right, &ignored) {
                println!("equal");
            } else {
                println!("different");
                return Ok(ExitCode::FAILURE);
            }
        }
        Some(("rewrite", args)) => {
            let kind = commands::resolve_kind(&registry, &collect_kind_args(args))?;
            let payload = commands::read_json(path_arg(args, "file"))?;
            let mapping = commands::read_mapping(path_arg(args, "map"))?;
            let options = RewriteArgs {
                create: args.get_flag("create"),
                rename: args.get_one::<String>("rename").map(String::as_str),
            };
            let rewritten = commands::rewrite(kind, payload, &mapping, &options)?;
            println!("{}", serde_json::to_string_pretty(&rewritten)?);
        }
        Some(("names", args)) => {
            let kind = commands::resolve_kind(&registry, &collect_kind_args(args))?;
            let report = commands::names(kind, commands::read_json(path_arg(args, "file"))?)?;
            println!("extended naming: {}", if report.extended { "yes" } else { "no" });
            for file in report.files {
                println!("  {file}");
            }
        }
        Some(("show", args)) => {
            let kind_name = args.get_one::<String>("kind").cloned();
            let kind = commands::resolve_kind(
                &registry,
                &KindArgs {
                    kind: kind_name,
                    ..KindArgs::default()
                },
            )?;
            let node = args
                .get_one::<String>("node")
                .unwrap_or_else(|| unreachable!("clap enforces required argument 'node'"));
            let store = Store::new(StoreConfig::new().with_root_dir(root_dir));
            let payload = commands::show(
                &store,
                kind,
                node,
                args.get_one::<String>("name").map(String::as_str),
                args.get_one::<String>("id").map(String::as_str),
            )?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
        _ => {}
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match run(&matches) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}
