//! Command-line trainer.
//!
//! Reads a training and a validation set, fits the ensemble and writes the
//! per-tree leaf indices of both sets, one instance per line.

use anyhow::{Context, Result};
use cartboost::{read_data, write_indices, Config, Verbosity, GBDT};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command, ValueHint};
use std::path::PathBuf;

fn command() -> Command {
    Command::new("cartboost")
        .version(cartboost::VERSION)
        .about("Train gradient boosted trees and export their leaf indices")
        .arg(
            Arg::new("depth")
                .short('d')
                .long("depth")
                .help("Maximum depth of a tree")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("trees")
                .short('t')
                .long("trees")
                .help("Number of trees")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("threads")
                .short('s')
                .long("threads")
                .help("Maximum number of threads")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("TOML/JSON configuration file")
                .value_hint(ValueHint::FilePath)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbosity")
                .help("Log level: error|warn|info|debug|trace")
                .value_parser(value_parser!(Verbosity)),
        )
        .arg(
            Arg::new("save-model")
                .long("save-model")
                .help("Also write the fitted model as JSON")
                .value_hint(ValueHint::FilePath)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(positional("dense_validation_path", 1))
        .arg(positional("sparse_validation_path", 2))
        .arg(positional("dense_train_path", 3))
        .arg(positional("sparse_train_path", 4))
        .arg(positional("validation_output_path", 5))
        .arg(positional("train_output_path", 6))
}

fn positional(name: &'static str, index: usize) -> Arg {
    Arg::new(name)
        .index(index)
        .required(true)
        .action(ArgAction::Set)
        .value_hint(ValueHint::FilePath)
        .value_parser(value_parser!(PathBuf))
}

/// Defaults, then the config file, then `CARTBOOST_*`, then flags.
fn resolve_config(matches: &ArgMatches) -> Result<Config> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    config
        .apply_environment_overrides()
        .context("invalid CARTBOOST_* environment variable")?;

    if let Some(&depth) = matches.get_one::<usize>("depth") {
        config.max_depth = depth;
    }
    if let Some(&trees) = matches.get_one::<usize>("trees") {
        config.num_trees = trees;
    }
    if let Some(&threads) = matches.get_one::<usize>("threads") {
        config.num_threads = threads;
    }
    if let Some(&verbosity) = matches.get_one::<Verbosity>("verbosity") {
        config.verbosity = verbosity;
    }

    config.validate()?;
    Ok(config)
}

fn path<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a PathBuf> {
    matches
        .get_one::<PathBuf>(name)
        .with_context(|| format!("missing argument {}", name))
}

fn main() -> Result<()> {
    let matches = command().get_matches();
    let config = resolve_config(&matches)?;

    cartboost::core::initialize_logging(config.verbosity.as_filter());

    log::info!("reading data...");
    let train = read_data(
        path(&matches, "dense_train_path")?,
        path(&matches, "sparse_train_path")?,
    )
    .context("failed to read training data")?;
    let valid = read_data(
        path(&matches, "dense_validation_path")?,
        path(&matches, "sparse_validation_path")?,
    )
    .context("failed to read validation data")?;

    let mut model = GBDT::new(config)?;
    model.fit(&train, Some(&valid))?;

    write_indices(path(&matches, "train_output_path")?, &train, &model)?;
    write_indices(path(&matches, "validation_output_path")?, &valid, &model)?;

    if let Some(model_path) = matches.get_one::<PathBuf>("save-model") {
        model.save_json(model_path)?;
    }

    Ok(())
}
