use clap::{Arg, ArgAction, Command, ValueHint};
use std::path::PathBuf;

/// Command-line definition shared by the binary and its tests.
pub fn build_cli() -> Command {
    Command::new("bioactivity")
        .version(clap::crate_version!())
        .about("\u{1F9EA} Bioactivity screening: train, evaluate and score binary activity classifiers")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("run")
                .about("Train every model family, evaluate on a held-out split and score new compounds")
                .arg(
                    Arg::new("config")
                        .help("Path to a JSON run configuration. Defaults are used when omitted.")
                        .required(false)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("dataset")
                        .short('d')
                        .long("dataset")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Labeled descriptor table (*.csv or *.tsv). \
                             Overrides the dataset specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("predict")
                        .short('p')
                        .long("predict")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help(
                            "Fingerprint table of compounds to score (*.csv or *.tsv). \
                             Overrides the prediction set specified in the configuration file.",
                        )
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_dir")
                        .short('o')
                        .long("output_dir")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .help("Directory that receives evaluation.csv, predictions.csv and report.html")
                        .value_hint(ValueHint::DirPath),
                )
                .arg(
                    Arg::new("strategy")
                        .long("strategy")
                        .help("Hyperparameter selection strategy.")
                        .value_parser(["search", "fixed"])
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("metric")
                        .long("metric")
                        .help("Cross-validation score maximized by the search.")
                        .value_parser(["accuracy", "roc_auc", "mcc", "weighted_f1"])
                        .value_hint(ValueHint::Other),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Seed for splitting, fold shuffling and the estimators.")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("threads")
                        .short('t')
                        .long("threads")
                        .help("Number of worker threads (0 = all cores).")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("no_report")
                        .long("no-report")
                        .help("Disable HTML report generation.")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("config").about("Print the default JSON run configuration"))
        .help_template(
            "{usage-heading} {usage}\n\n\
             {about-with-newline}\n\
             Version {version}\n\n\
             {all-args}{after-help}",
        )
}
