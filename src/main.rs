mod cli;

use clap::{CommandFactory, Parser};
use colored::*;
use dotenv::dotenv;
use indicatif::HumanBytes;
use std::path::Path;
use std::process;
use tracing::{error, info};

use cli::{Cli, CleanArgs, Commands, InitArgs, OutputFormat};
use orphansweep::catalog::{Catalog, Role};
use orphansweep::{config, db, extract, logging, sweep};
use orphansweep::{AppConfig, Error};

fn main() {
    dotenv().ok();

    let args = Cli::parse();
    let quiet = matches!(
        &args.command,
        Some(Commands::Clean(clean)) if clean.output == OutputFormat::None
    );
    let _guard = logging::init_logger(quiet);

    let config = match config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let outcome = match args.command {
        Some(Commands::Clean(clean)) => run_clean(&config, &clean),
        Some(Commands::Proof) => run_proof(&config),
        Some(Commands::Init(init)) => run_init(&config, &init),
        Some(Commands::Config) => {
            println!("{:#?}", config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    // The single place that decides fatal-vs-logged: database and setup
    // errors land here and terminate; per-file failures never do.
    if let Err(err) = outcome {
        error!("Error: {}", err);
        process::exit(1);
    }
}

fn run_clean(config: &AppConfig, args: &CleanArgs) -> Result<(), Error> {
    let catalog = Catalog::resolve(Path::new(&config.base_path));
    let roles = args.target.roles();

    // One short-lived connection for the identifier fetch.
    let (rows, ids) = {
        let mut conn = db::connect(&config.database)?;
        db::fetch_identifiers(&mut conn)?
    };

    let opts = sweep::SweepOptions {
        delete: args.delete,
        output: args.output.into(),
        raw: args.raw,
    };
    let summary = sweep::run(&catalog, &roles, &ids, rows, opts);
    info!(
        "{} orphans found, {} reclaimable",
        format!("{}", summary.count).red(),
        format!("{}", HumanBytes(summary.bytes)).red(),
    );
    Ok(())
}

fn run_proof(config: &AppConfig) -> Result<(), Error> {
    let catalog = Catalog::resolve(Path::new(&config.base_path));

    let records = {
        let mut conn = db::connect(&config.database)?;
        db::fetch_proof_records(&mut conn)?
    };

    let handled = extract::process_proofs(&catalog, &records)?;
    info!("{} proof records handled", format!("{}", handled).green());
    Ok(())
}

fn run_init(config: &AppConfig, args: &InitArgs) -> Result<(), Error> {
    let catalog = Catalog::resolve(Path::new(&config.base_path));
    catalog.create()?;
    if args.create {
        catalog.provision_placeholders()?;
    }
    for role in Role::ALL {
        println!("{}", catalog.path(role).display());
    }
    Ok(())
}
