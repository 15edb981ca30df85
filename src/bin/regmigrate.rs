//! regmigrate CLI
//!
//! Drives the v2.6.0 data migration against a store snapshot file:
//! - `migrate` runs the migration (with `--dry-run` to validate only)
//! - `status` shows legacy row counts and migrated document counts
//! - `verify` re-validates every stored document against the schemas
//! - `down` is the declared inverse and intentionally does nothing

use clap::{Arg, ArgMatches, Command};
use regmigrate::{
    migrate::{self, MigrateOptions, Migrator},
    schema::{validate_answers_document, validate_fields_document},
    MigrateConfig, Store,
};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

fn main() {
    init_logging();

    let matches = create_cli().get_matches();

    if let Err(e) = run_command(matches) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("regmigrate=info"));

    let fmt_layer = fmt::layer().with_target(false);

    Registry::default().with(env_filter).with(fmt_layer).init();
}

fn create_cli() -> Command {
    Command::new("regmigrate")
        .about("Event-registration data migration (v2.6.0 denormalization)")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("migrate")
                .about("Run the migration")
                .arg(
                    Arg::new("database")
                        .help("Store snapshot file (falls back to REGMIGRATE_DB)")
                        .index(1),
                )
                .arg(
                    Arg::new("dry-run")
                        .help("Validate everything, then roll back instead of committing")
                        .long("dry-run")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("status").about("Show table and document counts").arg(
                Arg::new("database")
                    .help("Store snapshot file (falls back to REGMIGRATE_DB)")
                    .index(1),
            ),
        )
        .subcommand(
            Command::new("verify")
                .about("Re-validate every stored document against the schemas")
                .arg(
                    Arg::new("database")
                        .help("Store snapshot file (falls back to REGMIGRATE_DB)")
                        .index(1),
                ),
        )
        .subcommand(
            Command::new("down")
                .about("Declared inverse of the migration (performs no work)")
                .arg(
                    Arg::new("database")
                        .help("Store snapshot file (falls back to REGMIGRATE_DB)")
                        .index(1),
                ),
        )
}

fn run_command(matches: ArgMatches) -> regmigrate::Result<()> {
    match matches.subcommand() {
        Some(("migrate", sub)) => cmd_migrate(sub),
        Some(("status", sub)) => cmd_status(sub),
        Some(("verify", sub)) => cmd_verify(sub),
        Some(("down", sub)) => cmd_down(sub),
        _ => unreachable!("subcommand is required"),
    }
}

fn open_store(matches: &ArgMatches) -> regmigrate::Result<(Store, MigrateConfig)> {
    let mut config = MigrateConfig::from_env()?;

    if let Some(path) = matches.get_one::<String>("database") {
        config.db_path = Some(PathBuf::from(path));
    }

    let path = config.db_path.clone().ok_or_else(|| {
        regmigrate::Error::Config(
            "no database given; pass a path or set REGMIGRATE_DB".to_string(),
        )
    })?;

    Ok((Store::open(path)?, config))
}

fn cmd_migrate(matches: &ArgMatches) -> regmigrate::Result<()> {
    let (store, config) = open_store(matches)?;

    let options = MigrateOptions {
        dry_run: matches.get_flag("dry-run") || config.dry_run,
    };

    let report = Migrator::with_options(&store, options).run()?;

    if report.dry_run {
        println!("Dry run: validation passed, nothing committed");
    } else {
        println!("Migration committed");
    }
    println!("  events updated:        {}", report.events_updated);
    println!("  registrations updated: {}", report.registrations_updated);
    println!("  fields migrated:       {}", report.fields_migrated);
    println!("  answers migrated:      {}", report.answers_migrated);
    println!("  orphaned answers:      {}", report.orphaned_answers);
    println!("  legacy rows deleted:   {}", report.legacy_rows_deleted);
    println!("  duration:              {}ms", report.duration_ms);

    Ok(())
}

fn cmd_status(matches: &ArgMatches) -> regmigrate::Result<()> {
    let (store, _) = open_store(matches)?;
    let counts = store.counts();

    let migrated_events = store
        .events()
        .iter()
        .filter(|event| event.fields.as_object().is_some_and(|o| !o.is_empty()))
        .count();
    let migrated_registrations = store
        .registrations()
        .iter()
        .filter(|registration| registration.data.as_object().is_some_and(|o| !o.is_empty()))
        .count();

    println!("Tables:");
    println!("  events:                     {}", counts.events);
    println!("  registrations:              {}", counts.registrations);
    println!("  registration_fields:        {}", counts.registration_fields);
    println!(
        "  registration_field_options: {}",
        counts.registration_field_options
    );
    println!("  registration_data:          {}", counts.registration_data);
    println!("Documents:");
    println!("  events with fields:         {}", migrated_events);
    println!("  registrations with data:    {}", migrated_registrations);

    if counts.legacy_rows() == 0 {
        println!("Legacy tables are empty; migration has run (or nothing needed it)");
    } else {
        println!("{} legacy rows pending migration", counts.legacy_rows());
    }

    Ok(())
}

fn cmd_verify(matches: &ArgMatches) -> regmigrate::Result<()> {
    let (store, _) = open_store(matches)?;
    let mut invalid = 0;

    for event in store.events() {
        if let Err(issues) = validate_fields_document(&event.fields) {
            invalid += 1;
            println!("event {} has an invalid fields document:", event.id);
            for issue in issues {
                println!("  {}", issue);
            }
        }
    }

    for registration in store.registrations() {
        if let Err(issues) = validate_answers_document(&registration.data) {
            invalid += 1;
            println!(
                "registration {} has an invalid data document:",
                registration.id
            );
            for issue in issues {
                println!("  {}", issue);
            }
        }
    }

    if invalid == 0 {
        println!("All stored documents validate");
        Ok(())
    } else {
        Err(regmigrate::Error::Storage(format!(
            "{invalid} stored document(s) failed validation"
        )))
    }
}

fn cmd_down(matches: &ArgMatches) -> regmigrate::Result<()> {
    let (store, _) = open_store(matches)?;
    migrate::down(&store)?;
    println!("This migration is irreversible; down performed no work");
    Ok(())
}
