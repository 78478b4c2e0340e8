//! # Kirana Back Office CLI
//!
//! Entry points that do not need the desktop shell:
//!
//! ```text
//! kirana setup                 create/migrate the database, seed defaults,
//!                              ensure the default admin account
//! kirana backup                timestamped copy of the database file
//! kirana restore <file>        restore the database from a backup
//! kirana report <kind> ...     run a canned report, optionally to CSV
//! ```
//!
//! Report kinds: `daily`, `range`, `top-products`, `low-stock`, `expiring`,
//! `payments`, `valuation`. Ranges take `--from`/`--to` (YYYY-MM-DD);
//! `--out <path>` writes CSV instead of printing a table.
//!
//! ## Startup Sequence
//! 1. Initialize tracing (RUST_LOG respected, default info)
//! 2. Load `.env` + environment configuration
//! 3. Dispatch the subcommand

use chrono::{NaiveDate, Utc};
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kirana_backoffice::services::backup::BackupService;
use kirana_backoffice::services::reports::{
    self, daily_sales_csv, payment_breakdown_csv, stock_report_csv, top_products_csv,
    ReportService,
};
use kirana_backoffice::AppConfig;
use kirana_db::{Database, DbConfig};

#[tokio::main]
async fn main() {
    init_tracing();

    // Honor a .env file in development; absent is fine.
    dotenvy::dotenv().ok();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");

    let result = match command {
        "setup" => cmd_setup(&config).await,
        "backup" => cmd_backup(&config),
        "restore" => cmd_restore(&config, args.get(2).map(String::as_str)),
        "report" => cmd_report(&config, &args[2..]).await,
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_help();
            std::process::exit(2);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// `RUST_LOG` overrides the default `info` level, e.g.
/// `RUST_LOG=kirana_db=debug kirana report daily`.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();
}

fn print_help() {
    println!("Kirana POS Back Office");
    println!();
    println!("Usage: kirana <COMMAND>");
    println!();
    println!("Commands:");
    println!("  setup                      Create/migrate the database and default admin");
    println!("  backup                     Back up the database file");
    println!("  restore <file>             Restore the database from a backup file");
    println!("  report <kind> [options]    Run a canned report");
    println!();
    println!("Report kinds:");
    println!("  daily         [--date YYYY-MM-DD] [--out file.csv]");
    println!("  range         --from YYYY-MM-DD --to YYYY-MM-DD [--out file.csv]");
    println!("  top-products  [--from ...] [--to ...] [--limit N] [--out file.csv]");
    println!("  low-stock     [--out file.csv]");
    println!("  expiring      [--out file.csv]");
    println!("  payments      [--from ...] [--to ...] [--out file.csv]");
    println!("  valuation");
    println!();
    println!("Configuration comes from KIRANA_* environment variables (.env honored).");
}

/// `kirana setup`: migrate and seed the essentials.
async fn cmd_setup(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Kirana POS Setup");
    println!("================");
    println!("Database: {}", config.database_path.display());

    let db = Database::new(DbConfig::new(&config.database_path)).await?;
    println!("✓ Database created and migrations applied");

    let created = db
        .users()
        .ensure_default_admin(&config.admin_username, &config.admin_password)
        .await?;
    if created {
        println!("✓ Default admin account '{}' created", config.admin_username);
        println!("  Change its password after the first login.");
    } else {
        println!("✓ Admin account '{}' already present", config.admin_username);
    }

    let products = db.products().count().await?;
    let suppliers = db.suppliers().count().await?;
    println!("✓ {} products, {} suppliers on record", products, suppliers);
    println!();
    println!("Done. Load demo data with: cargo run -p kirana-db --bin seed");

    info!("Setup complete");
    Ok(())
}

/// `kirana backup`
fn cmd_backup(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let service = BackupService::new(&config.database_path, &config.backup_dir);
    let target = service.create_backup()?;
    println!("Backup written to {}", target.display());
    Ok(())
}

/// `kirana restore <file>`
fn cmd_restore(
    config: &AppConfig,
    file: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(file) = file else {
        eprintln!("Usage: kirana restore <backup-file>");
        std::process::exit(2);
    };

    let service = BackupService::new(&config.database_path, &config.backup_dir);
    service.restore(&PathBuf::from(file))?;
    println!("Database restored from {file}");
    Ok(())
}

/// Options shared by the report subcommands.
struct ReportArgs {
    kind: String,
    date: NaiveDate,
    from: NaiveDate,
    to: NaiveDate,
    limit: u32,
    out: Option<PathBuf>,
}

fn parse_report_args(args: &[String]) -> Result<ReportArgs, Box<dyn std::error::Error>> {
    let today = Utc::now().date_naive();
    let mut parsed = ReportArgs {
        kind: args.first().cloned().unwrap_or_default(),
        date: today,
        from: today,
        to: today,
        limit: 10,
        out: None,
    };

    let mut i = 1;
    while i < args.len() {
        let value = |i: usize| -> Result<&String, Box<dyn std::error::Error>> {
            args.get(i + 1)
                .ok_or_else(|| format!("Missing value for {}", args[i]).into())
        };
        match args[i].as_str() {
            "--date" => {
                parsed.date = NaiveDate::parse_from_str(value(i)?, "%Y-%m-%d")?;
                i += 1;
            }
            "--from" => {
                parsed.from = NaiveDate::parse_from_str(value(i)?, "%Y-%m-%d")?;
                i += 1;
            }
            "--to" => {
                parsed.to = NaiveDate::parse_from_str(value(i)?, "%Y-%m-%d")?;
                i += 1;
            }
            "--limit" => {
                parsed.limit = value(i)?.parse()?;
                i += 1;
            }
            "--out" => {
                parsed.out = Some(PathBuf::from(value(i)?));
                i += 1;
            }
            other => return Err(format!("Unknown report option: {other}").into()),
        }
        i += 1;
    }

    Ok(parsed)
}

/// `kirana report <kind> ...`
async fn cmd_report(
    config: &AppConfig,
    args: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = parse_report_args(args)?;
    if parsed.kind.is_empty() {
        eprintln!("Usage: kirana report <kind> [options]");
        std::process::exit(2);
    }

    let db = Database::new(DbConfig::new(&config.database_path)).await?;
    let service = ReportService::new(
        db.clone(),
        config.low_stock_threshold,
        config.expiry_alert_days,
    );

    match parsed.kind.as_str() {
        "daily" => {
            let row = service.daily_sales(parsed.date).await?;
            let csv = daily_sales_csv(std::slice::from_ref(&row));
            emit(&parsed.out, &csv)?;
        }
        "range" => {
            let rows = service.sales_range(parsed.from, parsed.to).await?;
            emit(&parsed.out, &daily_sales_csv(&rows))?;
        }
        "top-products" => {
            let rows = service
                .top_products(parsed.from, parsed.to, parsed.limit)
                .await?;
            emit(&parsed.out, &top_products_csv(&rows))?;
        }
        "low-stock" => {
            let rows = service.low_stock().await?;
            emit(&parsed.out, &stock_report_csv(&rows))?;
        }
        "expiring" => {
            let rows = service.expiring(Utc::now().date_naive()).await?;
            emit(&parsed.out, &stock_report_csv(&rows))?;
        }
        "payments" => {
            let rows = service.payment_breakdown(parsed.from, parsed.to).await?;
            emit(&parsed.out, &payment_breakdown_csv(&rows))?;
        }
        "valuation" => {
            let stats = service.stock_valuation().await?;
            println!("Active products:   {}", stats.total_products);
            println!("Stock units:       {}", stats.total_stock_units);
            println!("Out of stock:      {}", stats.out_of_stock);
            println!(
                "Stock at cost:     {}",
                reports::format_amount(stats.stock_cost_value)
            );
            println!(
                "Stock at retail:   {}",
                reports::format_amount(stats.stock_retail_value)
            );
        }
        other => {
            eprintln!("Unknown report kind: {other}");
            std::process::exit(2);
        }
    }

    Ok(())
}

/// Prints CSV to stdout or writes it to the requested file.
fn emit(out: &Option<PathBuf>, csv: &str) -> Result<(), Box<dyn std::error::Error>> {
    match out {
        Some(path) => {
            reports::export(path, csv)?;
            println!("Report written to {}", path.display());
        }
        None => println!("{csv}"),
    }
    Ok(())
}
