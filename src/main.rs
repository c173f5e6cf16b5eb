use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

mod ingest;
mod models;
mod period;
mod pivot;
mod reconcile;
mod report;

use models::ReportTable;

#[derive(Parser)]
#[command(name = "rank-spend-report")]
#[command(about = "Bi-weekly keyword rank and ad spend report builder", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the top keywords by recent search volume
    Top {
        #[arg(long)]
        ranks: PathBuf,
        #[arg(long)]
        spend: PathBuf,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Write the reconciled table and volume map as JSON
    Export {
        #[arg(long)]
        ranks: PathBuf,
        #[arg(long)]
        spend: PathBuf,
        /// Defaults to stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        ranks: PathBuf,
        #[arg(long)]
        spend: PathBuf,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn build_report_table(ranks: &Path, spend: &Path) -> anyhow::Result<ReportTable> {
    let rank_records = ingest::load_rank_records(ranks)?;
    let spend_records = ingest::load_spend_records(spend)?;
    let rank_aggregate = pivot::aggregate_ranks(&rank_records)?;
    let spend_matrix = pivot::aggregate_spend(&spend_records);
    reconcile::build_table(&rank_aggregate, &spend_matrix)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Top {
            ranks,
            spend,
            limit,
        } => {
            let table = build_report_table(&ranks, &spend)?;
            if table.rows.is_empty() {
                println!("No keywords found in either export.");
                return Ok(());
            }

            println!("Top keywords by recent search volume:");
            for row in table.rows.iter().take(limit) {
                let latest = row.cells.last();
                let rank = match latest.and_then(|cell| cell.organic_rank) {
                    Some(rank) => format!("{rank:.1}"),
                    None => "-".to_string(),
                };
                let spent = latest.map(|cell| cell.spend).unwrap_or(0.0);
                println!(
                    "- {} (avg SV {:.0}) latest rank {}, spend {:.0}",
                    row.keyword, row.avg_search_volume, rank, spent
                );
            }
        }
        Commands::Export { ranks, spend, out } => {
            let table = build_report_table(&ranks, &spend)?;
            let payload = report::build_payload(&table);
            let json = serde_json::to_string_pretty(&payload)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Report data written to {}.", path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::Report { ranks, spend, out } => {
            let table = build_report_table(&ranks, &spend)?;
            let markdown = report::render_markdown(&table);
            std::fs::write(&out, markdown)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
