use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use finsight_etl::apis::edinet::EdinetClient;
use finsight_etl::apis::fetch_company_data;
use finsight_etl::config::Config;
use finsight_etl::constants::{COMPANY_CODES, SCHEMA_VERSION};
use finsight_etl::logging;
use finsight_etl::pipeline::process_company_cache;
use finsight_etl::pipeline::taxonomy::TaxonomyMap;
use finsight_etl::validator;

#[derive(Parser)]
#[command(name = "finsight_etl")]
#[command(about = "EDINET quarterly filings ETL for the FinSight dashboard")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch filings from the EDINET API into the local cache
    Fetch {
        /// Specific companies (comma-separated). Available: TEPCO, CHUBU
        #[arg(long)]
        companies: Option<String>,
        /// Years of filing history to request
        #[arg(long, default_value_t = 10)]
        years: u32,
    },
    /// Extract cached archives into quarterly statement tables
    Extract {
        /// Specific companies (comma-separated)
        #[arg(long)]
        companies: Option<String>,
    },
    /// Validate emitted tables and the notes collection
    Validate,
    /// Run fetch then extract sequentially
    Run {
        /// Specific companies (comma-separated)
        #[arg(long)]
        companies: Option<String>,
        /// Years of filing history to request
        #[arg(long, default_value_t = 10)]
        years: u32,
    },
}

fn resolve_companies(companies: Option<String>) -> Vec<String> {
    match companies {
        Some(list) => list.split(',').map(|c| c.trim().to_string()).collect(),
        None => COMPANY_CODES.iter().map(|c| c.to_string()).collect(),
    }
}

async fn run_fetch(config: &Config, companies: &[String], years: u32) -> Result<(), Box<dyn std::error::Error>> {
    let client = EdinetClient::from_config(config)?;
    std::fs::create_dir_all(config.cache_dir())?;

    for company in companies {
        let Some(edinet_code) = config.edinet_code_for(company) else {
            warn!("Unknown company specified: {}", company);
            println!("⚠️  Unknown company: {company}");
            continue;
        };
        fetch_company_data(&client, edinet_code, company, years, &config.cache_dir()).await?;
    }
    Ok(())
}

fn run_extract(config: &Config, companies: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let taxonomy = TaxonomyMap::load(&config.taxonomy_path())?;
    if taxonomy.is_empty() {
        warn!("Taxonomy map is empty, every record will be discarded");
    }

    for company in companies {
        if !COMPANY_CODES.contains(&company.as_str()) {
            warn!("Unknown company specified: {}", company);
            println!("⚠️  Unknown company: {company}");
            continue;
        }
        match process_company_cache(
            company,
            &config.cache_dir(),
            &config.financials_dir(),
            &taxonomy,
        ) {
            Ok(summary) => {
                println!("\n📊 Extraction results for {company}:");
                println!("   Archives: {}", summary.archives);
                println!("   Records: {}", summary.records);
                println!("   Skipped documents: {}", summary.skipped_documents);
                for path in &summary.tables_written {
                    println!("   Output file: {}", path.display());
                }
            }
            Err(e) => {
                error!("Extraction failed for {}: {}", company, e);
                println!("❌ Extraction failed for {company}: {e}");
            }
        }
    }
    Ok(())
}

fn run_validate(config: &Config) -> i32 {
    println!("{}", "=".repeat(80));
    println!("FinSight Data Schema Validation");
    println!("Schema Version: {SCHEMA_VERSION}");
    println!("{}", "=".repeat(80));

    let report = validator::validate_all(&config.financials_dir(), &config.notes_path());

    println!("{}", "=".repeat(80));
    if report.passed() {
        println!("✓ All validations passed!");
        0
    } else {
        println!("✗ Validation failed with {} error(s)", report.len());
        1
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::Fetch { companies, years } => {
            println!("🔄 Running EDINET fetch...");
            let companies = resolve_companies(companies);
            run_fetch(&config, &companies, years).await?;
            info!("Data fetch completed");
        }
        Commands::Extract { companies } => {
            println!("🔨 Running extraction pipeline...");
            let companies = resolve_companies(companies);
            run_extract(&config, &companies)?;
            info!("Data extraction completed");
        }
        Commands::Validate => {
            let code = run_validate(&config);
            std::process::exit(code);
        }
        Commands::Run { companies, years } => {
            println!("🚀 Running full pipeline (fetch + extract)...");
            let companies = resolve_companies(companies);

            println!("\n📥 Step 1: Fetching filings...");
            run_fetch(&config, &companies, years).await?;

            println!("\n🔨 Step 2: Extracting statements...");
            run_extract(&config, &companies)?;

            println!("✅ Full pipeline completed successfully!");
        }
    }
    Ok(())
}
