//! SMA Landscape CLI
//!
//! Command-line interface to the landscape aggregations:
//! - Roll records up by any dimension
//! - Shade states or ZIPs
//! - Print an account or referral network
//! - Deep-dive one HCP or HCO
//! - Log in and out of the local session

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sma_landscape::aggregate::{Entity, GroupBy, GroupCounts, GroupOrder};
use sma_landscape::config::{generate_default_config, Config};
use sma_landscape::layout::Hierarchy;
use sma_landscape::record::Record;
use sma_landscape::session::{Dataset, DatasetCache, Filters, OrgRelationship, SessionStore};
use sma_landscape::views::{
    ordered_rollup, HcoDeepDive, HcpDeepDive, ReferringAccount, RegionLayer,
};

#[derive(Parser)]
#[command(name = "landscape-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "HCP/HCO treatment and referral analytics for the SMA portfolio")]
#[command(
    long_about = "Runs the landscape dashboard's aggregations from the terminal,\nagainst the data portal or a local JSON dump."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Data portal URL
    #[arg(long, global = true)]
    pub portal_url: Option<String>,

    /// Local JSON dump to use instead of the portal
    #[arg(long, global = true)]
    pub input: Option<PathBuf>,

    /// ZIP to territory file (JSON)
    #[arg(long, global = true)]
    pub territories: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Config file (default: search the standard locations)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Region {
    State,
    Zip,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Order {
    /// Largest count first
    Count,
    /// Alphabetical
    Key,
    /// The dimension's own order (tiers ascending, segments by rank)
    Natural,
}

/// Record filters, as on the dashboard
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// State code or name
    #[arg(long)]
    pub state: Option<String>,
    #[arg(long)]
    pub year: Option<i32>,
    #[arg(long)]
    pub territory: Option<String>,
    #[arg(long)]
    pub specialty: Option<String>,
    /// all, within or outside
    #[arg(long, default_value = "all")]
    pub relationship: OrgRelationship,
}

impl From<FilterArgs> for Filters {
    fn from(args: FilterArgs) -> Self {
        Filters {
            state: args.state,
            year: args.year,
            territory: args.territory,
            specialty: args.specialty,
            relationship: args.relationship,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Distinct counts grouped by one dimension
    Rollup {
        /// state, hcp_state, zip, tier, segment, specialty, archetype, drug,
        /// year, period, age_group, territory or referral
        #[arg(short, long)]
        by: GroupBy,
        /// patients, hcps or hcos
        #[arg(short, long, default_value = "patients")]
        count: Entity,
        /// Keep only the first N rows
        #[arg(short, long)]
        top: Option<usize>,
        #[arg(short, long, value_enum, default_value = "count")]
        order: Order,
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Quantile-shaded counts per state or ZIP
    Choropleth {
        #[arg(short, long, value_enum, default_value = "state")]
        by: Region,
        /// What the shading counts
        #[arg(short, long, default_value = "patients")]
        count: Entity,
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Laid-out network tree of one account or prescriber
    #[command(group(clap::ArgGroup::new("target").required(true).args(["hco", "hcp"])))]
    Network {
        /// Account MDM id
        #[arg(long)]
        hco: Option<String>,
        /// Prescriber name or id
        #[arg(long)]
        hcp: Option<String>,
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// HCP deep dive
    Hcp {
        /// Prescriber name or id
        name: String,
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// HCO deep dive
    Hco {
        /// Account MDM id
        mdm: String,
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Log in to the local session
    Login {
        #[arg(short, long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,
        /// Remember the email for next time
        #[arg(short, long)]
        remember: bool,
    },

    /// Log out and drop the mirrored dataset
    Logout,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sma_landscape=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let format = cli.format;

    match cli.command {
        Commands::Rollup {
            by,
            count,
            top,
            order,
            filters,
        } => {
            let (dataset, records) = load(&config, filters.into()).await?;
            let order = match order {
                Order::Count => Some(GroupOrder::CountDesc),
                Order::Key => Some(GroupOrder::KeyAsc),
                Order::Natural => None,
            };

            let mut counts =
                ordered_rollup(&records, by, count, Some(&dataset.territories), order);
            if let Some(n) = top {
                counts = counts.top(n);
            }

            print_counts(by.name(), &counts, format)?;
        }

        Commands::Choropleth { by, count, filters } => {
            let (dataset, records) = load(&config, filters.into()).await?;
            let options = config.view_options()?;
            let group = match by {
                Region::State => GroupBy::State,
                Region::Zip => GroupBy::Zip,
            };

            let layer = RegionLayer::build(
                &records,
                group,
                Some(&dataset.territories),
                count,
                &options.palette,
            );
            print_layer(&layer, format)?;
        }

        Commands::Network { hco, hcp, filters } => {
            let (_, records) = load(&config, filters.into()).await?;
            let options = config.view_options()?;

            let network = match (hco, hcp) {
                (Some(mdm), _) => HcoDeepDive::build(&records, &mdm, &options)?.network,
                (None, Some(name)) => HcpDeepDive::build(&records, &name, &options)?.network,
                (None, None) => bail!("Pass --hco or --hcp"),
            };
            print_network(&network, format)?;
        }

        Commands::Hcp { name, filters } => {
            let (_, records) = load(&config, filters.into()).await?;
            let view = HcpDeepDive::build(&records, &name, &config.view_options()?)?;

            match format {
                OutputFormat::Json => print_json(&view)?,
                OutputFormat::Csv => write_csv(view.accounts.iter())?,
                OutputFormat::Table => {
                    println!("{}", view.profile.name);
                    print_field("ID", view.profile.id.as_deref());
                    print_field("Specialty", view.profile.specialty.as_deref());
                    print_field("Segment", view.profile.segment.as_deref());
                    print_field("State", view.profile.state.as_deref());
                    println!();
                    println!(
                        "Patients: {}   Accounts: {}   Referred out: {}",
                        view.totals.patients, view.totals.hcos, view.referred_out
                    );
                    println!();
                    print_table("Account", &view.accounts);
                    println!();
                    print_table("Drug", &view.drugs);
                }
            }
        }

        Commands::Hco { mdm, filters } => {
            let (_, records) = load(&config, filters.into()).await?;
            let view = HcoDeepDive::build(&records, &mdm, &config.view_options()?)?;

            match format {
                OutputFormat::Json => print_json(&view)?,
                OutputFormat::Csv => write_csv(view.hcps.iter())?,
                OutputFormat::Table => {
                    println!(
                        "{} ({})",
                        view.profile.name.as_deref().unwrap_or("Unnamed account"),
                        view.profile.mdm
                    );
                    print_field("Tier", view.profile.tier.as_deref());
                    print_field("Archetype", view.profile.archetype.as_deref());
                    print_field("State", view.profile.state.as_deref());
                    println!();
                    println!(
                        "Patients: {}   HCPs: {}",
                        view.totals.patients, view.totals.hcps
                    );
                    println!();
                    print_table("HCP", &view.hcps);
                    println!();
                    print_referring(&view.referring);
                }
            }
        }

        Commands::Login {
            email,
            password,
            remember,
        } => {
            let password = match password {
                Some(p) => p,
                None => read_password()?,
            };

            let mut store = SessionStore::open(&config.session.data_path())?;
            store.login(&config.credentials(), &email, &password, remember)?;
            println!("Logged in as {}", email.trim());
        }

        Commands::Logout => {
            let mut store = SessionStore::open(&config.session.data_path())?;
            store.logout()?;

            if let Some(mirror) = config.session.mirror_path() {
                DatasetCache::with_mirror(mirror).clear().await;
            }
            println!("Logged out");
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            if let Some(path) = output {
                std::fs::write(&path, content)
                    .with_context(|| format!("Failed to write {:?}", path))?;
                println!("Config written to {:?}", path);
            } else {
                print!("{}", content);
            }
        }
    }

    Ok(())
}

/// Config file plus the command-line overrides
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    if let Some(url) = &cli.portal_url {
        config.portal.url = url.clone();
    }
    if let Some(input) = &cli.input {
        config.portal.input = Some(path_string(input));
    }
    if let Some(territories) = &cli.territories {
        config.portal.territories_file = Some(path_string(territories));
    }

    Ok(config)
}

fn path_string(path: &Path) -> String {
    path.display().to_string()
}

/// Fetch the dataset (through the mirror, when configured) and filter it
async fn load(config: &Config, filters: Filters) -> anyhow::Result<(Arc<Dataset>, Vec<Record>)> {
    let source = config.record_source()?;
    let cache = match config.session.mirror_path() {
        Some(path) => DatasetCache::with_mirror(path),
        None => DatasetCache::new(),
    };

    let dataset = cache
        .get_or_fetch(source.as_ref())
        .await
        .with_context(|| format!("Failed to fetch records from {}", source.name()))?;
    let records = filters.apply(&dataset.records, Some(&dataset.territories));

    tracing::info!(total = dataset.records.len(), matched = records.len(), "Loaded records");
    Ok((dataset, records))
}

fn read_password() -> anyhow::Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn write_csv<'a, T, I>(rows: I) -> anyhow::Result<()>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut writer = csv::Writer::from_writer(io::stdout());
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn print_field(name: &str, value: Option<&str>) {
    println!("  {:<10} {}", format!("{}:", name), value.unwrap_or("-"));
}

fn print_table(heading: &str, counts: &GroupCounts) {
    if counts.is_empty() {
        println!("No {} rows.", heading.to_lowercase());
        return;
    }

    println!("{:<40} {:>10}", heading, "Count");
    println!("{}", "-".repeat(51));
    for row in counts.iter() {
        println!("{:<40} {:>10}", truncate(&row.key, 40), row.count);
    }
}

fn print_referring(accounts: &[ReferringAccount]) {
    if accounts.is_empty() {
        println!("No referring accounts.");
        return;
    }

    println!("{:<40} {:<12} {:>10}", "Referring account", "MDM", "Patients");
    println!("{}", "-".repeat(64));
    for account in accounts {
        println!(
            "{:<40} {:<12} {:>10}",
            truncate(account.label(), 40),
            truncate(&account.mdm, 12),
            account.patients
        );
    }
}

fn print_counts(heading: &str, counts: &GroupCounts, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(counts),
        OutputFormat::Csv => write_csv(counts.iter()),
        OutputFormat::Table => {
            print_table(heading, counts);
            Ok(())
        }
    }
}

fn print_layer(layer: &RegionLayer, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(layer),
        OutputFormat::Csv => {
            // Flattened rows; csv cannot serialize the nested tally
            let mut writer = csv::Writer::from_writer(io::stdout());
            writer.write_record(["key", "patients", "hcps", "hcos", "color"])?;
            for region in &layer.regions {
                let t = &region.tally;
                writer.write_record([
                    t.key.clone(),
                    t.patients.to_string(),
                    t.hcps.to_string(),
                    t.hcos.to_string(),
                    region.color.clone(),
                ])?;
            }
            writer.flush()?;
            Ok(())
        }
        OutputFormat::Table => {
            println!(
                "{:<8} {:>10} {:>8} {:>8}  {}",
                "Region", "Patients", "HCPs", "HCOs", "Color"
            );
            println!("{}", "-".repeat(46));
            for region in &layer.regions {
                let t = &region.tally;
                println!(
                    "{:<8} {:>10} {:>8} {:>8}  {}",
                    t.key, t.patients, t.hcps, t.hcos, region.color
                );
            }
            println!();
            println!("Legend ({:?}):", layer.shaded_by);
            for bin in &layer.legend {
                println!("  {}  {:.0} - {:.0}", bin.color, bin.lower, bin.upper);
            }
            Ok(())
        }
    }
}

fn print_network(network: &Hierarchy, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(network),
        OutputFormat::Csv => write_csv(network.nodes.iter()),
        OutputFormat::Table => {
            for node in &network.nodes {
                println!(
                    "{}{} ({} patients)  [{:.0}, {:.0}]",
                    "  ".repeat(node.level),
                    node.label,
                    node.patients,
                    node.x,
                    node.y
                );
            }
            Ok(())
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_rollup() {
        let cli = Cli::try_parse_from([
            "landscape-cli",
            "--input",
            "dump.json",
            "rollup",
            "--by",
            "tier",
            "--count",
            "hcos",
            "--state",
            "CA",
            "--relationship",
            "within",
            "--format",
            "csv",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Csv);
        assert_eq!(cli.input, Some(PathBuf::from("dump.json")));
        match cli.command {
            Commands::Rollup {
                by, count, filters, ..
            } => {
                assert_eq!(by, GroupBy::Tier);
                assert_eq!(count, Entity::Hco);
                let filters: Filters = filters.into();
                assert_eq!(filters.state.as_deref(), Some("CA"));
                assert_eq!(filters.relationship, OrgRelationship::WithinNetwork);
            }
            _ => panic!("expected rollup"),
        }
    }

    #[test]
    fn test_network_needs_a_target() {
        assert!(Cli::try_parse_from(["landscape-cli", "network"]).is_err());
        assert!(Cli::try_parse_from(["landscape-cli", "network", "--hco", "M1"]).is_ok());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::try_parse_from([
            "landscape-cli",
            "--portal-url",
            "http://portal:5000",
            "--territories",
            "zips.json",
            "logout",
        ])
        .unwrap();

        let config = load_config(&cli).unwrap();
        assert_eq!(config.portal.url, "http://portal:5000");
        assert_eq!(config.portal.territories_file.as_deref(), Some("zips.json"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
