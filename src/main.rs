//! factory-planner command line

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use factory_planner::calculator::{RateCalculator, RateRequest};
use factory_planner::config::PlannerConfig;
use factory_planner::constants::GameConstants;
use factory_planner::models::{
    ExtractorKind, GeneratorGroup, GeneratorKind, MachineGroup, MachineKind, Purity,
    ResourceWellExtractorEntry, ResourceWellPressurizer,
};
use factory_planner::payload::RawInputDraft;
use factory_planner::well::ResourceWellAggregator;
use factory_planner::{blueprint, db, extract, snap};

#[derive(Parser)]
#[command(name = "factory-planner")]
#[command(about = "Production rate and power calculator for Satisfactory")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the SQLite database (overrides the config file)
    #[arg(short, long)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize empty database with schema
    Init,

    /// Store the built-in game data in the database
    Seed,

    /// Update game data from the game's Docs.json files
    Extract {
        /// Directory containing the docs JSON (e.g. CommunityResources/Docs)
        docs_dir: PathBuf,

        /// Start from the built-in game data instead of the stored one
        #[arg(long)]
        clear: bool,
    },

    /// Print the active game data as TOML
    Constants,

    /// Throughput and power of a group of extractors
    Extractor {
        /// Extractor kind (e.g. "miner_mk2", "oil_extractor")
        kind: ExtractorKind,

        #[arg(short, long)]
        purity: Option<Purity>,

        /// Clock speed in percent
        #[arg(short, long, default_value = "100", allow_negative_numbers = true)]
        clock: f64,

        #[arg(short = 'n', long, default_value = "1")]
        count: u32,
    },

    /// Output and power of a group of production machines
    Machine {
        /// Machine kind (e.g. "assembler")
        kind: MachineKind,

        /// Recipe output per machine per minute at 100%
        #[arg(short, long)]
        recipe_rate: f64,

        #[arg(short, long, default_value = "100", allow_negative_numbers = true)]
        clock: f64,

        #[arg(short = 'n', long, default_value = "1")]
        count: u32,

        #[arg(short, long, default_value = "0")]
        somersloop: u32,
    },

    /// Power generated and fuel burned by a group of generators
    Generator {
        kind: GeneratorKind,

        #[arg(short, long, default_value = "100", allow_negative_numbers = true)]
        clock: f64,

        #[arg(short = 'n', long, default_value = "1")]
        count: u32,
    },

    /// Total throughput and power of a resource well
    Well {
        /// Pressurizer clock speed in percent
        #[arg(short, long, default_value = "100", allow_negative_numbers = true)]
        clock: f64,

        /// Extractor nodes as purity[:count], repeatable
        #[arg(long = "node")]
        nodes: Vec<ResourceWellExtractorEntry>,

        /// Item extracted; required with --json
        #[arg(short, long)]
        item: Option<String>,

        /// Print the backend payload instead of a summary
        #[arg(long, requires = "item")]
        json: bool,
    },

    /// Apply slider sticky-snap to a raw clock value
    Snap {
        #[arg(allow_negative_numbers = true)]
        raw: f64,
    },

    /// Work with factory blueprint files
    Blueprint {
        #[command(subcommand)]
        action: BlueprintCommand,
    },
}

#[derive(Subcommand)]
enum BlueprintCommand {
    /// Create an empty blueprint
    New {
        file: PathBuf,

        #[arg(short, long)]
        name: String,
    },

    /// Add a raw input to a blueprint
    AddInput {
        file: PathBuf,

        kind: ExtractorKind,

        #[arg(short, long)]
        item: String,

        #[arg(short, long)]
        purity: Option<Purity>,

        /// Clock speed, or pressurizer clock speed for resource wells
        #[arg(short, long, default_value = "100", allow_negative_numbers = true)]
        clock: f64,

        #[arg(short = 'n', long, default_value = "1")]
        count: u32,

        /// Resource-well nodes as purity[:count], repeatable
        #[arg(long = "node")]
        nodes: Vec<ResourceWellExtractorEntry>,
    },

    /// Recompute and print a blueprint's power balance and item flows
    Summary { file: PathBuf },
}

fn init_logging(config: &PlannerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Game data precedence: constants file, then database, then built-in defaults
fn resolve_constants(config: &PlannerConfig, conn: &Connection) -> Result<GameConstants> {
    if let Some(path) = &config.constants_file {
        info!(path = %path.display(), "Loading game data from file");
        return GameConstants::from_toml_file(path);
    }

    match db::load_constants(conn)? {
        Some(constants) => {
            debug!(version = %constants.version, "Loaded game data from database");
            Ok(constants)
        }
        None => {
            debug!("Database not seeded, using built-in game data");
            Ok(GameConstants::default())
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = PlannerConfig::load(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database = database;
    }
    init_logging(&config);

    let conn = Connection::open(&config.database)
        .with_context(|| format!("Failed to open database {}", config.database.display()))?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Init => {
            println!("Database initialized at: {}", config.database.display());
        }

        Commands::Seed => {
            let constants = GameConstants::default();
            db::save_constants(&conn, &constants)?;
            println!("Loaded built-in game data (version {})", constants.version);
        }

        Commands::Extract { docs_dir, clear } => {
            let mut constants = if clear {
                println!("Starting from built-in game data...");
                GameConstants::default()
            } else {
                resolve_constants(&config, &conn)?
            };

            let stats = extract::extract_to_constants(&docs_dir, &mut constants)?;
            db::save_constants(&conn, &constants)?;
            println!("\n{}", stats);
        }

        Commands::Constants => {
            let constants = resolve_constants(&config, &conn)?;
            print!("{}", constants.to_toml_string()?);
        }

        Commands::Extractor {
            kind,
            purity,
            clock,
            count,
        } => {
            let constants = resolve_constants(&config, &conn)?;
            let output = RateCalculator::new(&constants).compute_rate(&RateRequest::Extractor {
                kind,
                purity,
                clock_speed: clock,
                count,
            })?;
            println!("{}x {} @ {}%: {}", count, kind, clock, output);
        }

        Commands::Machine {
            kind,
            recipe_rate,
            clock,
            count,
            somersloop,
        } => {
            let constants = resolve_constants(&config, &conn)?;
            let group = MachineGroup {
                kind,
                recipe_rate,
                count,
                clock_speed: clock,
                somersloop,
            };
            let output = RateCalculator::new(&constants).compute_rate(&RateRequest::Machine(group))?;
            println!("{}x {} @ {}%: {}", count, kind, clock, output);
        }

        Commands::Generator { kind, clock, count } => {
            let constants = resolve_constants(&config, &conn)?;
            let output = RateCalculator::new(&constants).generator(&GeneratorGroup {
                kind,
                count,
                clock_speed: clock,
            })?;
            println!("{}x {} @ {}%: {}", count, kind, clock, output);
        }

        Commands::Well {
            clock,
            nodes,
            item,
            json,
        } => {
            let constants = resolve_constants(&config, &conn)?;
            let pressurizer = ResourceWellPressurizer { clock_speed: clock };

            match item.filter(|_| json) {
                Some(item) => {
                    let mut draft = RawInputDraft::new(ExtractorKind::ResourceWellExtractor, item);
                    draft.pressurizer = Some(pressurizer);
                    draft.well_entries = nodes;
                    let payload = draft.to_payload(&constants)?;
                    println!("{}", serde_json::to_string_pretty(&payload)?);
                }
                None => {
                    let output = ResourceWellAggregator::new(&constants).compute(&pressurizer, &nodes)?;
                    println!("Resource well @ {}%: {}", clock, output);
                }
            }
        }

        Commands::Snap { raw } => {
            let constants = resolve_constants(&config, &conn)?;
            println!("{}", snap::sticky_snap(raw, &constants.snap));
        }

        Commands::Blueprint { action } => run_blueprint(action, &config, &conn)?,
    }

    Ok(())
}

fn run_blueprint(action: BlueprintCommand, config: &PlannerConfig, conn: &Connection) -> Result<()> {
    match action {
        BlueprintCommand::New { file, name } => {
            let factory = blueprint::FactoryBlueprint::new(name);
            blueprint::export_blueprint(&file, &factory)?;
            println!("Created blueprint '{}' at {}", factory.name, file.display());
        }

        BlueprintCommand::AddInput {
            file,
            kind,
            item,
            purity,
            clock,
            count,
            nodes,
        } => {
            let constants = resolve_constants(config, conn)?;
            let mut factory = blueprint::import_blueprint(&file)?;

            let mut draft = RawInputDraft::new(kind, item);
            draft.purity = purity;
            draft.count = count;
            if kind == ExtractorKind::ResourceWellExtractor {
                draft.pressurizer = Some(ResourceWellPressurizer { clock_speed: clock });
                draft.well_entries = nodes;
            } else {
                draft.clock_speed = clock;
            }

            let payload = draft.to_payload(&constants)?;
            println!(
                "Added {}x {} for {} @ {:.3}/min",
                payload.count, payload.extractor_type, payload.item, payload.quantity_per_min
            );
            factory.raw_inputs.push(payload);
            blueprint::export_blueprint(&file, &factory)?;
        }

        BlueprintCommand::Summary { file } => {
            let constants = resolve_constants(config, conn)?;
            let factory = blueprint::import_blueprint(&file)?;
            let summary = blueprint::summarize(&factory, &constants)?;
            println!("{}", summary);
        }
    }

    Ok(())
}
