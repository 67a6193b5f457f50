//! co - electronic component organizer.
//!
//! Tracks components, their stock per package, storage containers,
//! manufacturers and labels; reconciles stock against BOM spreadsheets; and
//! generates placement programs for the SMT pick-and-place machine.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod bom;
mod commands;
mod config;
mod model;
mod registry;
mod sheet;
mod smt;

use bom::Adjustment;
use commands::inventory::{Catalog, ComponentFields};
use commands::settings::SettingsUpdate;
use commands::smt::GenerateArgs;
use commands::Session;
use config::DataDir;
use model::DatasheetKind;

#[derive(Parser)]
#[command(name = "co")]
#[command(author, version, about = "Electronic component organizer")]
#[command(propagate_version = true)]
struct Cli {
    /// Data directory (default: ~/.co)
    #[arg(long, global = true, env = "CO_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and seed the default packages
    Init,

    /// Manage storage containers
    Container {
        #[command(subcommand)]
        command: CatalogCommands,
    },

    /// Manage packages
    Package {
        #[command(subcommand)]
        command: CatalogCommands,
    },

    /// Manage manufacturers
    Manufacturer {
        #[command(subcommand)]
        command: CatalogCommands,
    },

    /// Manage labels (two levels: label and sub-label)
    Label {
        #[command(subcommand)]
        command: LabelCommands,
    },

    /// Manage components and their stock
    Component {
        #[command(subcommand)]
        command: ComponentCommands,
    },

    /// Reconcile stock against a BOM spreadsheet
    Bom {
        #[command(subcommand)]
        command: BomCommands,
    },

    /// SMT pick-and-place programs
    Smt {
        #[command(subcommand)]
        command: SmtCommands,
    },

    /// Show or change general settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
}

#[derive(Subcommand)]
enum CatalogCommands {
    /// Add a new entry
    Add { name: String },

    /// Remove an entry, detaching it from components
    Remove {
        name: String,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// List all entries
    List,
}

#[derive(Subcommand)]
enum LabelCommands {
    /// Add a label, or a sub-label with --parent
    Add {
        name: String,

        /// Parent label
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Remove a label (and its sub-labels), or a sub-label with --parent
    Remove {
        name: String,

        /// Parent label
        #[arg(short, long)]
        parent: Option<String>,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the label tree
    List,
}

#[derive(Args)]
struct FieldArgs {
    /// Storage container
    #[arg(long)]
    container: Option<String>,

    /// Manufacturer
    #[arg(long)]
    manufacturer: Option<String>,

    /// Label
    #[arg(long)]
    label: Option<String>,

    /// Sub-label of --label
    #[arg(long)]
    sublabel: Option<String>,
}

impl From<FieldArgs> for ComponentFields {
    fn from(args: FieldArgs) -> Self {
        Self {
            container: args.container,
            manufacturer: args.manufacturer,
            label: args.label,
            sublabel: args.sublabel,
        }
    }
}

#[derive(Subcommand)]
enum ComponentCommands {
    /// Add a component
    Add {
        name: String,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Remove a component
    Remove { name: String },

    /// List all components
    List,

    /// Show a component's details and stock
    Show { name: String },

    /// Change a component's references (pass "" to clear one)
    Set {
        name: String,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Set the quantity on hand in a package
    Stock {
        name: String,
        package: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },

    /// Attach a datasheet (omit the path to clear it)
    Datasheet {
        name: String,
        path: Option<PathBuf>,

        /// Datasheet kind (normal, summary, errata, users-guide)
        #[arg(short, long, default_value = "normal")]
        kind: DatasheetKind,
    },
}

#[derive(Subcommand)]
enum BomCommands {
    /// Check stock for a BOM
    Check {
        /// Path to the BOM spreadsheet (.xlsx, .xls, .ods or .csv)
        bom: PathBuf,

        /// Number of boards to build
        #[arg(short, long, default_value = "1")]
        count: u32,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Subtract BOM quantities from stock
    Reduce {
        bom: PathBuf,

        #[arg(short, long)]
        count: u32,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Add BOM quantities back to stock
    Add {
        bom: PathBuf,

        #[arg(short, long)]
        count: u32,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Find the largest number of boards the stock covers
    Max {
        bom: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SmtCommands {
    /// Generate a placement program
    Generate {
        /// PCB name written into the program
        #[arg(long)]
        pcb_name: String,

        /// Placement spreadsheet (X, Y, rotation, designator[, part reference])
        #[arg(long)]
        placement: PathBuf,

        /// BOM spreadsheet mapping part references to designators
        #[arg(long, conflicts_with = "skip_bom")]
        bom: Option<PathBuf>,

        /// Take part references from column 5 of the placement sheet
        #[arg(long)]
        skip_bom: bool,

        /// Profile directory (default from settings)
        #[arg(long)]
        profiles: Option<PathBuf>,

        /// Output file (default: <pcb-name>.txt)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Show current settings
    Show,

    /// Change settings
    Set {
        #[arg(long)]
        save_layout: Option<bool>,

        /// Highlight out-of-stock components in listings
        #[arg(long)]
        mark_low_stock: Option<bool>,

        /// Show the container column in listings
        #[arg(long)]
        show_containers: Option<bool>,

        /// Skip BOM correlation by default in `smt generate`
        #[arg(long)]
        skip_bom: Option<bool>,

        /// Profile directory ("" restores the default)
        #[arg(long)]
        profile_dir: Option<String>,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn catalog(session: &mut Session, catalog: Catalog, command: CatalogCommands) -> Result<()> {
    match command {
        CatalogCommands::Add { name } => commands::inventory::execute_add(session, catalog, &name),
        CatalogCommands::Remove { name, yes } => {
            commands::inventory::execute_remove(session, catalog, &name, yes)
        }
        CatalogCommands::List => commands::inventory::execute_list(session, catalog),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let data_dir = DataDir::resolve(cli.data_dir);
    tracing::debug!(data_dir = %data_dir.root().display(), "using data directory");
    let mut session = Session::open(data_dir)?;

    match cli.command {
        Commands::Init => commands::inventory::execute_init(&mut session),

        Commands::Container { command } => catalog(&mut session, Catalog::Container, command),
        Commands::Package { command } => catalog(&mut session, Catalog::Package, command),
        Commands::Manufacturer { command } => {
            catalog(&mut session, Catalog::Manufacturer, command)
        }

        Commands::Label { command } => match command {
            LabelCommands::Add { name, parent } => {
                commands::inventory::execute_label_add(&mut session, &name, parent.as_deref())
            }
            LabelCommands::Remove { name, parent, yes } => commands::inventory::execute_label_remove(
                &mut session,
                &name,
                parent.as_deref(),
                yes,
            ),
            LabelCommands::List => commands::inventory::execute_label_list(&session),
        },

        Commands::Component { command } => match command {
            ComponentCommands::Add { name, fields } => {
                commands::inventory::execute_component_add(&mut session, &name, fields.into())
            }
            ComponentCommands::Remove { name } => {
                commands::inventory::execute_component_remove(&mut session, &name)
            }
            ComponentCommands::List => commands::inventory::execute_component_list(&session),
            ComponentCommands::Show { name } => {
                commands::inventory::execute_component_show(&session, &name)
            }
            ComponentCommands::Set { name, fields } => {
                commands::inventory::execute_component_set(&mut session, &name, fields.into())
            }
            ComponentCommands::Stock {
                name,
                package,
                quantity,
            } => commands::inventory::execute_component_stock(&mut session, &name, &package, quantity),
            ComponentCommands::Datasheet { name, path, kind } => {
                commands::inventory::execute_component_datasheet(&mut session, &name, path, kind)
            }
        },

        Commands::Bom { command } => match command {
            BomCommands::Check { bom, count, json } => {
                commands::bom::execute_check(&session, &bom, count, json)
            }
            BomCommands::Reduce { bom, count, yes } => commands::bom::execute_adjust(
                &mut session,
                &bom,
                count,
                Adjustment::Reduce,
                yes,
            ),
            BomCommands::Add { bom, count, yes } => commands::bom::execute_adjust(
                &mut session,
                &bom,
                count,
                Adjustment::Add,
                yes,
            ),
            BomCommands::Max { bom, json } => commands::bom::execute_max(&session, &bom, json),
        },

        Commands::Smt { command } => match command {
            SmtCommands::Generate {
                pcb_name,
                placement,
                bom,
                skip_bom,
                profiles,
                output,
            } => commands::smt::execute_generate(
                &session,
                GenerateArgs {
                    pcb_name,
                    placement,
                    bom,
                    skip_bom,
                    profiles,
                    output,
                },
            ),
        },

        Commands::Settings { command } => match command {
            SettingsCommands::Show => commands::settings::execute_show(&session),
            SettingsCommands::Set {
                save_layout,
                mark_low_stock,
                show_containers,
                skip_bom,
                profile_dir,
            } => commands::settings::execute_set(
                &mut session,
                SettingsUpdate {
                    save_layout,
                    mark_low_stock,
                    show_containers,
                    skip_bom,
                    profile_dir: profile_dir.map(PathBuf::from),
                },
            ),
        },
    }
}
