use clap::{Parser, Subcommand, ValueEnum};
use labdesk_core::OrderStatus;

#[derive(Parser)]
#[command(name = "labdesk")]
#[command(about = "LabDesk CLI: manage patients, lab tests and orders")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Server base URL (overrides config and LABDESK_URL env var)
    #[arg(short, long, global = true, env = "LABDESK_URL")]
    pub server: Option<String>,

    /// Config profile name
    #[arg(short, long, global = true, env = "LABDESK_PROFILE", default_value = "default")]
    pub profile: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check server health and readiness
    Status,
    /// Manage patients
    #[command(subcommand)]
    Patients(PatientCommands),
    /// Manage the lab-test catalog
    #[command(subcommand)]
    Tests(TestCommands),
    /// Manage orders
    #[command(subcommand)]
    Orders(OrderCommands),
    /// Manage CLI configuration
    Config(ConfigArgs),
}

#[derive(Subcommand)]
pub enum PatientCommands {
    /// List patients, newest first
    List(PatientListArgs),
    /// Show one patient
    Show { id: String },
    /// Register a patient
    Create(PatientCreateArgs),
    /// Change a patient's details
    Update(PatientUpdateArgs),
}

#[derive(clap::Args)]
pub struct PatientListArgs {
    /// Text to search for
    #[arg(long)]
    pub search: Option<String>,
    /// Field to search in
    #[arg(long, value_enum)]
    pub field: Option<SearchFieldArg>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SearchFieldArg {
    All,
    Name,
    Email,
    Phone,
    Birthdate,
}

impl SearchFieldArg {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchFieldArg::All => "all",
            SearchFieldArg::Name => "name",
            SearchFieldArg::Email => "email",
            SearchFieldArg::Phone => "phone",
            SearchFieldArg::Birthdate => "birthdate",
        }
    }
}

#[derive(clap::Args)]
pub struct PatientCreateArgs {
    /// Full name
    #[arg(long)]
    pub name: String,
    /// Date of birth (YYYY-MM-DD)
    #[arg(long)]
    pub dob: String,
    #[arg(long)]
    pub email: Option<String>,
    /// Phone number; digits are formatted as (XXX) XXX-XXXX
    #[arg(long)]
    pub phone: Option<String>,
}

#[derive(clap::Args)]
pub struct PatientUpdateArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    /// Date of birth (YYYY-MM-DD)
    #[arg(long)]
    pub dob: Option<String>,
    #[arg(long, conflicts_with = "clear_email")]
    pub email: Option<String>,
    #[arg(long, conflicts_with = "clear_phone")]
    pub phone: Option<String>,
    /// Remove the stored email
    #[arg(long)]
    pub clear_email: bool,
    /// Remove the stored phone number
    #[arg(long)]
    pub clear_phone: bool,
}

#[derive(Subcommand)]
pub enum TestCommands {
    /// List the catalog ordered by code
    List {
        /// Only tests that can be ordered
        #[arg(long)]
        active_only: bool,
    },
    /// Add a test to the catalog
    Create(TestCreateArgs),
    /// Edit a catalog entry
    Update(TestUpdateArgs),
    /// Allow a test to be ordered
    Activate { id: String },
    /// Stop a test from being ordered
    Deactivate { id: String },
}

#[derive(clap::Args)]
pub struct TestCreateArgs {
    #[arg(long)]
    pub code: String,
    #[arg(long)]
    pub name: String,
    /// Price in cents
    #[arg(long)]
    pub price_cents: i64,
    #[arg(long)]
    pub turnaround_days: i32,
    /// Create the test inactive
    #[arg(long)]
    pub inactive: bool,
}

#[derive(clap::Args)]
pub struct TestUpdateArgs {
    pub id: String,
    #[arg(long)]
    pub code: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub price_cents: Option<i64>,
    #[arg(long)]
    pub turnaround_days: Option<i32>,
}

#[derive(Subcommand)]
pub enum OrderCommands {
    /// List orders, most recently placed first
    List(OrderListArgs),
    /// Show an order with its patient and items
    Show { id: String },
    /// Place a draft order
    Create(OrderCreateArgs),
    /// Move an order to another status
    Status {
        id: String,
        /// DRAFT, SUBMITTED, IN_PROGRESS, READY or CANCELLED
        #[arg(value_parser = parse_status)]
        status: OrderStatus,
    },
}

#[derive(clap::Args)]
pub struct OrderListArgs {
    #[arg(long, value_parser = parse_status)]
    pub status: Option<OrderStatus>,
    /// Patient id
    #[arg(long)]
    pub patient: Option<String>,
    /// Patient name contains
    #[arg(short = 'q', long = "query")]
    pub query: Option<String>,
}

#[derive(clap::Args)]
pub struct OrderCreateArgs {
    /// Patient id
    #[arg(long)]
    pub patient: String,
    /// Lab test id; repeat for several tests
    #[arg(long = "test", required = true)]
    pub tests: Vec<String>,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current config
    Show,
    /// Set config value
    Set(ConfigSetArgs),
}

#[derive(clap::Args)]
pub struct ConfigSetArgs {
    /// Key to set (server, format)
    pub key: String,
    /// Value
    pub value: String,
}

/// Accepts `in_progress`, `in-progress` and `IN_PROGRESS` alike.
pub fn parse_status(value: &str) -> Result<OrderStatus, String> {
    value
        .trim()
        .to_ascii_uppercase()
        .replace('-', "_")
        .parse()
        .map_err(|_| {
            format!(
                "invalid status '{value}', expected DRAFT, SUBMITTED, IN_PROGRESS, READY \
                 or CANCELLED"
            )
        })
}
