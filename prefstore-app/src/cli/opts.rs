use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, ValueEnum)]
pub enum ScopeKind {
    App,
    User,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum TargetKind {
    Roaming,
    Local,
    Config,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum SerializeKind {
    String,
    Xml,
    Binary,
    ProviderSpecific,
}

#[derive(Debug, Parser, Clone)]
#[command(name = "prefstore", version, about = "PrefStore settings CLI")]
pub struct Cli {
    /// Declared company name (else derived from --namespace or the binary)
    #[arg(long)]
    pub company: Option<String>,

    /// Declared product name
    #[arg(long)]
    pub product: Option<String>,

    /// Declared product version (defaults to the 1.0.0.0 sentinel)
    #[arg(long = "app-version")]
    pub app_version: Option<String>,

    /// Dot-separated entry namespace, e.g. Acme.Paint
    #[arg(long)]
    pub namespace: Option<String>,

    /// Application-config store override (same effect as PREFSTORE_CONFIG_FILE)
    #[arg(long)]
    pub config_file: Option<String>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print the resolved identity and planned store paths
    Paths {
        #[arg(long)]
        json: bool,
    },
    /// Resolve declared settings against the stores
    Resolve(ResolveCmd),
    /// Resolve a single setting
    Get(GetCmd),
    /// Write values into one store file
    Set(SetCmd),
    /// Dump one store file's section
    List(ListCmd),
}

#[derive(Debug, Args, Clone)]
pub struct ResolveCmd {
    #[arg(long)]
    pub section: String,
    /// Per-instance settings key; qualifies the section as SECTION.KEY
    #[arg(long)]
    pub key: Option<String>,
    /// Application-scoped descriptor, NAME or NAME=DEFAULT (repeatable)
    #[arg(long = "app")]
    pub app: Vec<String>,
    /// User-scoped descriptor, NAME or NAME=DEFAULT (repeatable)
    #[arg(long = "user")]
    pub user: Vec<String>,
    /// Connection-string descriptor, NAME or NAME=DEFAULT (repeatable)
    #[arg(long = "conn")]
    pub conn: Vec<String>,
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct GetCmd {
    #[arg(long)]
    pub section: String,
    /// Per-instance settings key; qualifies the section as SECTION.KEY
    #[arg(long)]
    pub key: Option<String>,
    #[arg(long)]
    pub name: String,
    #[arg(long, value_enum)]
    pub scope: ScopeKind,
    #[arg(long)]
    pub default: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct SetCmd {
    #[arg(long)]
    pub section: String,
    /// Per-instance settings key; qualifies the section as SECTION.KEY
    #[arg(long)]
    pub key: Option<String>,
    #[arg(long, value_enum)]
    pub target: TargetKind,
    /// NAME=VALUE pairs
    #[arg(required = true)]
    pub values: Vec<String>,
    #[arg(long = "serialize-as", value_enum, default_value = "string")]
    pub serialize_as: SerializeKind,
}

#[derive(Debug, Args, Clone)]
pub struct ListCmd {
    #[arg(long)]
    pub section: String,
    /// Per-instance settings key; qualifies the section as SECTION.KEY
    #[arg(long)]
    pub key: Option<String>,
    #[arg(long, value_enum)]
    pub target: TargetKind,
    #[arg(long)]
    pub json: bool,
}
