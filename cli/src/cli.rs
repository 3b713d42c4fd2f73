use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand, ValueHint};
use shmarql::results::ResultFormat;
use shmarql::CacheScope;
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "shmarql")]
/// SHMARQL command line tool and SPARQL HTTP gateway
pub struct Args {
    #[command(flatten)]
    pub gateway: GatewayArgs,
    /// Log at debug level
    #[arg(long, env = "DEBUG", global = true)]
    pub debug: bool,
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by all subcommands. Each one can also be given as an environment variable.
#[derive(ClapArgs)]
pub struct GatewayArgs {
    /// URL of the default SPARQL endpoint
    #[arg(long, env = "ENDPOINT", global = true, value_hint = ValueHint::Url)]
    pub endpoint: Option<String>,
    /// URLs of the named SPARQL endpoints, separated by spaces
    #[arg(long, env = "ENDPOINTS", global = true, value_delimiter = ' ')]
    pub endpoints: Vec<String>,
    /// Names of the endpoints given with --endpoints, in the same order
    #[arg(long, env = "ENDPOINTS_NAMES", global = true, value_delimiter = ' ')]
    pub endpoint_names: Vec<String>,
    /// Directory of the local store
    ///
    /// Several processes sharing this directory load the data only once.
    #[arg(long, env = "STORE_PATH", global = true, value_hint = ValueHint::DirPath)]
    pub store_path: Option<PathBuf>,
    /// Files, directories or http(s) URLs to load into the local store, separated by spaces
    #[arg(long, env = "DATA_LOAD_PATHS", global = true, value_delimiter = ' ')]
    pub data_load_paths: Vec<String>,
    /// SQLite database of the query cache
    #[arg(long, env = "QUERIES_DB", global = true, default_value = "queries.db", value_hint = ValueHint::FilePath)]
    pub queries_db: PathBuf,
    /// SQLite database of the full-text index
    #[arg(long, env = "FTS_FILEPATH", global = true, value_hint = ValueHint::FilePath)]
    pub fts_filepath: Option<PathBuf>,
    /// URL of the vector search service
    #[arg(long, env = "VECTOR_SEARCH_URL", global = true, value_hint = ValueHint::Url)]
    pub vector_search_url: Option<String>,
    /// JSON file mapping namespace IRIs to prefixes
    #[arg(long, env = "PREFIXES_FILEPATH", global = true, value_hint = ValueHint::FilePath)]
    pub prefixes_file: Option<PathBuf>,
    /// Which cached results may answer a query: "any" or "endpoint"
    #[arg(long, env = "CACHE_SCOPE", global = true, default_value = "any")]
    pub cache_scope: CacheScope,
    /// Timeout of remote queries in seconds
    #[arg(long, env = "QUERY_TIMEOUT", global = true, default_value_t = 180)]
    pub timeout: u64,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the SPARQL HTTP gateway
    Serve {
        /// Host and port to listen to
        #[arg(short, long, env = "BIND", default_value = "localhost:5001", value_hint = ValueHint::Hostname)]
        bind: String,
        /// Disable the interactive query form
        #[arg(long)]
        no_query_ui: bool,
        #[arg(
            long,
            env = "SPARQL_QUERY_UI",
            hide = true,
            action = ArgAction::Set,
            value_parser = BoolishValueParser::new(),
            default_value = "true"
        )]
        query_ui: bool,
    },
    /// Run a single query through the gateway and print its results
    Query {
        /// The results format, a name like "csv" or a media type
        #[arg(short, long, default_value = "json")]
        format: ResultFormat,
        /// The query to run
        ///
        /// If no query is given, or it is "-", stdin is read.
        query: Option<String>,
    },
}
