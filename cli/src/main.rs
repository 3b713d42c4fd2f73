use crate::cli::{Args, Command, GatewayArgs};
use anyhow::{bail, Context};
use clap::Parser;
use shmarql::engine::LoadState;
use shmarql::model::QueryResult;
use shmarql::results::{serialize, ResultFormat};
use shmarql::{Gateway, GatewayConfig};
use shmarql_web::ServerConfig;
use std::io::{self, stdin, stdout, Read, Write};
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let matches = Args::parse();
    init_logging(matches.debug);

    let config = gateway_config(matches.gateway);
    match matches.command {
        Command::Serve {
            bind,
            no_query_ui,
            query_ui,
        } => {
            let gateway = Gateway::from_config(config).await?;
            shmarql_web::serve(ServerConfig {
                gateway,
                bind,
                query_ui: query_ui && !no_query_ui,
            })
            .await
        }
        Command::Query { format, query } => {
            let query = match query {
                Some(query) if query != "-" => query,
                _ => {
                    let mut query = String::new();
                    stdin()
                        .lock()
                        .read_to_string(&mut query)
                        .context("Could not read the query from stdin")?;
                    query
                }
            };
            let gateway = Gateway::from_config(config).await?;
            run_query(&gateway, &query, format).await
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn gateway_config(args: GatewayArgs) -> GatewayConfig {
    GatewayConfig {
        endpoint: args.endpoint.filter(|endpoint| !endpoint.is_empty()),
        endpoints: args.endpoints,
        endpoint_names: args.endpoint_names,
        store_path: args.store_path,
        data_load_paths: args
            .data_load_paths
            .into_iter()
            .filter(|path| !path.is_empty())
            .collect(),
        queries_db: Some(args.queries_db),
        fts_filepath: args.fts_filepath,
        vector_search_url: args.vector_search_url,
        prefixes_file: args.prefixes_file,
        cache_scope: args.cache_scope,
        timeout: Duration::from_secs(args.timeout),
    }
}

async fn run_query(gateway: &Gateway, query: &str, format: ResultFormat) -> anyhow::Result<()> {
    if let Some(store) = gateway.local_store() {
        if store.wait_until_loaded().await == LoadState::Failed {
            warn!("The local store could not be loaded");
        }
    }

    let result = gateway.query(query).await;
    if let QueryResult::Failure(failure) = &result {
        bail!("{}", failure.error)
    }
    let serialized = serialize(&result, format)?;
    let mut stdout = stdout().lock();
    stdout.write_all(&serialized.body)?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use assert_cmd::Command;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use predicates::prelude::*;
    use std::path::Path;

    const ENV_VARS: [&str; 14] = [
        "ENDPOINT",
        "ENDPOINTS",
        "ENDPOINTS_NAMES",
        "STORE_PATH",
        "DATA_LOAD_PATHS",
        "QUERIES_DB",
        "FTS_FILEPATH",
        "VECTOR_SEARCH_URL",
        "PREFIXES_FILEPATH",
        "CACHE_SCOPE",
        "QUERY_TIMEOUT",
        "SPARQL_QUERY_UI",
        "BIND",
        "DEBUG",
    ];

    fn cli_command() -> Command {
        let mut command = Command::new(env!("CARGO"));
        command.arg("run").arg("--bin").arg("shmarql").arg("--");
        for var in ENV_VARS {
            command.env_remove(var);
        }
        command
    }

    fn data_dir() -> Result<TempDir> {
        let dir = TempDir::new()?;
        dir.child("people.ttl").write_str(
            "@prefix schema: <http://schema.org/> .\n\
             <http://example.com/ann> schema:name \"Ann\" .\n\
             <http://example.com/bob> schema:name \"Bob\" .\n",
        )?;
        Ok(dir)
    }

    #[test]
    fn cli_help() {
        cli_command()
            .assert()
            .failure()
            .stdout("")
            .stderr(predicate::str::contains("shmarql"));
    }

    #[test]
    fn cli_query_local_data_as_csv() -> Result<()> {
        let dir = data_dir()?;
        cli_command()
            .arg("query")
            .arg("--data-load-paths")
            .arg(dir.child("people.ttl").path())
            .arg("--queries-db")
            .arg(dir.child("queries.db").path())
            .arg("--format")
            .arg("csv")
            .arg("SELECT ?name WHERE { ?s schema:name ?name } ORDER BY ?name")
            .assert()
            .success()
            .stdout("name\r\nAnn\r\nBob\r\n");
        Ok(())
    }

    #[test]
    fn cli_query_from_stdin() -> Result<()> {
        let dir = data_dir()?;
        cli_command()
            .arg("query")
            .arg("--data-load-paths")
            .arg(dir.child("people.ttl").path())
            .arg("--queries-db")
            .arg(dir.child("queries.db").path())
            .arg("--format")
            .arg("csv")
            .arg("-")
            .write_stdin("ASK { ?s <http://schema.org/name> \"Bob\" }")
            .assert()
            .success()
            .stdout("boolean\r\ntrue\r\n");
        Ok(())
    }

    #[test]
    fn cli_query_settings_from_env() -> Result<()> {
        let dir = data_dir()?;
        cli_command()
            .env("DATA_LOAD_PATHS", dir.child("people.ttl").path())
            .env("QUERIES_DB", dir.child("queries.db").path())
            .arg("query")
            .arg("--format")
            .arg("json")
            .arg("SELECT (COUNT(*) AS ?count) WHERE { ?s ?p ?o }")
            .assert()
            .success()
            .stdout(predicate::str::contains("\"count\""));
        Ok(())
    }

    #[test]
    fn cli_query_without_endpoint_fails() -> Result<()> {
        let dir = TempDir::new()?;
        cli_command()
            .arg("query")
            .arg("--queries-db")
            .arg(dir.child("queries.db").path())
            .arg("SELECT * WHERE { ?s ?p ?o }")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No endpoint found"));
        Ok(())
    }

    #[test]
    fn cli_mismatched_endpoint_names() -> Result<()> {
        let dir = TempDir::new()?;
        cli_command()
            .arg("query")
            .arg("--queries-db")
            .arg(dir.child("queries.db").path())
            .arg("--endpoints")
            .arg("http://a.example/sparql http://b.example/sparql")
            .arg("--endpoint-names")
            .arg("a")
            .arg("ASK {}")
            .assert()
            .failure()
            .stderr(predicate::str::contains("1 endpoint names were given for 2 endpoint URLs"));
        Ok(())
    }

    #[test]
    fn cli_unknown_format() {
        cli_command()
            .arg("query")
            .arg("--format")
            .arg("yaml")
            .arg("ASK {}")
            .assert()
            .failure()
            .stderr(predicate::str::contains("yaml"));
    }

    #[test]
    fn empty_endpoint_is_no_default() {
        let args = Args::parse_from(["shmarql", "--endpoint", "", "query", "ASK {}"]);
        let config = gateway_config(args.gateway);
        assert_eq!(config.endpoint, None);
        assert_eq!(config.queries_db.as_deref(), Some(Path::new("queries.db")));
    }

    #[test]
    fn space_separated_endpoint_lists() {
        let args = Args::parse_from([
            "shmarql",
            "--endpoints",
            "http://a/sparql http://b/sparql",
            "--endpoint-names",
            "a b",
            "serve",
        ]);
        assert_eq!(args.gateway.endpoints, ["http://a/sparql", "http://b/sparql"]);
        assert_eq!(args.gateway.endpoint_names, ["a", "b"]);
    }

    #[test]
    fn no_query_ui_flag() {
        let args = Args::parse_from(["shmarql", "serve", "--no-query-ui"]);
        let crate::cli::Command::Serve {
            bind,
            no_query_ui,
            query_ui,
        } = args.command
        else {
            panic!("expected the serve subcommand");
        };
        assert_eq!(bind, "localhost:5001");
        assert!(no_query_ui);
        assert!(query_ui);
    }

    #[test]
    fn clap_debug() {
        use clap::CommandFactory;

        Args::command().debug_assert()
    }
}
