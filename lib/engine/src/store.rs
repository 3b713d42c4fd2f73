use crate::{ExecutionError, LocalStoreState, StoreError};
use flate2::read::GzDecoder;
use oxigraph::io::{RdfFormat, RdfParser, RdfSerializer};
use oxigraph::sparql::{Query, QueryResults};
use oxigraph::store::Store;
use rand::Rng;
use shmarql_model::{ResultPayload, Row, Term};
use std::{fmt, fs};
use std::fs::{File, OpenOptions, TryLockError};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

const LOCK_FILE: &str = "shmarql.lock";
const SNAPSHOT_FILE: &str = "store.nq";
const SNAPSHOT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How the embedded store is set up at start-up.
#[derive(Clone, Debug)]
pub struct StoreOptions {
    /// Directory shared by all worker processes. Without it the store lives only in memory.
    pub path: Option<PathBuf>,
    /// Files, directories or http(s) URLs to load into a fresh store.
    pub data_load_paths: Vec<String>,
    /// Upper bound of the random delay before claiming ownership of `path`.
    pub max_jitter: Duration,
    /// How long a secondary waits for the primary to publish its snapshot.
    pub snapshot_wait: Duration,
    pub download_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            path: None,
            data_load_paths: Vec::new(),
            max_jitter: Duration::from_millis(500),
            snapshot_wait: Duration::from_secs(60),
            download_timeout: Duration::from_secs(180),
        }
    }
}

/// Whether this process owns the store directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreRole {
    /// Loads the data and publishes the snapshot.
    Primary,
    /// Only reads the snapshot published by the primary.
    Secondary,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed,
}

/// The embedded triple store used when no remote endpoint is configured.
///
/// Loading happens in the background. Until it is done the store reports
/// [`LoadState::Loading`] and is still routable.
pub struct LocalStore {
    store: Store,
    role: StoreRole,
    state: watch::Receiver<LoadState>,
    _lock: Option<OwnershipLock>,
}

impl LocalStore {
    /// An empty in-memory store that is ready to be filled by the caller.
    pub fn in_memory() -> Result<Self, StoreError> {
        let (_, state) = watch::channel(LoadState::Ready);
        Ok(Self {
            store: Store::new()?,
            role: StoreRole::Primary,
            state,
            _lock: None,
        })
    }

    /// Creates the store and starts loading its data in the background.
    pub async fn open(options: StoreOptions) -> Result<Self, StoreError> {
        let store = Store::new()?;
        let (role, lock) = match &options.path {
            None => (StoreRole::Primary, None),
            Some(path) => claim_ownership(path, options.max_jitter).await?,
        };
        info!(?role, path = ?options.path, "Opening local store");

        let (sender, state) = watch::channel(LoadState::Loading);
        let loading_store = store.clone();
        tokio::spawn(async move {
            let result = match role {
                StoreRole::Primary => load_as_primary(&loading_store, &options).await,
                StoreRole::Secondary => load_as_secondary(&loading_store, &options).await,
            };
            let state = match result {
                Ok(()) => LoadState::Ready,
                Err(error) => {
                    warn!(%error, "Loading the local store failed");
                    LoadState::Failed
                }
            };
            let _ = sender.send(state);
        });

        Ok(Self {
            store,
            role,
            state,
            _lock: lock,
        })
    }

    pub fn role(&self) -> StoreRole {
        self.role
    }

    pub fn load_state(&self) -> LoadState {
        *self.state.borrow()
    }

    /// Waits until the background load has finished.
    pub async fn wait_until_loaded(&self) -> LoadState {
        let mut state = self.state.clone();
        let loaded = match state.wait_for(|state| *state != LoadState::Loading).await {
            Ok(state) => *state,
            Err(_) => LoadState::Failed,
        };
        loaded
    }

    /// The number of quads in the store.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.store.len()?)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.store.is_empty()?)
    }

    /// What the resolver needs to know about this store.
    pub fn routing_state(&self) -> LocalStoreState {
        if self.load_state() == LoadState::Loading {
            return LocalStoreState::Loading;
        }
        match self.len() {
            Ok(triples) => LocalStoreState::Ready { triples },
            Err(error) => {
                warn!(%error, "Could not count the local store");
                LocalStoreState::Unavailable
            }
        }
    }

    /// Loads RDF data in `format` into the store.
    pub fn load(&self, format: RdfFormat, reader: impl Read) -> Result<(), StoreError> {
        load_reader(&self.store, format, reader)
    }

    /// Loads a file, a directory or a URL as during start-up.
    pub async fn load_path(&self, path: &str, download_timeout: Duration) -> Result<(), StoreError> {
        load_data_path(&self.store, path, download_timeout).await
    }

    /// Evaluates `query` with the union of all graphs as default graph.
    pub fn query(&self, query: &str) -> Result<ResultPayload, ExecutionError> {
        evaluate(&self.store, query)
    }
}

fn evaluate(store: &Store, query: &str) -> Result<ResultPayload, ExecutionError> {
    let mut query =
        Query::parse(query, None).map_err(|error| ExecutionError::Local(error.to_string()))?;
    query.dataset_mut().set_default_graph_as_union();
    let results = store
        .query(query)
        .map_err(|error| ExecutionError::Local(error.to_string()))?;
    match results {
        QueryResults::Solutions(solutions) => {
            let vars = solutions
                .variables()
                .iter()
                .map(|variable| variable.as_str().to_owned())
                .collect();
            let mut rows = Vec::new();
            for solution in solutions {
                let solution = solution.map_err(|error| ExecutionError::Local(error.to_string()))?;
                let row: Row = solution
                    .iter()
                    .map(|(variable, term)| (variable.as_str().to_owned(), Term::from(term)))
                    .collect();
                rows.push(row);
            }
            Ok(ResultPayload::solutions(vars, rows))
        }
        QueryResults::Boolean(value) => Ok(ResultPayload::boolean(value)),
        QueryResults::Graph(triples) => {
            let mut serializer = RdfSerializer::from_format(RdfFormat::NTriples).for_writer(Vec::new());
            for triple in triples {
                let triple = triple.map_err(|error| ExecutionError::Local(error.to_string()))?;
                serializer
                    .serialize_triple(&triple)
                    .map_err(|error| ExecutionError::Local(error.to_string()))?;
            }
            let data = serializer
                .finish()
                .map_err(|error| ExecutionError::Local(error.to_string()))?;
            Ok(ResultPayload::graph(String::from_utf8_lossy(&data)))
        }
    }
}

impl fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalStore")
            .field("role", &self.role)
            .field("state", &self.load_state())
            .finish_non_exhaustive()
    }
}

/// An exclusive lock on `shmarql.lock`, released by the OS when the file is closed or the
/// process dies. The file itself stays behind.
#[derive(Debug)]
struct OwnershipLock {
    _file: File,
}

async fn claim_ownership(
    directory: &Path,
    max_jitter: Duration,
) -> Result<(StoreRole, Option<OwnershipLock>), StoreError> {
    tokio::fs::create_dir_all(directory).await?;
    let jitter = if max_jitter.is_zero() {
        Duration::ZERO
    } else {
        rand::rng().random_range(Duration::ZERO..max_jitter)
    };
    tokio::time::sleep(jitter).await;

    let path = directory.join(LOCK_FILE);
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)?;
    match file.try_lock() {
        Ok(()) => {
            file.set_len(0)?;
            writeln!(file, "{}", std::process::id())?;
            Ok((StoreRole::Primary, Some(OwnershipLock { _file: file })))
        }
        Err(TryLockError::WouldBlock) => {
            debug!(path = %path.display(), "Store is owned by another process");
            Ok((StoreRole::Secondary, None))
        }
        Err(TryLockError::Error(error)) => Err(error.into()),
    }
}

async fn load_as_primary(store: &Store, options: &StoreOptions) -> Result<(), StoreError> {
    let snapshot = options.path.as_ref().map(|path| path.join(SNAPSHOT_FILE));
    if let Some(snapshot) = snapshot.as_ref().filter(|snapshot| snapshot.exists()) {
        if options.data_load_paths.is_empty() {
            info!(path = %snapshot.display(), "Reusing store snapshot");
            return load_file(store, snapshot.clone()).await;
        }
        // Secondaries must not pick up the snapshot of an older load.
        fs::remove_file(snapshot)?;
    }

    for path in &options.data_load_paths {
        if let Err(error) = load_data_path(store, path, options.download_timeout).await {
            warn!(%error, path = %path, "Could not load data");
        }
    }
    info!(quads = store.len()?, "Loaded local store");

    if let Some(snapshot) = snapshot {
        publish_snapshot(store.clone(), snapshot).await?;
    }
    Ok(())
}

async fn load_as_secondary(store: &Store, options: &StoreOptions) -> Result<(), StoreError> {
    let Some(snapshot) = options.path.as_ref().map(|path| path.join(SNAPSHOT_FILE)) else {
        return Ok(());
    };
    let deadline = tokio::time::Instant::now() + options.snapshot_wait;
    while !snapshot.exists() {
        if tokio::time::Instant::now() >= deadline {
            warn!(path = %snapshot.display(), "No store snapshot was published in time");
            return Ok(());
        }
        tokio::time::sleep(SNAPSHOT_POLL_INTERVAL).await;
    }
    load_file(store, snapshot).await
}

/// Writes the store as N-Quads next to the lock file. Readers only ever see a complete file.
async fn publish_snapshot(store: Store, snapshot: PathBuf) -> Result<(), StoreError> {
    tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
        let temporary = snapshot.with_extension("nq.tmp");
        let writer = BufWriter::new(File::create(&temporary)?);
        let mut writer = store.dump_to_writer(RdfFormat::NQuads, writer)?;
        writer.flush()?;
        fs::rename(&temporary, &snapshot)?;
        debug!(path = %snapshot.display(), "Published store snapshot");
        Ok(())
    })
    .await?
}

async fn load_data_path(store: &Store, path: &str, download_timeout: Duration) -> Result<(), StoreError> {
    if path.starts_with("http://") || path.starts_with("https://") {
        return load_url(store, path, download_timeout).await;
    }
    let root = PathBuf::from(path);
    let store = store.clone();
    tokio::task::spawn_blocking(move || load_tree(&store, &root)).await?
}

async fn load_url(store: &Store, url: &str, timeout: Duration) -> Result<(), StoreError> {
    let download_error = |error| StoreError::Download {
        url: url.to_owned(),
        error,
    };
    info!(url, "Downloading data");
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(download_error)?;
    let response = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(download_error)?;
    let body = response.bytes().await.map_err(download_error)?;

    let (format, compressed) = guess_format(url).unwrap_or((RdfFormat::Turtle, false));
    let store = store.clone();
    tokio::task::spawn_blocking(move || {
        let reader: Box<dyn Read + '_> = if compressed {
            Box::new(GzDecoder::new(body.as_ref()))
        } else {
            Box::new(body.as_ref())
        };
        load_reader(&store, format, reader)
    })
    .await?
}

/// Loads a file, or every RDF file below a directory. Unreadable files are logged and skipped.
fn load_tree(store: &Store, path: &Path) -> Result<(), StoreError> {
    if !path.is_dir() {
        return load_file_blocking(store, path);
    }
    let mut entries: Vec<PathBuf> = fs::read_dir(path)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .collect();
    entries.sort();
    for entry in entries {
        let is_rdf_file = entry
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| guess_format(name).is_some());
        if !entry.is_dir() && !is_rdf_file {
            continue;
        }
        if let Err(error) = load_tree(store, &entry) {
            warn!(%error, path = %entry.display(), "Skipping unreadable data");
        }
    }
    Ok(())
}

async fn load_file(store: &Store, path: PathBuf) -> Result<(), StoreError> {
    let store = store.clone();
    tokio::task::spawn_blocking(move || load_file_blocking(&store, &path)).await?
}

fn load_file_blocking(store: &Store, path: &Path) -> Result<(), StoreError> {
    let name = path.to_string_lossy();
    let (format, compressed) =
        guess_format(&name).ok_or_else(|| StoreError::UnknownFormat(name.clone().into_owned()))?;
    debug!(path = %name, ?format, "Loading data file");
    let file = BufReader::new(File::open(path)?);
    let reader: Box<dyn Read> = if compressed {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    load_reader(store, format, reader)
}

fn load_reader(store: &Store, format: RdfFormat, reader: impl Read) -> Result<(), StoreError> {
    store.load_from_reader(RdfParser::from_format(format), reader)?;
    Ok(())
}

/// Guesses the RDF format from a file name or URL, and whether it is gzip compressed.
pub fn guess_format(name: &str) -> Option<(RdfFormat, bool)> {
    let name = name.to_ascii_lowercase();
    let (name, compressed) = match name.strip_suffix(".gz") {
        Some(name) => (name, true),
        None => (name.as_str(), false),
    };
    let extension = Path::new(name).extension()?.to_str()?;
    let format = match extension {
        "ttl" => RdfFormat::Turtle,
        "nt" => RdfFormat::NTriples,
        "nq" => RdfFormat::NQuads,
        "trig" => RdfFormat::TriG,
        "n3" => RdfFormat::N3,
        "rdf" | "xml" | "owl" => RdfFormat::RdfXml,
        _ => return None,
    };
    Some((format, compressed))
}
