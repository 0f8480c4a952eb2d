//! Persistent per-player win/draw/loss counters
//!
//! The table lives in a flat text file, one `<name> <wins> <draws> <losses>`
//! line per player. It is never kept in memory between operations: every
//! access loads the file, applies its change and writes it back. Inside one
//! server process [`RankingStore`] serializes those cycles behind a mutex;
//! separate processes sharing a file still race with last-writer-wins.
//!
//! Writes truncate the file in place, so a failure halfway through can leave
//! a partial table behind. A file that exists but cannot be read is never
//! written over.

use log::{debug, error, info, warn};
use shared::{Outcome, MAX_NAME_LEN};
use std::borrow::Cow;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;

pub const DEFAULT_CAPACITY: usize = 10;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read rankings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write rankings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    pub name: String,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
}

impl PlayerRecord {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            wins: 0,
            draws: 0,
            losses: 0,
        }
    }

    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.wins = self.wins.saturating_add(1),
            Outcome::Draw => self.draws = self.draws.saturating_add(1),
            Outcome::Loss => self.losses = self.losses.saturating_add(1),
        }
    }

    /// Parses one persisted line; `None` when the line is malformed.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();
        let name = fields.next()?;
        let wins = fields.next()?.parse().ok()?;
        let draws = fields.next()?.parse().ok()?;
        let losses = fields.next()?.parse().ok()?;

        if fields.next().is_some() || name.len() > MAX_NAME_LEN {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            wins,
            draws,
            losses,
        })
    }

    pub fn to_line(&self) -> String {
        format!("{} {} {} {}", self.name, self.wins, self.draws, self.losses)
    }
}

/// Insertion-ordered records with a fixed capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingTable {
    records: Vec<PlayerRecord>,
    capacity: usize,
}

impl RankingTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Vec::new(),
            capacity,
        }
    }

    pub fn records(&self) -> &[PlayerRecord] {
        &self.records
    }

    pub fn get(&self, name: &str) -> Option<&PlayerRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.records.len() >= self.capacity
    }

    /// Adds a record as-is. Returns false when the table is full or the
    /// name is already present.
    pub fn insert(&mut self, record: PlayerRecord) -> bool {
        if self.is_full() || self.get(&record.name).is_some() {
            return false;
        }
        self.records.push(record);
        true
    }

    /// Counts `outcome` for `name`. An unseen name gets a new record while
    /// there is room; once the table is full the update is dropped and
    /// `false` is returned.
    ///
    /// Empty names are never recorded: their line could not be read back.
    pub fn record_outcome(&mut self, name: &str, outcome: Outcome) -> bool {
        if name.is_empty() {
            warn!("Not recording {} for a player without a name", outcome);
            return false;
        }

        if let Some(record) = self.records.iter_mut().find(|r| r.name == name) {
            record.record(outcome);
            return true;
        }

        if self.is_full() {
            warn!(
                "Ranking table full ({} players), not recording {} for {}",
                self.capacity, outcome, name
            );
            return false;
        }

        let mut record = PlayerRecord::new(name);
        record.record(outcome);
        self.records.push(record);
        true
    }
}

/// Loads the table from `path`. A missing file yields an empty table; any
/// other read failure is logged and returned.
///
/// Bytes that are not valid UTF-8 are replaced rather than failing the whole
/// file, so one badly encoded name cannot hide every other record.
pub async fn load(path: &Path, capacity: usize) -> Result<RankingTable, StoreError> {
    let mut table = RankingTable::new(capacity);

    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("No rankings file at {}, starting empty", path.display());
            return Ok(table);
        }
        Err(source) => {
            error!("Failed to read rankings from {}: {}", path.display(), source);
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let contents = String::from_utf8_lossy(&bytes);
    if matches!(contents, Cow::Owned(_)) {
        warn!("Rankings file {} is not valid UTF-8", path.display());
    }

    for (number, line) in contents.lines().enumerate() {
        if table.is_full() {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        match PlayerRecord::parse_line(line) {
            Some(record) => {
                if !table.insert(record) {
                    warn!("Duplicate ranking entry on line {} ignored", number + 1);
                }
            }
            None => warn!(
                "Malformed ranking line {} in {}: {:?}",
                number + 1,
                path.display(),
                line
            ),
        }
    }

    debug!("Loaded {} rankings from {}", table.len(), path.display());
    Ok(table)
}

/// Overwrites `path` with `table`.
pub async fn save(table: &RankingTable, path: &Path) -> Result<(), StoreError> {
    let mut contents = String::new();
    for record in table.records() {
        contents.push_str(&record.to_line());
        contents.push('\n');
    }

    tokio::fs::write(path, contents).await.map_err(|source| {
        error!("Failed to save rankings to {}: {}", path.display(), source);
        StoreError::Write {
            path: path.to_path_buf(),
            source,
        }
    })?;

    debug!("Saved {} rankings to {}", table.len(), path.display());
    Ok(())
}

/// The server's single handle on the rankings file.
pub struct RankingStore {
    path: PathBuf,
    capacity: usize,
    lock: Mutex<()>,
}

impl RankingStore {
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            path: path.into(),
            capacity,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load, count the outcome, save. Returns whether the outcome was kept.
    pub async fn record(&self, name: &str, outcome: Outcome) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;

        let mut table = load(&self.path, self.capacity).await?;
        let recorded = table.record_outcome(name, outcome);
        save(&table, &self.path).await?;

        if recorded {
            info!("Recorded {} for {}", outcome, name);
        }
        Ok(recorded)
    }

    /// A fresh copy of the persisted table, empty if it cannot be read.
    pub async fn snapshot(&self) -> RankingTable {
        let _guard = self.lock.lock().await;
        load(&self.path, self.capacity)
            .await
            .unwrap_or_else(|_| RankingTable::new(self.capacity))
    }

    /// Rewrites the persisted table as currently loaded.
    pub async fn flush(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let table = load(&self.path, self.capacity).await?;
        save(&table, &self.path).await
    }
}
