use chrono::{DateTime, NaiveDateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::error::BackupError;
use crate::models::forecast::CityForecastBundle;

/// City name (exact, case-sensitive) -> last known good forecast
pub type BackupIndex = BTreeMap<String, CityForecastBundle>;

const DT_TXT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Read the backup file. A missing or corrupt file yields an empty index.
pub fn load_index(path: &Path) -> BackupIndex {
    if !path.exists() {
        info!("Backup file {} not found, starting with an empty backup", path.display());
        return BackupIndex::new();
    }

    let data = match std::fs::read_to_string(path) {
        Ok(d) => d,
        Err(e) => {
            warn!("Failed to read backup file {}: {}", path.display(), e);
            return BackupIndex::new();
        }
    };

    match serde_json::from_str::<BackupIndex>(&data) {
        Ok(index) => {
            debug!("Loaded {} cities from backup {}", index.len(), path.display());
            index
        }
        Err(e) => {
            warn!("Backup file {} is corrupt, ignoring it: {}", path.display(), e);
            BackupIndex::new()
        }
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Overwrite the backup file with the full index.
///
/// Writes to a sibling temp file and renames it over the target so readers
/// never observe a partially written file.
pub fn save_index(path: &Path, index: &BackupIndex) -> Result<(), BackupError> {
    let io_err = |source| BackupError::Io {
        path: path.display().to_string(),
        source,
    };

    let data = serde_json::to_string_pretty(index)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let tmp = temp_path(path);
    std::fs::write(&tmp, data).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)?;

    info!("Backup file {} updated ({} cities)", path.display(), index.len());
    Ok(())
}

/// Stored forecast for `city`. Entries that are not usable (an error `cod`
/// or no slots, e.g. from a hand-edited file) count as missing.
pub fn get<'a>(index: &'a BackupIndex, city: &str) -> Option<&'a CityForecastBundle> {
    index.get(city).filter(|bundle| bundle.is_usable())
}

/// Store a bundle for `city`. Error bundles and empty forecasts are refused.
pub fn put(index: &mut BackupIndex, city: &str, bundle: CityForecastBundle) -> bool {
    if !bundle.is_usable() {
        debug!("Not backing up unusable forecast for {} (cod={})", city, bundle.cod);
        return false;
    }
    index.insert(city.to_string(), bundle);
    true
}

pub fn remove(index: &mut BackupIndex, city: &str) -> Option<CityForecastBundle> {
    index.remove(city)
}

fn slot_time(dt_txt: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(dt_txt, DT_TXT_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Drop forecast slots at or before `reference`.
///
/// Slot times come from `dt_txt`, read as UTC. Slots whose text cannot be
/// parsed are dropped as well.
pub fn prune_expired(bundle: &CityForecastBundle, reference: DateTime<Utc>) -> CityForecastBundle {
    let kept = bundle
        .list
        .iter()
        .filter(|r| slot_time(&r.dt_txt).is_some_and(|t| t > reference))
        .cloned()
        .collect();
    bundle.with_records(kept)
}

/// Prune one city in place, removing it when no slots remain.
/// Returns true if the index changed.
pub fn prune_city(index: &mut BackupIndex, city: &str, reference: DateTime<Utc>) -> bool {
    let Some(bundle) = index.get(city) else {
        return false;
    };
    let pruned = prune_expired(bundle, reference);
    if pruned.list.len() == bundle.list.len() {
        return false;
    }
    if pruned.list.is_empty() {
        index.remove(city);
    } else {
        index.insert(city.to_string(), pruned);
    }
    true
}

/// Prune every bundle in the index, removing cities left with no slots.
/// Returns the number of slots removed.
pub fn prune_all(index: &mut BackupIndex, reference: DateTime<Utc>) -> usize {
    let mut removed = 0;
    index.retain(|city, bundle| {
        let pruned = prune_expired(bundle, reference);
        removed += bundle.list.len() - pruned.list.len();
        if pruned.list.is_empty() {
            debug!("Dropping {} from backup, all slots expired", city);
            false
        } else {
            *bundle = pruned;
            true
        }
    });
    removed
}

static PATH_LOCKS: OnceLock<Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>> = OnceLock::new();

fn lock_for(path: &Path) -> Arc<AsyncMutex<()>> {
    let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let registry = PATH_LOCKS.get_or_init(Default::default);
    let mut locks = registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    locks.entry(key).or_default().clone()
}

/// Handle on one backup file.
///
/// Every handle for the same path shares one async mutex. Writers go through
/// [`BackupStore::update`] so changes from different tasks merge.
#[derive(Debug, Clone)]
pub struct BackupStore {
    path: PathBuf,
    lock: Arc<AsyncMutex<()>>,
}

impl BackupStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock = lock_for(&path);
        Self { path, lock }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Hold this while reading, mutating and saving the index
    pub async fn lock(&self) -> OwnedMutexGuard<()> {
        self.lock.clone().lock_owned().await
    }

    pub fn load(&self) -> BackupIndex {
        load_index(&self.path)
    }

    pub fn save(&self, index: &BackupIndex) -> Result<(), BackupError> {
        save_index(&self.path, index)
    }

    /// Re-read the file, apply `change` and save, all under the path lock.
    ///
    /// `change` returns whether it modified the index; nothing is written
    /// otherwise. Returns the same flag.
    pub async fn update<F>(&self, change: F) -> Result<bool, BackupError>
    where
        F: FnOnce(&mut BackupIndex) -> bool,
    {
        let _guard = self.lock().await;
        let mut index = self.load();
        if !change(&mut index) {
            return Ok(false);
        }
        self.save(&index)?;
        Ok(true)
    }
}
