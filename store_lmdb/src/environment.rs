//! LMDB environment setup.

use std::path::Path;

use heed::types::Str;
use heed::{Database, Env, EnvOpenOptions};

use crate::LmdbError;

/// Name of the database holding one persisted history per network.
pub(crate) const STORED_HISTORY_DB: &str = "stored_history";

/// Default map size: stored histories are tiny, 64 MiB is plenty.
pub const DEFAULT_MAP_SIZE: usize = 64 * 1024 * 1024;

/// Wraps the LMDB environment and the database handles.
#[derive(Clone)]
pub struct LmdbEnvironment {
    pub(crate) env: Env,
    pub(crate) stored_history_db: Database<Str, Str>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given directory.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per directory by this process
        // and never memory-mapped elsewhere.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(1)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let stored_history_db = env.create_database(&mut wtxn, Some(STORED_HISTORY_DB))?;
        wtxn.commit()?;

        tracing::debug!(path = %path.display(), "opened LMDB environment");

        Ok(Self {
            env,
            stored_history_db,
        })
    }
}
