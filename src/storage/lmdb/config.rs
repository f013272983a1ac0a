// storage/lmdb/config.rs

use log::debug;
use lmdb_rkv::{EnvironmentFlags, DatabaseFlags};
use crate::config::subsystems::storage::StorageConfig;

// Default sizes for memory allocation
pub const DEFAULT_MAP_SIZE: usize = 10 * 1024 * 1024 * 1024;  // 10GB default map size
pub const DEFAULT_MAX_READERS: u32 = 126;
pub const DEFAULT_MAX_DBS: u32 = 16;

/// Longest key LMDB accepts with its default page size
pub const MAX_KEY_SIZE: usize = 511;

// Default flags
pub fn default_env_flags() -> EnvironmentFlags {
    EnvironmentFlags::NO_TLS |
    EnvironmentFlags::NO_READAHEAD
}

// Create default environment options
pub fn create_env_options(config: &StorageConfig) -> (EnvironmentFlags, u32, u32, usize) {
    let mut flags = default_env_flags();

    if !config.use_fsync {
        flags |= EnvironmentFlags::NO_SYNC;
    }

    let max_readers = config.lmdb_max_readers.unwrap_or(DEFAULT_MAX_READERS);
    let max_dbs = config.lmdb_max_dbs.unwrap_or(DEFAULT_MAX_DBS);
    let map_size = config.lmdb_map_size_mb.unwrap_or(DEFAULT_MAP_SIZE / (1024 * 1024)) * 1024 * 1024;

    debug!("Created LMDB environment options:");
    debug!("  Flags: {:?}", flags);
    debug!("  Max readers: {}", max_readers);
    debug!("  Max DBs: {}", max_dbs);
    debug!("  Map size: {} bytes", map_size);

    (flags, max_readers, max_dbs, map_size)
}

// Every named database holds unique keys; posting sets live in the value
pub fn db_flags() -> DatabaseFlags {
    DatabaseFlags::empty()
}

/// Whether `key` can be stored or looked up at all
pub fn is_storable_key(key: &[u8]) -> bool {
    !key.is_empty() && key.len() <= MAX_KEY_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fsync_controls_no_sync_flag() {
        let mut config = StorageConfig::default();
        config.use_fsync = false;
        let (flags, _, _, _) = create_env_options(&config);
        assert!(flags.contains(EnvironmentFlags::NO_SYNC));

        config.use_fsync = true;
        let (flags, _, _, map_size) = create_env_options(&config);
        assert!(!flags.contains(EnvironmentFlags::NO_SYNC));
        assert!(flags.contains(EnvironmentFlags::NO_TLS));
        assert_eq!(map_size, 10240 * 1024 * 1024);
    }

    #[test]
    fn key_size_limits() {
        assert!(!is_storable_key(b""));
        assert!(is_storable_key(&[b'a'; MAX_KEY_SIZE]));
        assert!(!is_storable_key(&[b'a'; MAX_KEY_SIZE + 1]));
    }
}
