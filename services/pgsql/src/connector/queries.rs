//! SQL issued against monitored nodes.
//!
//! PostgreSQL 10 renamed every `xlog`/`location` function to `wal`/`lsn`;
//! the right set is picked from `server_version_num`.

/// First release using the `wal`/`lsn` function names.
pub const WAL_RENAME_VERSION: i32 = 100_000;

pub const SERVER_VERSION: &str = "SELECT current_setting('server_version_num')::int4";

pub const SEGMENT_SETTINGS: &str =
  "SELECT name::text, setting, unit FROM pg_settings WHERE name = ANY($1)";

/// Settings read from the primary each round.
pub const SETTING_NAMES: [&str; 4] = [
  "wal_segment_size",
  "wal_block_size",
  "wal_keep_segments",
  "wal_keep_size",
];

/// Version-specific position queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionQueries {
  pub current: &'static str,
  pub recovery: &'static str,
}

impl PositionQueries {
  pub fn for_version(server_version_num: i32) -> Self {
    if server_version_num >= WAL_RENAME_VERSION {
      Self {
        current: "SELECT pg_current_wal_lsn()::text",
        recovery: "SELECT pg_is_in_recovery(), \
                   pg_last_wal_replay_lsn()::text, \
                   pg_last_wal_receive_lsn()::text",
      }
    } else {
      Self {
        current: "SELECT pg_current_xlog_location()::text",
        recovery: "SELECT pg_is_in_recovery(), \
                   pg_last_xlog_replay_location()::text, \
                   pg_last_xlog_receive_location()::text",
      }
    }
  }
}
