use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use tracing::debug;

use crate::snowflake::Snowflake;

/// Servers with an archive run in progress.
#[derive(Default)]
pub struct GuildLocks {
    running: Mutex<HashSet<Snowflake>>,
}

/// Held for the whole run, the server is released when this drops.
#[must_use]
pub struct GuildLock<'a> {
    locks: &'a GuildLocks,
    guild_id: Snowflake,
}

impl GuildLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns None if the server already has a run in progress, never waits.
    pub fn try_acquire(&self, guild_id: Snowflake) -> Option<GuildLock<'_>> {
        if self.running().insert(guild_id) {
            debug!(%guild_id, "acquired guild lock");
            Some(GuildLock { locks: self, guild_id })
        } else {
            None
        }
    }

    #[cfg(test)]
    pub fn is_running(&self, guild_id: Snowflake) -> bool {
        self.running().contains(&guild_id)
    }

    fn release(&self, guild_id: Snowflake) {
        self.running().remove(&guild_id);
        debug!(%guild_id, "released guild lock");
    }

    // the set stays consistent even if a holder panicked
    fn running(&self) -> MutexGuard<'_, HashSet<Snowflake>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl GuildLock<'_> {
    pub fn guild_id(&self) -> Snowflake {
        self.guild_id
    }
}

impl Drop for GuildLock<'_> {
    fn drop(&mut self) {
        self.locks.release(self.guild_id);
    }
}
