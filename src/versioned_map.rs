use crate::error::TenancyError;
use std::collections::BTreeMap;
use std::ops::RangeBounds;

/// Multi-version map. Every mutation appends a `(version, value)` pair to
/// the key's history; a read pins to a version and observes the latest
/// entry at or before it. Tombstones are versioned too, so deletions stay
/// invisible to older snapshots until the GC boundary passes them.
#[derive(Debug, Clone)]
pub struct VersionedMap<K, V> {
    entries: BTreeMap<K, Vec<(u64, Option<V>)>>,
    oldest_readable: u64,
    latest_written: u64,
}

impl<K: Ord + Clone, V: Clone> Default for VersionedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone, V: Clone> VersionedMap<K, V> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            oldest_readable: 0,
            latest_written: 0,
        }
    }

    pub fn latest_version(&self) -> u64 {
        self.latest_written
    }

    pub fn oldest_readable_version(&self) -> u64 {
        self.oldest_readable
    }

    pub fn insert_at(&mut self, key: K, value: V, version: u64) {
        self.record(key, Some(value), version);
    }

    pub fn erase_at(&mut self, key: K, version: u64) {
        self.record(key, None, version);
    }

    fn record(&mut self, key: K, value: Option<V>, version: u64) {
        assert!(
            version >= self.latest_written,
            "commit versions must be monotonic: {version} < {}",
            self.latest_written
        );
        self.latest_written = version;
        let history = self.entries.entry(key).or_default();
        match history.last_mut() {
            Some(last) if last.0 == version => last.1 = value,
            _ => history.push((version, value)),
        }
    }

    /// Point lookup as of `version`. Absent if the key was never written at
    /// or before `version`, or its latest entry there is a tombstone.
    pub fn get_at(&self, key: &K, version: u64) -> Result<Option<&V>, TenancyError> {
        self.check_readable(version)?;
        Ok(self
            .entries
            .get(key)
            .and_then(|history| visible(history, version)))
    }

    /// Live entries in key order as of `version`.
    pub fn iter_at(
        &self,
        version: u64,
    ) -> Result<impl Iterator<Item = (&K, &V)> + '_, TenancyError> {
        self.check_readable(version)?;
        Ok(self
            .entries
            .iter()
            .filter_map(move |(key, history)| visible(history, version).map(|v| (key, v))))
    }

    /// Live entries within `range`, in key order as of `version`.
    pub fn range_at<R>(
        &self,
        range: R,
        version: u64,
    ) -> Result<impl DoubleEndedIterator<Item = (&K, &V)> + '_, TenancyError>
    where
        R: RangeBounds<K>,
    {
        self.check_readable(version)?;
        Ok(self
            .entries
            .range(range)
            .filter_map(move |(key, history)| visible(history, version).map(|v| (key, v))))
    }

    /// Advances the oldest readable version and trims history. Each key
    /// keeps the entry visible at the boundary as its new base plus all
    /// newer entries; keys reduced to a lone stale tombstone are dropped.
    pub fn forget_versions_before(&mut self, version: u64) {
        if version <= self.oldest_readable {
            return;
        }
        self.oldest_readable = version;
        self.entries.retain(|_, history| {
            let visible_count = history.partition_point(|(v, _)| *v <= version);
            history.drain(..visible_count.saturating_sub(1));
            !(history.len() == 1 && history[0].0 <= version && history[0].1.is_none())
        });
    }

    fn check_readable(&self, version: u64) -> Result<(), TenancyError> {
        if version < self.oldest_readable {
            return Err(TenancyError::VersionTooOld {
                requested: version,
                oldest_readable: self.oldest_readable,
            });
        }
        Ok(())
    }
}

fn visible<V>(history: &[(u64, Option<V>)], version: u64) -> Option<&V> {
    let idx = history.partition_point(|(v, _)| *v <= version);
    if idx == 0 {
        None
    } else {
        history[idx - 1].1.as_ref()
    }
}

/// Monotonic allocator whose value is committed, versioned state rather
/// than a process-local integer: reads pin to a version, and history obeys
/// the same GC boundary as the maps it commits alongside. Aborted work that
/// never commits a version never consumes an id.
#[derive(Debug, Clone)]
pub struct VersionedCounter {
    /// `(version, next id to hand out)`, version-ascending, never empty.
    history: Vec<(u64, i64)>,
    oldest_readable: u64,
}

impl VersionedCounter {
    pub fn new(first_id: i64) -> Self {
        Self {
            history: vec![(0, first_id)],
            oldest_readable: 0,
        }
    }

    pub fn latest_version(&self) -> u64 {
        self.history
            .last()
            .expect("counter history is never empty")
            .0
    }

    /// Hands out the next id, recording the increment at `version`.
    pub fn allocate(&mut self, version: u64) -> i64 {
        let (latest, next) = *self.history.last().expect("counter history is never empty");
        assert!(
            version >= latest,
            "commit versions must be monotonic: {version} < {latest}"
        );
        self.history.push((version, next + 1));
        next
    }

    /// The next id that would be handed out, as of `version`.
    pub fn peek_at(&self, version: u64) -> Result<i64, TenancyError> {
        if version < self.oldest_readable {
            return Err(TenancyError::VersionTooOld {
                requested: version,
                oldest_readable: self.oldest_readable,
            });
        }
        let idx = self.history.partition_point(|(v, _)| *v <= version);
        Ok(self.history[idx.saturating_sub(1)].1)
    }

    pub fn forget_versions_before(&mut self, version: u64) {
        if version <= self.oldest_readable {
            return;
        }
        self.oldest_readable = version;
        let visible_count = self.history.partition_point(|(v, _)| *v <= version);
        self.history.drain(..visible_count.saturating_sub(1));
    }
}
