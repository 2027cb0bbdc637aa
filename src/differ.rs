//! Three-way classification of two fingerprint maps.

use crate::storage::{ComparisonResult, EntryMap};

pub struct Differ;

impl Differ {
    /// Classify every path of `previous` and `current` as added, changed, or deleted.
    ///
    /// `current` is updated in place so its versions are final: new paths keep
    /// version 1, changed paths get the previous version plus one, unchanged
    /// paths carry the previous version forward. Output lists are sorted by path.
    pub fn compare(previous: &EntryMap, current: &mut EntryMap) -> ComparisonResult {
        let mut result = ComparisonResult::default();

        for (path, entry) in current.iter_mut() {
            match previous.get(path) {
                None => {
                    entry.version = 1;
                    result.added.push(path.clone());
                }
                Some(old) if old.digest != entry.digest => {
                    entry.version = old.version + 1;
                    result.changed.push(path.clone());
                }
                Some(old) => {
                    entry.version = old.version;
                }
            }
        }

        result.deleted = previous
            .keys()
            .filter(|path| !current.contains_key(*path))
            .cloned()
            .collect();

        result
    }
}
