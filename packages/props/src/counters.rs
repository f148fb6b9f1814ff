//! UsageCounter - cumulative counters persisted on one node.

use std::collections::BTreeMap;
use std::sync::Mutex;

use cask_repo::{PathAddress, PropertyValue};

use crate::{NodeProperties, PropsResult, Session};

/// Cumulative usage counters stored as `Long` properties of one node.
///
/// `register` is a read-modify-write against the repository; the internal
/// mutex serializes concurrent registrations on this handle so that no
/// increment is lost. Share the handle (for example behind an `Arc`)
/// rather than opening one per thread.
pub struct UsageCounter {
    properties: NodeProperties,
    guard: Mutex<()>,
}

impl UsageCounter {
    /// Open counters over an existing node.
    pub fn open(session: Session, path: PathAddress) -> PropsResult<Self> {
        Ok(UsageCounter {
            properties: NodeProperties::open(session, path)?,
            guard: Mutex::new(()),
        })
    }

    /// Add the deltas to their counters, creating absent counters at 0.
    ///
    /// All deltas of one call are committed together.
    pub fn register(&self, deltas: &[(&str, i64)]) -> PropsResult<()> {
        let _serialized = self.guard.lock().expect("counter lock poisoned");
        let mut updated = BTreeMap::new();
        for (name, delta) in deltas {
            let current = self.properties.get(name, 0i64);
            updated.insert(
                name.to_string(),
                PropertyValue::Long(current.saturating_add(*delta)),
            );
        }
        self.properties.set_properties(updated)?;
        Ok(())
    }

    /// The current value of one counter; 0 when it has never registered.
    pub fn value(&self, name: &str) -> i64 {
        self.properties.get(name, 0i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use cask_repo::{Change, Connection, MemoryRepository, path_addr};

    fn counter(repo: &MemoryRepository) -> UsageCounter {
        let path = path_addr!("/stats");
        let mut conn = repo.connect();
        conn.stage(Change::CreateNode {
            path: path.clone(),
            primary_type: "cask:counters".to_string(),
        })
        .unwrap();
        conn.commit().unwrap();
        UsageCounter::open(Session::owned(Arc::new(repo.clone())), path).unwrap()
    }

    #[test]
    fn register_accumulates() {
        let repo = MemoryRepository::new();
        let c = counter(&repo);
        c.register(&[("tokens", 10), ("chars", 40)]).unwrap();
        c.register(&[("tokens", 5), ("chars", 20)]).unwrap();
        assert_eq!(c.value("tokens"), 15);
        assert_eq!(c.value("chars"), 60);
    }

    #[test]
    fn unregistered_counter_is_zero() {
        let repo = MemoryRepository::new();
        let c = counter(&repo);
        assert_eq!(c.value("never"), 0);
    }

    #[test]
    fn concurrent_registrations_lose_nothing() {
        let repo = MemoryRepository::new();
        let c = Arc::new(counter(&repo));

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let c = Arc::clone(&c);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        c.register(&[("tokens", 2), ("chars", 7)]).unwrap();
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(c.value("tokens"), 8 * 50 * 2);
        assert_eq!(c.value("chars"), 8 * 50 * 7);
    }
}
