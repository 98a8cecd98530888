use tokio::sync::watch;

use crate::{
    config::model::{Configuration, ExportSnapshot, FieldUpdate},
    foundation::error::CoverResult,
};

/// A value tagged with the revision that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct Versioned<T> {
    pub revision: u64,
    pub value: T,
}

/// Versioned home of the session's [`Configuration`].
///
/// All mutations go through [`ConfigStore::update`] (or the export snapshot/restore pair), each
/// successful change bumps the revision by one and wakes every subscriber.
#[derive(Debug)]
pub struct ConfigStore {
    tx: watch::Sender<Versioned<Configuration>>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self {
            tx: watch::Sender::new(Versioned {
                revision: 0,
                value: Configuration::default(),
            }),
        }
    }
}

impl ConfigStore {
    pub fn new(initial: Configuration) -> CoverResult<Self> {
        initial.validate()?;
        Ok(Self {
            tx: watch::Sender::new(Versioned {
                revision: 0,
                value: initial,
            }),
        })
    }

    /// Apply one field edit. Returns the revision current after the call.
    pub fn update(&self, update: FieldUpdate) -> CoverResult<u64> {
        self.update_many([update])
    }

    /// Apply several edits atomically: either all of them land under one revision or none do.
    pub fn update_many(&self, updates: impl IntoIterator<Item = FieldUpdate>) -> CoverResult<u64> {
        let mut outcome = Ok(());
        self.tx.send_if_modified(|current| {
            let mut next = current.value.clone();
            let mut changed = false;
            for up in updates {
                let key = up.key();
                match up.apply(&mut next) {
                    Ok(c) => changed |= c,
                    Err(e) => {
                        tracing::debug!(field = key, error = %e, "rejected configuration update");
                        outcome = Err(e);
                        return false;
                    }
                }
            }
            if !changed {
                return false;
            }
            current.value = next;
            current.revision += 1;
            true
        });
        outcome.map(|()| self.revision())
    }

    pub fn current(&self) -> Versioned<Configuration> {
        self.tx.borrow().clone()
    }

    pub fn config(&self) -> Configuration {
        self.tx.borrow().value.clone()
    }

    pub fn revision(&self) -> u64 {
        self.tx.borrow().revision
    }

    pub fn subscribe(&self) -> watch::Receiver<Versioned<Configuration>> {
        self.tx.subscribe()
    }

    pub fn snapshot_for_export(&self) -> ExportSnapshot {
        self.tx.borrow().value.export_snapshot()
    }

    /// Write a snapshot back. Returns the revision current after the call.
    pub(crate) fn restore(&self, snapshot: ExportSnapshot) -> u64 {
        self.tx.send_if_modified(|current| {
            if !current.value.apply_snapshot(snapshot) {
                return false;
            }
            current.revision += 1;
            true
        });
        self.revision()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/store.rs"]
mod tests;
