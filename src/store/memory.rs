use std::cell::RefCell;
use std::collections::HashMap;
use std::io;

use crate::error::{AwsxError, Result};
use crate::store::{ProfileStore, Sections, StoreKind};

/// In-memory stores for engine tests. Writes to `failing` kinds error out.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    stores: RefCell<HashMap<StoreKind, Sections>>,
    failing: RefCell<Vec<StoreKind>>,
    writes: RefCell<Vec<StoreKind>>,
}

impl MemoryStore {
    pub(crate) fn fail_writes_to(&self, kind: StoreKind) {
        self.failing.borrow_mut().push(kind);
    }

    pub(crate) fn writes(&self) -> Vec<StoreKind> {
        self.writes.borrow().clone()
    }

    pub(crate) fn get(&self, kind: StoreKind, section: &str, key: &str) -> Option<String> {
        self.stores
            .borrow()
            .get(&kind)
            .and_then(|s| s.get_from(Some(section), key))
            .map(str::to_string)
    }
}

impl ProfileStore for MemoryStore {
    fn read_store(&self, kind: StoreKind) -> Sections {
        self.stores.borrow().get(&kind).cloned().unwrap_or_default()
    }

    fn write_store(&self, kind: StoreKind, sections: &Sections) -> Result<()> {
        if self.failing.borrow().contains(&kind) {
            return Err(AwsxError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is read-only", kind),
            )));
        }

        self.writes.borrow_mut().push(kind);
        self.stores.borrow_mut().insert(kind, sections.clone());
        Ok(())
    }
}
