use std::sync::Mutex;

use super::directory::{Directory, DirectoryError, PublisherFilter, PublisherRecord, VisitorRecord};
use super::roles::AssignmentPermission;

/// Directory held in process memory. Used where no database is available,
/// e.g. in tests of the assignment rules.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    publishers: Mutex<Vec<PublisherRecord>>,
    visitors: Mutex<Vec<VisitorRecord>>,
    next_id: Mutex<i64>,
    fail_lookups: bool,
    fail_writes: bool,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self { next_id: Mutex::new(1000), ..Self::default() }
    }

    pub fn with_publisher(self, id: i64, name: &str, permissions: &[AssignmentPermission]) -> Self {
        self.publishers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(PublisherRecord {
                id,
                display_name: name.to_string(),
                assignment_permissions: permissions.iter().copied().collect(),
            });
        self
    }

    pub fn with_visitor(self, id: i64, name: &str) -> Self {
        self.visitors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(VisitorRecord { id, name: name.to_string() });
        self
    }

    /// Every lookup returns an error.
    pub fn failing_lookups(mut self) -> Self {
        self.fail_lookups = true;
        self
    }

    /// Every visitor creation returns an error.
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn visitors(&self) -> Vec<VisitorRecord> {
        self.visitors.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn check_lookup(&self) -> Result<(), DirectoryError> {
        if self.fail_lookups {
            return Err(DirectoryError("directory unavailable".to_string()));
        }
        Ok(())
    }
}

impl Directory for MemoryDirectory {
    async fn find_publishers(&self, filter: &PublisherFilter) -> Result<Vec<PublisherRecord>, DirectoryError> {
        self.check_lookup()?;
        let mut found: Vec<PublisherRecord> = self
            .publishers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.display_name.cmp(&b.display_name).then(a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn find_publisher(&self, id: i64) -> Result<Option<PublisherRecord>, DirectoryError> {
        self.check_lookup()?;
        let publishers = self.publishers.lock().unwrap_or_else(|e| e.into_inner());
        Ok(publishers.iter().find(|p| p.id == id).cloned())
    }

    async fn find_visitors(&self) -> Result<Vec<VisitorRecord>, DirectoryError> {
        self.check_lookup()?;
        Ok(self.visitors())
    }

    async fn find_visitor(&self, id: i64) -> Result<Option<VisitorRecord>, DirectoryError> {
        self.check_lookup()?;
        let visitors = self.visitors.lock().unwrap_or_else(|e| e.into_inner());
        Ok(visitors.iter().find(|v| v.id == id).cloned())
    }

    async fn create_visitor(&self, name: &str) -> Result<VisitorRecord, DirectoryError> {
        if self.fail_writes {
            return Err(DirectoryError("write rejected".to_string()));
        }
        let mut next_id = self.next_id.lock().unwrap_or_else(|e| e.into_inner());
        *next_id += 1;
        let visitor = VisitorRecord { id: *next_id, name: name.to_string() };
        self.visitors.lock().unwrap_or_else(|e| e.into_inner()).push(visitor.clone());
        Ok(visitor)
    }
}
