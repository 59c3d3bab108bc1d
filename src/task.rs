use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ChunkDescriptor {
    pub index: usize,
    /// first sample (inclusive), relative to the component
    pub start: usize,
    /// last sample (exclusive)
    pub end: usize,
}

/// Splits `len` samples into consecutive chunks of at most `chunk_size`.
pub fn plan_chunks(len: usize, chunk_size: usize) -> Vec<ChunkDescriptor> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut index = 0usize;
    while start < len {
        let end = (start + chunk_size).min(len);
        chunks.push(ChunkDescriptor { index, start, end });
        start = end;
        index += 1;
    }
    chunks
}

/// State of one chunk while the background load runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    Pending,
    Ready,
    /// already handed out, or never existed
    Gone,
}

/// One component of one dump file, cut into chunks.
/// Each chunk is stored separately so it can be released once served.
pub struct TaskData {
    /// `[comp, sx, sy, sz]` read from the header when the chunks were planned
    pub shape: [u64; 4],
    pub component: usize,
    pub chunks: Vec<ChunkDescriptor>,
    /// `None` while the file is still loading
    pub chunk_data: RwLock<HashMap<usize, Option<Vec<f32>>>>,
    /// Set when the background load fails; pending chunks never arrive.
    pub failure: RwLock<Option<String>>,
    pub created_at: Instant,
    pub file_path: PathBuf,
}

impl TaskData {
    pub fn new(
        shape: [u64; 4],
        component: usize,
        chunks: Vec<ChunkDescriptor>,
        file_path: PathBuf,
    ) -> Self {
        let chunk_data = chunks.iter().map(|d| (d.index, None)).collect();

        Self {
            shape,
            component,
            chunks,
            chunk_data: RwLock::new(chunk_data),
            failure: RwLock::new(None),
            created_at: Instant::now(),
            file_path,
        }
    }

    /// Fills every chunk from the component's flat samples.
    /// Nothing is stored unless `values` covers every planned chunk.
    pub fn fill_from(&self, values: &[f32]) -> Result<(), String> {
        let planned = self.chunks.last().map_or(0, |d| d.end);
        if values.len() != planned {
            return Err(format!(
                "component {} has {} samples, {} were planned",
                self.component,
                values.len(),
                planned
            ));
        }

        let mut chunk_data = self.chunk_data.write();
        for descriptor in &self.chunks {
            let slot = values[descriptor.start..descriptor.end].to_vec();
            chunk_data.insert(descriptor.index, Some(slot));
        }
        Ok(())
    }

    /// Hands the loaded component to the task.
    ///
    /// The file may have been rewritten since its header was read. A shape
    /// other than the planned one, or a short component, fails the task so
    /// that chunk requests stop answering "still loading".
    pub fn complete(&self, loaded_shape: [u64; 4], values: &[f32]) -> bool {
        if loaded_shape != self.shape {
            self.fail(format!(
                "file changed while loading: planned shape {:?}, loaded {:?}",
                self.shape, loaded_shape
            ));
            return false;
        }
        match self.fill_from(values) {
            Ok(()) => true,
            Err(reason) => {
                self.fail(reason);
                false
            }
        }
    }

    pub fn fail(&self, reason: String) {
        *self.failure.write() = Some(reason);
    }

    pub fn failure(&self) -> Option<String> {
        self.failure.read().clone()
    }

    /// Removes and returns a ready chunk. Each chunk is served once.
    pub fn take_chunk(&self, chunk_index: usize) -> Option<Vec<f32>> {
        let mut chunk_data = self.chunk_data.write();
        if matches!(chunk_data.get(&chunk_index), Some(Some(_))) {
            chunk_data.remove(&chunk_index).flatten()
        } else {
            None
        }
    }

    pub fn chunk_state(&self, chunk_index: usize) -> ChunkState {
        match self.chunk_data.read().get(&chunk_index) {
            Some(Some(_)) => ChunkState::Ready,
            Some(None) => ChunkState::Pending,
            None => ChunkState::Gone,
        }
    }

    /// Chunks not yet handed out.
    pub fn remaining_chunk_count(&self) -> usize {
        self.chunk_data.read().len()
    }
}

pub struct TaskStore {
    tasks: RwLock<HashMap<String, Arc<TaskData>>>,
    default_ttl: Duration,
}

impl TaskStore {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

    pub fn new() -> Self {
        Self::with_ttl(Self::DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            default_ttl: ttl,
        }
    }

    pub fn insert(&self, data: TaskData) -> (String, Arc<TaskData>) {
        let task_id = Uuid::new_v4().to_string();
        let task = Arc::new(data);
        self.tasks.write().insert(task_id.clone(), task.clone());
        (task_id, task)
    }

    pub fn get(&self, task_id: &str) -> Option<Arc<TaskData>> {
        self.tasks.read().get(task_id).cloned()
    }

    /// Drops expired tasks and returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut tasks = self.tasks.write();
        let before_count = tasks.len();

        tasks.retain(|_, task| now.duration_since(task.created_at) < self.default_ttl);

        before_count - tasks.len()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(len: usize, chunk_size: usize) -> TaskData {
        let shape = [1, len as u64, 1, 1];
        TaskData::new(shape, 0, plan_chunks(len, chunk_size), PathBuf::from("x.dump"))
    }

    #[test]
    fn test_plan_chunks() {
        let chunks = plan_chunks(10, 4);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2], ChunkDescriptor { index: 2, start: 8, end: 10 });
        assert_eq!(plan_chunks(3, 0).len(), 3);
        assert!(plan_chunks(0, 4).is_empty());
    }

    #[test]
    fn test_chunk_lifecycle() {
        let task = task(5, 2);
        assert_eq!(task.chunk_state(0), ChunkState::Pending);
        assert_eq!(task.take_chunk(0), None);
        assert_eq!(task.remaining_chunk_count(), 3);

        task.fill_from(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(task.chunk_state(2), ChunkState::Ready);
        assert_eq!(task.take_chunk(2), Some(vec![5.0]));
        assert_eq!(task.chunk_state(2), ChunkState::Gone);
        assert_eq!(task.take_chunk(2), None);
        assert_eq!(task.remaining_chunk_count(), 2);
        assert_eq!(task.chunk_state(9), ChunkState::Gone);
    }

    #[test]
    fn test_short_component_fails_task() {
        let task = task(8, 5);
        assert!(task.fill_from(&[1.0]).is_err());
        assert_eq!(task.chunk_state(0), ChunkState::Pending);

        assert!(!task.complete([1, 8, 1, 1], &[1.0]));
        assert_eq!(task.chunk_state(0), ChunkState::Pending);
        assert_eq!(task.chunk_state(1), ChunkState::Pending);
        assert!(task.failure().unwrap().contains("1 samples, 8 were planned"));
    }

    #[test]
    fn test_changed_shape_fails_task() {
        let task = task(4, 2);
        let values = [0.0; 6];
        assert!(!task.complete([1, 6, 1, 1], &values));
        assert!(task.failure().unwrap().contains("file changed"));
        assert_eq!(task.chunk_state(0), ChunkState::Pending);
    }

    #[test]
    fn test_complete_fills_chunks() {
        let task = task(4, 3);
        assert!(task.complete([1, 4, 1, 1], &[1.0, 2.0, 3.0, 4.0]));
        assert_eq!(task.failure(), None);
        assert_eq!(task.take_chunk(1), Some(vec![4.0]));
    }

    #[test]
    fn test_store_expiry() {
        let store = TaskStore::with_ttl(Duration::ZERO);
        let (id, _) = store.insert(task(1, 1));
        assert!(store.get(&id).is_some());
        assert_eq!(store.cleanup_expired(), 1);
        assert_eq!(store.task_count(), 0);

        let store = TaskStore::new();
        let (id, task_ref) = store.insert(task(1, 1));
        assert!(Arc::ptr_eq(&store.get(&id).unwrap(), &task_ref));
        assert_eq!(store.cleanup_expired(), 0);
    }
}
