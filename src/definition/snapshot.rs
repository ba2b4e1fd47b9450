use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};

use crate::error::SnapshotError;
use crate::model::{Configuration, WorkflowCondition};

/// A task in registry form, with preconditions referenced by id.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TaskRecord {
    pub task_id: String,
    pub task_name: String,
    pub instance_class: String,
    pub condition_ids: Vec<String>,
    pub config: Configuration,
    pub required_met_fields: Vec<String>,
    pub order: i32,
}

/// A workflow in registry form, with tasks and conditions referenced by id.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct WorkflowRecord {
    pub id: String,
    pub name: String,
    pub task_ids: Vec<String>,
    pub condition_ids: Vec<String>,
}

/// One event-map entry: the workflows launched when `event` fires, in order.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EventRecord {
    pub event: String,
    pub workflow_ids: Vec<String>,
}

/// A named configuration group kept after compilation for task-level lookup.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConfigurationGroupRecord {
    pub name: String,
    pub configuration: Configuration,
}

/// The compiled form of a set of workflow definition documents.
///
/// Everything a repository needs is stored id-indirected, so loading a
/// snapshot rebuilds the same shared-entity structure the compiler produced:
/// compile once, save, and ship the snapshot to hosts that serve it without
/// recompiling.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RepositorySnapshot {
    pub conditions: Vec<WorkflowCondition>,
    pub tasks: Vec<TaskRecord>,
    /// Workflows visible to id/name queries, in first-registration order.
    pub workflows: Vec<WorkflowRecord>,
    /// Parallel composites removed from the registry by flattening but
    /// still referenced from event entries.
    pub detached_workflows: Vec<WorkflowRecord>,
    pub events: Vec<EventRecord>,
    pub configuration_groups: Vec<ConfigurationGroupRecord>,
}

impl RepositorySnapshot {
    /// Saves the snapshot to a file using the bincode format.
    pub fn save(&self, path: &str) -> Result<(), SnapshotError> {
        let bytes = self.to_bytes()?;
        let mut file = fs::File::create(path).map_err(|e| SnapshotError::FileError {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        file.write_all(&bytes).map_err(|e| SnapshotError::FileError {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Loads a snapshot from a file.
    pub fn from_file(path: &str) -> Result<Self, SnapshotError> {
        let mut file = fs::File::open(path).map_err(|e| SnapshotError::FileError {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| SnapshotError::FileError {
                path: path.to_string(),
                message: e.to_string(),
            })?;
        Self::from_bytes(&bytes)
    }

    /// Serializes the snapshot into bincode bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        encode_to_vec(self, standard()).map_err(|e| SnapshotError::EncodeError(e.to_string()))
    }

    /// Deserializes a snapshot from a byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        decode_from_slice(bytes, standard())
            .map(|(snapshot, _)| snapshot) // bincode 2 returns a tuple (data, bytes_read)
            .map_err(|e| SnapshotError::DecodeError(e.to_string()))
    }
}
