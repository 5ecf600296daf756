//! Goal persistence on top of a key-value namespace
//!
//! The entire goal collection lives in one JSON array stored under a single
//! key. Every operation reads the whole array, changes it in memory and
//! writes the whole array back.
//!
//! # Concurrency
//!
//! Operations are not atomic with respect to each other. Two overlapping
//! writes both read the same starting collection and the later `set` wins,
//! silently discarding the earlier change. Callers that can issue writes
//! concurrently must serialize them themselves.

use crate::config::GoalsConfig;
use crate::error::{GoalsError, Result};
use crate::mappers::parse_id;
use crate::models::{next_id, CreateGoalRequest, Goal, UpdateGoalRequest};
use crate::storage::{FileKeyValueStore, KeyValueStore};
use chrono::Utc;
use goals_common::GOALS_KEY;
use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

/// Raw stored records, kept verbatim so untouched goals are rewritten byte-for-byte
type RawGoals = Vec<Box<RawValue>>;

#[derive(Deserialize)]
struct IdField {
    #[serde(default)]
    id: Value,
}

/// Goal store backed by the file-based key-value namespace
pub type FileGoalStore = GoalStore<FileKeyValueStore>;

/// CRUD access to the persisted goal collection
///
/// Each operation comes in two flavours. The `try_*` methods return errors
/// to the caller. The plain methods log failures and degrade to an empty
/// result or a no-op, so a successful return does not prove the write
/// reached storage.
#[derive(Debug, Clone)]
pub struct GoalStore<S> {
    storage: S,
    key: String,
}

impl FileGoalStore {
    /// Open the file-backed store in the configured data directory
    #[must_use]
    pub fn from_config(config: &GoalsConfig) -> Self {
        Self::new(FileKeyValueStore::new(&config.data_dir))
    }
}

impl<S: KeyValueStore> GoalStore<S> {
    /// Create a store persisting under the default `"goals"` key
    #[must_use]
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, GOALS_KEY)
    }

    /// Create a store persisting under a custom key
    #[must_use]
    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// The underlying key-value namespace
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Key the collection is stored under
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Create a goal, returning `None` if it could not be persisted
    pub async fn create(&self, request: CreateGoalRequest) -> Option<Goal> {
        self.try_create(request)
            .await
            .map_err(|e| error!("Failed to save goal: {}", e))
            .ok()
    }

    /// All stored goals; empty if storage is missing, unreadable or malformed
    pub async fn list_all(&self) -> Vec<Goal> {
        self.try_list_all().await.unwrap_or_else(|e| {
            error!("Failed to load goals: {}", e);
            Vec::new()
        })
    }

    /// Find a goal by id; `None` if absent or storage failed
    pub async fn find_by_id(&self, id: i64) -> Option<Goal> {
        self.try_find_by_id(id).await.unwrap_or_else(|e| {
            error!(goal_id = id, "Failed to load goal: {}", e);
            None
        })
    }

    /// Replace the editable fields of a goal; unknown ids are ignored
    pub async fn update(&self, id: i64, request: UpdateGoalRequest) {
        if let Err(e) = self.try_update(id, request).await {
            error!(goal_id = id, "Failed to update goal: {}", e);
        }
    }

    /// Mark a goal completed now; unknown ids are ignored
    pub async fn mark_completed(&self, id: i64) {
        if let Err(e) = self.try_mark_completed(id).await {
            error!(goal_id = id, "Failed to complete goal: {}", e);
        }
    }

    /// Delete a goal; unknown ids are ignored
    pub async fn remove(&self, id: i64) {
        if let Err(e) = self.try_remove(id).await {
            error!(goal_id = id, "Failed to remove goal: {}", e);
        }
    }

    /// Create a goal and append it to the stored collection
    ///
    /// # Errors
    /// Returns an error if the collection cannot be read, is malformed, or
    /// cannot be written back
    #[instrument(skip(self, request), fields(title = %request.title))]
    pub async fn try_create(&self, request: CreateGoalRequest) -> Result<Goal> {
        let mut items = self.load_raw().await?;

        let id = next_id(
            Utc::now().timestamp_millis(),
            items.iter().filter_map(|raw| raw_id(raw)),
        );
        let goal = Goal {
            id,
            title: request.title,
            description: request.description,
            deadline: request.deadline,
            time_unit: request.time_unit,
            time_amount: request.time_amount.filter(|amount| *amount > 0),
            sub_goals: request.sub_goals,
            is_completed: false,
            completed_date: None,
        };

        items.push(encode(&goal)?);
        self.save_raw(&items).await?;

        info!(goal_id = goal.id, "Goal saved");
        Ok(goal)
    }

    /// Load every decodable goal in stored order
    ///
    /// Records that cannot be decoded at all are skipped with a warning.
    ///
    /// # Errors
    /// Returns an error if storage cannot be read or the collection is not a JSON array
    #[instrument(skip(self))]
    pub async fn try_list_all(&self) -> Result<Vec<Goal>> {
        let items = self.load_raw().await?;
        let goals: Vec<Goal> = items.iter().filter_map(|raw| decode(raw)).collect();
        debug!("Loaded {} goals", goals.len());
        Ok(goals)
    }

    /// Find a goal by id with a linear scan
    ///
    /// # Errors
    /// Returns an error if storage cannot be read or the collection is not a JSON array
    #[instrument(skip(self))]
    pub async fn try_find_by_id(&self, id: i64) -> Result<Option<Goal>> {
        let items = self.load_raw().await?;
        Ok(items
            .iter()
            .find(|raw| raw_id(raw) == Some(id))
            .and_then(|raw| decode(raw)))
    }

    /// Replace title, description, deadline, sub-goals and time fields of a goal
    ///
    /// `is_completed = Some(true)` stamps `completed_date` only if it is not
    /// already set; `Some(false)` clears both. Returns the updated goal, or
    /// `None` if no goal has this id.
    ///
    /// # Errors
    /// Returns an error if the collection cannot be read, is malformed, or
    /// cannot be written back
    #[instrument(skip(self, request))]
    pub async fn try_update(&self, id: i64, request: UpdateGoalRequest) -> Result<Option<Goal>> {
        self.modify(id, |goal| {
            goal.title = request.title;
            goal.description = request.description;
            goal.deadline = request.deadline;
            goal.sub_goals = request.sub_goals;
            goal.time_unit = request.time_unit;
            goal.time_amount = request.time_amount.filter(|amount| *amount > 0);

            match request.is_completed {
                Some(true) => {
                    goal.is_completed = true;
                    if goal.completed_date.is_none() {
                        goal.completed_date = Some(Utc::now());
                    }
                }
                Some(false) => {
                    goal.is_completed = false;
                    goal.completed_date = None;
                }
                None => {}
            }
        })
        .await
    }

    /// Mark a goal completed, stamping `completed_date` with the current time
    ///
    /// Calling this again re-stamps the completion date.
    ///
    /// # Errors
    /// Returns an error if the collection cannot be read, is malformed, or
    /// cannot be written back
    #[instrument(skip(self))]
    pub async fn try_mark_completed(&self, id: i64) -> Result<Option<Goal>> {
        self.modify(id, |goal| {
            goal.is_completed = true;
            goal.completed_date = Some(Utc::now());
        })
        .await
    }

    /// Remove a goal, returning whether one was removed
    ///
    /// Nothing is written when the id does not exist.
    ///
    /// # Errors
    /// Returns an error if the collection cannot be read, is malformed, or
    /// cannot be written back
    #[instrument(skip(self))]
    pub async fn try_remove(&self, id: i64) -> Result<bool> {
        let mut items = self.load_raw().await?;
        let before = items.len();
        items.retain(|raw| raw_id(raw) != Some(id));

        if items.len() == before {
            debug!(goal_id = id, "No goal to remove");
            return Ok(false);
        }

        self.save_raw(&items).await?;
        info!(goal_id = id, "Goal removed");
        Ok(true)
    }

    /// Apply `change` to the first goal with this id and rewrite only that record
    async fn modify<F>(&self, id: i64, change: F) -> Result<Option<Goal>>
    where
        F: FnOnce(&mut Goal),
    {
        let mut items = self.load_raw().await?;
        let Some(index) = items.iter().position(|raw| raw_id(raw) == Some(id)) else {
            debug!(goal_id = id, "No goal with this id, nothing to update");
            return Ok(None);
        };

        // An undecodable record with a valid id is rebuilt from the change alone
        let mut goal = decode(&items[index]).unwrap_or_else(|| Goal::new(id, "", ""));
        change(&mut goal);

        items[index] = encode(&goal)?;
        self.save_raw(&items).await?;

        info!(goal_id = id, "Goal updated");
        Ok(Some(goal))
    }

    async fn load_raw(&self) -> Result<RawGoals> {
        let Some(contents) = self.storage.get(&self.key).await? else {
            return Ok(Vec::new());
        };
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        let items: Option<RawGoals> = serde_json::from_str(&contents).map_err(|e| {
            warn!("Stored goal collection is malformed: {}", e);
            GoalsError::from(e)
        })?;
        Ok(items.unwrap_or_default())
    }

    async fn save_raw(&self, items: &[Box<RawValue>]) -> Result<()> {
        let contents = serde_json::to_string(items)?;
        self.storage.set(&self.key, &contents).await
    }
}

fn raw_id(raw: &RawValue) -> Option<i64> {
    serde_json::from_str::<IdField>(raw.get())
        .ok()
        .and_then(|field| parse_id(&field.id))
}

fn decode(raw: &RawValue) -> Option<Goal> {
    match serde_json::from_str::<Goal>(raw.get()) {
        Ok(goal) => Some(goal),
        Err(e) => {
            warn!("Skipping unreadable goal record: {}", e);
            None
        }
    }
}

fn encode(goal: &Goal) -> Result<Box<RawValue>> {
    Ok(serde_json::value::to_raw_value(goal)?)
}
