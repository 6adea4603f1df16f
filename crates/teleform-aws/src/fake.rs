//! In-memory building blocks for the service fakes used in tests.
//!
//! A [`Table`] stores remote objects by ID and replays scripted statuses:
//! every observation (a get or a list) pops the next scripted status of an
//! object. Once a deleted object's script runs out it disappears.
use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::api::ApiError;

/// Remote objects with a mutable status label.
pub(crate) trait HasStatus {
    fn set_status(&mut self, status: &str);
}

struct Row<T> {
    object: T,
    queue: VecDeque<String>,
    deleting: bool,
}

pub(crate) struct Table<T> {
    rows: BTreeMap<String, Row<T>>,
    pub create_script: Vec<String>,
    pub update_script: Vec<String>,
    pub delete_script: Vec<String>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: Default::default(),
            create_script: vec![],
            update_script: vec![],
            delete_script: vec![],
        }
    }
}

impl<T: Clone + HasStatus> Table<T> {
    fn start(row: &mut Row<T>, script: &[String]) {
        row.queue = script.iter().cloned().collect();
        if let Some(first) = script.first() {
            row.object.set_status(first);
        }
    }

    /// Observes one object, advancing its script.
    fn observe(&mut self, id: &str) -> Option<T> {
        let row = self.rows.get_mut(id)?;
        match row.queue.pop_front() {
            Some(status) => {
                row.object.set_status(&status);
                Some(row.object.clone())
            }
            None if row.deleting => {
                self.rows.remove(id);
                None
            }
            None => Some(row.object.clone()),
        }
    }

    pub fn insert(&mut self, id: impl Into<String>, object: T) -> T {
        let mut row = Row {
            object,
            queue: VecDeque::new(),
            deleting: false,
        };
        Self::start(&mut row, &self.create_script);
        let object = row.object.clone();
        self.rows.insert(id.into(), row);
        object
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rows.contains_key(id)
    }

    /// The ID of the first live object matching `f`, without observing it.
    pub fn find_id(&self, f: impl Fn(&T) -> bool) -> Option<String> {
        self.rows
            .iter()
            .find(|(_, row)| !row.deleting && f(&row.object))
            .map(|(id, _)| id.clone())
    }

    pub fn get(&mut self, id: &str) -> Result<T, ApiError> {
        self.observe(id)
            .ok_or_else(|| ApiError::not_found(format!("{id} not found")))
    }

    /// Observes every object.
    pub fn list(&mut self) -> Vec<T> {
        let ids: Vec<String> = self.rows.keys().cloned().collect();
        ids.iter().filter_map(|id| self.observe(id)).collect()
    }

    /// Changes an object in place, starting its update script.
    pub fn update(&mut self, id: &str, f: impl FnOnce(&mut T)) -> Result<T, ApiError> {
        let script = self.update_script.clone();
        let row = self
            .rows
            .get_mut(id)
            .filter(|row| !row.deleting)
            .ok_or_else(|| ApiError::not_found(format!("{id} not found")))?;
        f(&mut row.object);
        Self::start(row, &script);
        Ok(row.object.clone())
    }

    /// Starts deleting an object.
    pub fn remove(&mut self, id: &str) -> Result<T, ApiError> {
        let script = self.delete_script.clone();
        let row = self
            .rows
            .get_mut(id)
            .filter(|row| !row.deleting)
            .ok_or_else(|| ApiError::not_found(format!("{id} not found")))?;
        row.deleting = true;
        Self::start(row, &script);
        let object = row.object.clone();
        if script.is_empty() {
            self.rows.remove(id);
        }
        Ok(object)
    }

    /// Overwrites an object without touching its script.
    pub fn set(&mut self, id: &str, f: impl FnOnce(&mut T)) {
        if let Some(row) = self.rows.get_mut(id) {
            f(&mut row.object);
        }
    }
}

pub(crate) fn script<const N: usize>(statuses: [&str; N]) -> Vec<String> {
    statuses.iter().map(|s| s.to_string()).collect()
}

/// Records calls and serves injected failures.
#[derive(Default)]
pub(crate) struct Calls {
    pub log: Vec<String>,
    failures: HashMap<String, VecDeque<ApiError>>,
}

impl Calls {
    /// Records a call to `op`, returning an injected failure if any.
    pub fn call(&mut self, op: &str) -> Result<(), ApiError> {
        self.log.push(op.to_owned());
        match self.failures.get_mut(op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn fail_next(&mut self, op: &str, err: ApiError) {
        self.failures.entry(op.to_owned()).or_default().push_back(err);
    }

    pub fn count(&self, op: &str) -> usize {
        self.log.iter().filter(|o| *o == op).count()
    }
}
