//! The meetup collection store.
//!
//! [`MeetupStore`] owns the ordered list of meetups shown by the UI and
//! notifies subscribers after every committed change. It is constructed
//! explicitly and handed to whoever needs it; clones share the same list.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::meetup::{Meetup, MeetupPatch};
use crate::observable::{Subscription, Writable};

/// Observable, ordered collection of meetups.
#[derive(Clone, Default)]
pub struct MeetupStore {
    meetups: Writable<Vec<Meetup>>,
}

impl fmt::Debug for MeetupStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeetupStore")
            .field("meetups", &self.meetups().len())
            .field("version", &self.version())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl MeetupStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `meetups`.
    pub fn with_meetups(meetups: Vec<Meetup>) -> Self {
        Self {
            meetups: Writable::new(meetups),
        }
    }

    /// Registers a callback that receives the list now and after every change.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&[Meetup]) + Send + Sync + 'static,
    {
        self.meetups
            .subscribe(move |meetups: &Vec<Meetup>| callback(meetups.as_slice()))
    }

    /// Replaces the whole collection, typically after a fetch.
    pub fn set_meetups(&self, meetups: Vec<Meetup>) {
        debug!(count = meetups.len(), "Setting meetups");
        self.meetups.set(meetups);
    }

    /// Prepends a meetup.
    ///
    /// Ids are not checked for uniqueness.
    pub fn add_meetup(&self, meetup: Meetup) {
        self.meetups.update(|items| {
            if items.iter().any(|m| m.id == meetup.id) {
                debug!(id = %meetup.id, "Adding meetup with an id already in the store");
            }
            let mut next = Vec::with_capacity(items.len() + 1);
            next.push(meetup);
            next.extend(items.iter().cloned());
            debug!(id = %next[0].id, count = next.len(), "Added meetup");
            next
        });
    }

    /// Merges `patch` onto the first meetup with `id`, keeping its position.
    ///
    /// Returns the updated record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no meetup has this id. The
    /// collection is left unchanged and subscribers are not notified.
    pub fn update_meetup(&self, id: &str, patch: MeetupPatch) -> StoreResult<Meetup> {
        self.replace_with(id, |meetup| meetup.apply(&patch))
            .inspect(|_| debug!(id = %id, "Updated meetup"))
    }

    /// Removes every meetup with `id`.
    ///
    /// Returns how many were removed. Subscribers are only notified when
    /// something was removed.
    pub fn remove_meetup(&self, id: &str) -> usize {
        let mut removed = 0;
        self.meetups.update_if(|items| {
            let next: Vec<Meetup> = items.iter().filter(|m| m.id != id).cloned().collect();
            removed = items.len() - next.len();
            (removed > 0).then_some(next)
        });
        if removed == 0 {
            debug!(id = %id, "No meetup to remove");
        } else {
            debug!(id = %id, removed, "Removed meetup");
        }
        removed
    }

    /// Flips the favorite flag of the first meetup with `id`.
    ///
    /// Returns the new flag.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no meetup has this id.
    pub fn toggle_favorite(&self, id: &str) -> StoreResult<bool> {
        let meetup = self.replace_with(id, |meetup| meetup.is_favorite = !meetup.is_favorite)?;
        debug!(id = %id, is_favorite = meetup.is_favorite, "Toggled favorite");
        Ok(meetup.is_favorite)
    }

    /// Replaces the first meetup with `id` by an edited copy.
    fn replace_with<F>(&self, id: &str, edit: F) -> StoreResult<Meetup>
    where
        F: FnOnce(&mut Meetup),
    {
        self.meetups
            .try_update_with(|items| {
                let index = items
                    .iter()
                    .position(|m| m.id == id)
                    .ok_or_else(|| StoreError::not_found(id))?;

                let mut meetup = items[index].clone();
                edit(&mut meetup);

                let mut next = items.clone();
                next[index] = meetup.clone();
                Ok((Some(next), meetup))
            })
            .inspect_err(|_| warn!(id = %id, "Meetup not found"))
    }

    /// Returns the current list.
    pub fn meetups(&self) -> Arc<Vec<Meetup>> {
        self.meetups.get()
    }

    /// Returns a copy of the first meetup with `id`.
    pub fn get(&self, id: &str) -> Option<Meetup> {
        self.meetups().iter().find(|m| m.id == id).cloned()
    }

    /// Returns the favorite meetups, in collection order.
    pub fn favorites(&self) -> Vec<Meetup> {
        self.meetups()
            .iter()
            .filter(|m| m.is_favorite)
            .cloned()
            .collect()
    }

    /// Returns the number of meetups.
    pub fn len(&self) -> usize {
        self.meetups().len()
    }

    /// Returns true if the store holds no meetups.
    pub fn is_empty(&self) -> bool {
        self.meetups().is_empty()
    }

    /// Returns the number of committed changes.
    pub fn version(&self) -> u64 {
        self.meetups.version()
    }

    /// Returns the number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.meetups.subscriber_count()
    }
}
