//! In-memory meeting records keyed by topic

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("A meeting with the topic '{0}' already exists.")]
    AlreadyExists(String),
    #[error("Meeting '{0}' not found.")]
    NotFound(String),
}

/// Attendees and action items of one meeting
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Meeting {
    pub attendees: Vec<String>,
    pub action_items: Vec<String>,
}

/// Meetings in scheduling order. Owned by the server for its whole lifetime.
#[derive(Debug, Default)]
pub struct MeetingStore {
    meetings: Vec<(String, Meeting)>,
}

impl MeetingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, topic: &str) -> Result<(), StoreError> {
        if self.get(topic).is_some() {
            return Err(StoreError::AlreadyExists(topic.to_string()));
        }
        self.meetings.push((topic.to_string(), Meeting::default()));
        Ok(())
    }

    pub fn add_attendee(&mut self, topic: &str, name: &str) -> Result<(), StoreError> {
        self.get_mut(topic)?.attendees.push(name.to_string());
        Ok(())
    }

    pub fn add_action_item(&mut self, topic: &str, item: &str) -> Result<(), StoreError> {
        self.get_mut(topic)?.action_items.push(item.to_string());
        Ok(())
    }

    pub fn get(&self, topic: &str) -> Option<&Meeting> {
        self.meetings
            .iter()
            .find(|(t, _)| t == topic)
            .map(|(_, meeting)| meeting)
    }

    fn get_mut(&mut self, topic: &str) -> Result<&mut Meeting, StoreError> {
        self.meetings
            .iter_mut()
            .find(|(t, _)| t == topic)
            .map(|(_, meeting)| meeting)
            .ok_or_else(|| StoreError::NotFound(topic.to_string()))
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.meetings.iter().map(|(t, _)| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.meetings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meetings.is_empty()
    }
}
