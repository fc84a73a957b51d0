/// Ordered collection of destinations with unique single-character keys.
use super::data::Destination;
use crate::error::{Result, SorterError};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DestinationRegistry {
    destinations: Vec<Destination>,
}

impl DestinationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a destination.
    ///
    /// Blank fields and keys already in use are rejected without touching the
    /// registry. Names are not required to be unique.
    pub fn add(&mut self, name: &str, key: &str, path: &str) -> Result<&Destination> {
        let (name, key, path) = (name.trim(), key.trim(), path.trim());
        if name.is_empty() || key.is_empty() || path.is_empty() {
            return Err(SorterError::Validation("Please fill all fields".to_string()));
        }

        let key = normalize_key(key)
            .ok_or_else(|| SorterError::Validation("Key must be a single character".to_string()))?;

        if self.find_by_key(key).is_some() {
            return Err(SorterError::Validation(format!("Key '{key}' already used")));
        }

        self.destinations.push(Destination {
            name: name.to_string(),
            key,
            path: path.to_string(),
        });
        Ok(&self.destinations[self.destinations.len() - 1])
    }

    /// Remove the destination bound to `key` once `confirm` approves it.
    ///
    /// Returns `Ok(None)` when the confirmation is declined.
    pub fn remove<F>(&mut self, key: char, confirm: F) -> Result<Option<Destination>>
    where
        F: FnOnce(&Destination) -> bool,
    {
        let index = self
            .position(key)
            .ok_or_else(|| SorterError::Validation(format!("No destination bound to '{key}'")))?;

        if !confirm(&self.destinations[index]) {
            return Ok(None);
        }

        Ok(Some(self.destinations.remove(index)))
    }

    /// Swap in a whole list, e.g. one loaded from the catalog or a restored session.
    pub fn replace_all(&mut self, destinations: Vec<Destination>) {
        self.destinations = destinations;
    }

    /// Case-insensitive key lookup
    pub fn find_by_key(&self, key: char) -> Option<&Destination> {
        self.position(key).map(|index| &self.destinations[index])
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.destinations.iter().any(|d| d.name == name)
    }

    pub fn list(&self) -> &[Destination] {
        &self.destinations
    }

    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }

    fn position(&self, key: char) -> Option<usize> {
        let key = lowercase(key)?;
        self.destinations.iter().position(|d| d.key == key)
    }
}

/// Lowercase a one-character string, rejecting anything longer.
pub fn normalize_key(key: &str) -> Option<char> {
    let mut chars = key.chars();
    let first = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    lowercase(first)
}

/// Single-character lowercase, or `None` when lowercasing expands the character.
pub fn lowercase(key: char) -> Option<char> {
    let mut lower = key.to_lowercase();
    let first = lower.next()?;
    match lower.next() {
        Some(_) => None,
        None => Some(first),
    }
}
