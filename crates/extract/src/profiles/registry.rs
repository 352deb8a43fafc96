// ABOUTME: ProfileRegistry mapping site identifiers to validated SiteProfiles.
// ABOUTME: Registration validates and rejects duplicates; lookups are infallible reads.

use std::collections::HashMap;

use super::profile::{ProfileError, SiteProfile};

/// Validated site profiles keyed by site identifier.
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: HashMap<String, SiteProfile>,
}

impl ProfileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and add a profile. Fails if the profile is malformed or the
    /// site already has one.
    pub fn register(&mut self, profile: SiteProfile) -> Result<(), ProfileError> {
        profile.validate()?;
        if self.profiles.contains_key(&profile.site_id) {
            return Err(ProfileError::DuplicateSite(profile.site_id.clone()));
        }
        self.profiles.insert(profile.site_id.clone(), profile);
        Ok(())
    }

    pub fn get(&self, site_id: &str) -> Option<&SiteProfile> {
        self.profiles.get(site_id)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Registered site identifiers in sorted order.
    pub fn site_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.profiles.keys().cloned().collect();
        ids.sort();
        ids
    }
}
