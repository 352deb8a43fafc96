// ABOUTME: Loads the builtin site profiles embedded in the binary at compile time.
// ABOUTME: Panics on malformed embedded data since that is a build defect, not a runtime condition.

use super::profile::SiteProfile;
use super::registry::ProfileRegistry;

const BUILTIN_PROFILES_JSON: &str = include_str!("../../data/site_profiles.json");

/// Build the registry of builtin site profiles.
///
/// # Panics
///
/// Panics if the embedded JSON is malformed or any profile fails
/// validation; both mean the shipped data file is broken.
pub fn load_builtin_profiles() -> ProfileRegistry {
    let profiles: Vec<SiteProfile> =
        serde_json::from_str(BUILTIN_PROFILES_JSON).expect("failed to parse builtin site profiles");

    let mut registry = ProfileRegistry::new();
    for profile in profiles {
        if let Err(err) = registry.register(profile) {
            panic!("invalid builtin site profile: {err}");
        }
    }
    registry
}
