// ABOUTME: Site profile system describing per-site extraction rules.
// ABOUTME: Provides the profile model, validated registry, and builtin profile loader.

pub mod loader;
pub mod profile;
pub mod registry;

pub use loader::load_builtin_profiles;
pub use profile::{BodyExtractor, ImageSource, ProfileError, SiteProfile, WaitPolicy};
pub use registry::ProfileRegistry;
