// ABOUTME: prensa-extract pulls clean article records out of supported news sites.
// ABOUTME: Drives a headless Chromium through per-site selector profiles and normalizes the result.

//! Prensa extracts news articles from a fixed set of supported sites.
//!
//! Each site has a [`SiteProfile`] describing how to find the title, body
//! paragraphs, and lead image in its rendered pages. The [`Client`] opens a
//! dedicated headless-Chromium session per extraction, waits out the
//! profile's selectors, and returns a uniform [`ArticleRecord`] with
//! whitespace-collapsed text, boilerplate stripped, and an absolute image
//! URL.
//!
//! # Example
//!
//! ```no_run
//! use prensa_extract::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), prensa_extract::ExtractError> {
//!     let client = Client::builder().build();
//!     let record = client
//!         .extract("milenio", "https://www.milenio.com/espectaculos/alguna-nota")
//!         .await?;
//!     println!("{} ({} palabras)", record.title, record.word_count());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod options;
pub mod profiles;
pub mod query;
pub mod result;
pub mod session;
pub mod text;

pub use crate::client::Client;
pub use crate::error::{ErrorKind, ExtractError};
pub use crate::options::{ClientBuilder, Options};
pub use crate::profiles::{
    load_builtin_profiles, BodyExtractor, ImageSource, ProfileError, ProfileRegistry, SiteProfile,
    WaitPolicy,
};
pub use crate::query::PageSnapshot;
pub use crate::result::{ArticleRecord, ExtractionStatus};
pub use crate::session::{ChromiumSessionManager, Session, SessionManager};
