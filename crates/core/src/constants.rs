//! Constants used throughout the finder core crate.
//!
//! Wire-level header values, paging defaults and display placeholders live here so that the
//! store, the grid and the dialogs agree on them.

/// FHIR server used when no base URL is configured.
pub const DEFAULT_FHIR_BASE_URL: &str = "https://demo.kodjin.com/fhir";

/// Number of patients fetched per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound accepted for a configured page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Media type for FHIR JSON request and response bodies.
pub const FHIR_JSON_CONTENT_TYPE: &str = "application/fhir+json";

/// `Prefer` header value asking the server for `_skip`-based paging.
pub const PREFER_OFFSET_PAGINATION: &str = "pagination=offset-skip";

/// Search sort order: most recently updated first.
pub const SORT_MOST_RECENTLY_UPDATED: &str = "-_lastUpdated";

/// Placeholder shown for a missing field in a view row.
pub const NOT_AVAILABLE: &str = "N/A";

/// Avatar size in the grid's avatar column.
pub const GRID_AVATAR_SIZE: u32 = 100;

/// Avatar corner radius (percent) in the grid's avatar column.
pub const GRID_AVATAR_RADIUS: u32 = 50;

/// Avatar size in the edit dialog.
pub const EDIT_AVATAR_SIZE: u32 = 150;
