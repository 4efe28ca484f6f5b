//! Event names emitted by the store.

// Group lifecycle.
pub const GROUP_CREATED: &str = "group.created";
pub const GROUP_UPDATED: &str = "group.updated";
pub const GROUP_DELETED: &str = "group.deleted";

// Post lifecycle.
pub const POST_CREATED: &str = "post.created";
pub const POST_UPDATED: &str = "post.updated";
pub const POST_DELETED: &str = "post.deleted";
pub const POST_STATUS_CHANGED: &str = "post.status_changed";

// Version lifecycle.
pub const VERSION_CREATED: &str = "version.created";
pub const VERSION_DELETED: &str = "version.deleted";
pub const VERSION_PUBLISHED: &str = "version.published";
pub const VERSION_LIVE_CHANGED: &str = "version.live_changed";

// Translations.
pub const TRANSLATION_CREATED: &str = "translation.created";
pub const TRANSLATION_DELETED: &str = "translation.deleted";

// Listing cache.
pub const CACHE_CHANGED: &str = "cache.changed";
pub const CACHE_OPERATION: &str = "cache.operation";

// Bulk import.
pub const IMPORT_STARTED: &str = "import.started";
pub const IMPORT_PROGRESS: &str = "import.progress";
pub const IMPORT_COMPLETED: &str = "import.completed";

// Legacy migration.
pub const MIGRATION_PROGRESS: &str = "migration.progress";
pub const MIGRATION_COMPLETED: &str = "migration.completed";
