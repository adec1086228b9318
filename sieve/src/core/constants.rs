// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "Sieve";

/// Application name in lowercase (for paths, identifiers and log targets)
pub const APP_NAME_LOWER: &str = "sieve";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".sieve";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "sieve.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "SIEVE_CONFIG";

// =============================================================================
// Environment Variables - Logging and Output
// =============================================================================

/// Environment variable for debug mode
pub const ENV_DEBUG: &str = "SIEVE_DEBUG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "SIEVE_LOG";

/// Environment variable for pretty-printed JSON output
pub const ENV_PRETTY: &str = "SIEVE_PRETTY";

// =============================================================================
// Environment Variables - Filters
// =============================================================================

/// Environment variable for maximum filter JSON size in bytes
pub const ENV_FILTER_MAX_BYTES: &str = "SIEVE_FILTER_MAX_BYTES";

/// Environment variable for maximum group nesting depth
pub const ENV_FILTER_MAX_DEPTH: &str = "SIEVE_FILTER_MAX_DEPTH";

/// Environment variable for maximum number of conditions
pub const ENV_FILTER_MAX_CONDITIONS: &str = "SIEVE_FILTER_MAX_CONDITIONS";

/// Environment variable for the comma-separated field whitelist
pub const ENV_FILTER_ALLOWED_FIELDS: &str = "SIEVE_FILTER_ALLOWED_FIELDS";

// =============================================================================
// Environment Variables - Sanitizer
// =============================================================================

/// Environment variable to keep `data:image/*` URLs
pub const ENV_SANITIZE_ALLOW_DATA_IMAGES: &str = "SIEVE_SANITIZE_ALLOW_DATA_IMAGES";
