// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "stratus";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".stratus";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "stratus.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "STRATUS_CONFIG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "STRATUS_LOG";

// =============================================================================
// Environment Variables - Search Domain
// =============================================================================

/// Environment variable for the search domain name
pub const ENV_DOMAIN: &str = "STRATUS_DOMAIN";

/// Environment variable for the domain region
pub const ENV_REGION: &str = "STRATUS_REGION";

/// Environment variable for the API version path segment
pub const ENV_API_VERSION: &str = "STRATUS_API_VERSION";

// =============================================================================
// Environment Variables - HTTP
// =============================================================================

/// Environment variable for the request timeout in seconds
pub const ENV_TIMEOUT_SECS: &str = "STRATUS_TIMEOUT_SECS";

/// Environment variable to skip all service calls
pub const ENV_SANDBOX: &str = "STRATUS_SANDBOX";

// =============================================================================
// Defaults
// =============================================================================

/// Default request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = stratus::transport::DEFAULT_TIMEOUT_SECS;
