// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths, identifiers and log targets)
pub const APP_NAME_LOWER: &str = "filterql";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "filterql.json";

/// Environment variable for config file path(s), comma-separated
pub const ENV_CONFIG: &str = "FILTERQL_CONFIG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "FILTERQL_LOG";

// =============================================================================
// Environment Variables - Parsing
// =============================================================================

/// Environment variable for the maximum number of predicates per request
pub const ENV_MAX_PREDICATES: &str = "FILTERQL_MAX_PREDICATES";

/// Environment variable for the maximum filter JSON payload size in bytes
pub const ENV_MAX_FILTER_JSON_BYTES: &str = "FILTERQL_MAX_FILTER_JSON_BYTES";

/// Environment variable for the column whitelist, comma-separated
pub const ENV_ALLOWED_COLUMNS: &str = "FILTERQL_ALLOWED_COLUMNS";

// =============================================================================
// Environment Variables - Compilers
// =============================================================================

/// Environment variable to double backslashes in SQL string literals
pub const ENV_SQL_ESCAPE_BACKSLASHES: &str = "FILTERQL_SQL_ESCAPE_BACKSLASHES";

/// Environment variable to evaluate not_in/between/unknown operators in previews
pub const ENV_EVAL_FULL_OPERATOR_SET: &str = "FILTERQL_EVAL_FULL_OPERATOR_SET";

/// Environment variable to reject filters containing SQL keywords
pub const ENV_VALIDATOR_BLOCK: &str = "FILTERQL_VALIDATOR_BLOCK";

// =============================================================================
// Parser Defaults
// =============================================================================

/// Maximum number of filters allowed
pub const DEFAULT_MAX_PREDICATES: usize = 50;

/// Maximum size of filter JSON in bytes (64KB)
pub const DEFAULT_MAX_FILTER_JSON_BYTES: usize = 64 * 1024;
