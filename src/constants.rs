// Fundamental configuration constants
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3030;
pub const API_PATH: &str = "api";

// Token lifetime
pub const DEFAULT_TOKEN_TTL_HOURS: u64 = 24;
pub const MAX_TOKEN_TTL_HOURS: u64 = 720;
pub const MAX_TOKEN_LENGTH: usize = 4096;

// Pagination
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

// Built-in roles
pub const ADMIN_ROLE: &str = "admin";
pub const MODERATOR_ROLE: &str = "moderator";
pub const USER_ROLE: &str = "user";

// Built-in permissions
pub const PERM_USERS_READ: &str = "users.read";
pub const PERM_USERS_WRITE: &str = "users.write";
pub const PERM_USERS_DELETE: &str = "users.delete";
pub const PERM_ROLES_MANAGE: &str = "roles.manage";

// Account field limits
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;
pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MAX_NAME_LENGTH: usize = 50;

// Request bodies
pub const MAX_BODY_BYTES: u64 = 16 * 1024;

// Failed logins take at least this long
pub const LOGIN_FAILURE_FLOOR_MS: u64 = 50;
