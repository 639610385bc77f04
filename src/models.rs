use serde::{Deserialize, Serialize};

// Weight the register assumes when a grade carries no weight badge.
pub const DEFAULT_WEIGHT: u32 = 100;

// Session markers handed back by the portal after a successful login. They are
// sent back verbatim with every later request; the portal invalidates them
// server-side, there is no local expiry tracking.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub key: String,
    pub user: String,
}

// Login credentials, used only to build the login form and never persisted.
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

// A single grade as scraped from the register. `weight` is a percentage.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GradeRecord {
    pub value: f64,
    pub subject: String,
    pub weight: u32,
}
