use thiserror::Error;

// The three failure kinds the portal can produce. Callers branch on the kind:
// a Login failure is fixed by authenticating again, a Request failure by
// retrying later, and an Unknown failure is not recoverable here.
#[derive(Debug, Error)]
pub enum Error {
    #[error("login failed: {0}")]
    Login(&'static str),
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("unknown error: {0}")]
    Unknown(String),
}
