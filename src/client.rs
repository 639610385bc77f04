use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::error;
use reqwest::blocking::Client;

use crate::error::Error;
use crate::models::{Credentials, GradeRecord, SessionTokens};
use crate::parser;

const TIMEOUT: Duration = Duration::from_secs(10);

// Owns the HTTP session towards the register. The portal keys the session on
// cookies, so the same client must be reused for the login and every later
// request. Blocking calls, one at a time; the portal supports nothing else.
pub struct SessionClient {
    http: Client,
    api: String,
}

impl SessionClient {
    pub fn new(api: String) -> Result<Self, Error> {
        let http = Client::builder()
            .cookie_store(true)
            .timeout(TIMEOUT)
            .build()
            .map_err(|e| Error::Unknown(format!("failed to build the HTTP client: {e}")))?;
        Ok(Self { http, api })
    }

    // Submits the login form and extracts the session tokens from the page the
    // portal answers with.
    pub fn login(&self, credentials: &Credentials) -> Result<SessionTokens, Error> {
        let login_ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        let form = [
            ("user", credentials.username.clone()),
            ("password_user", credentials.password.clone()),
            ("login_ts", login_ts.to_string()),
            ("form_login", "true".to_string()),
        ];
        let body = self.post(&form, "login")?;
        interpret_login_response(&body)
    }

    // Requests the grades view and returns the raw page, leaving parsing to
    // the caller.
    pub fn fetch_grades_page(&self, tokens: &SessionTokens) -> Result<String, Error> {
        let form = [
            ("form_stato", "studente".to_string()),
            ("stato_principale", "voti".to_string()),
            ("current_user", tokens.user.clone()),
            ("current_key", tokens.key.clone()),
            ("header", "SI".to_string()),
        ];
        let body = self.post(&form, "grades")?;
        interpret_grades_response(body)
    }

    // Fetch plus parse, the operation callers actually want.
    pub fn fetch_grades(&self, tokens: &SessionTokens) -> Result<Vec<GradeRecord>, Error> {
        let page = self.fetch_grades_page(tokens)?;
        Ok(parser::parse_grades(&page))
    }

    fn post(&self, form: &[(&str, String)], what: &'static str) -> Result<String, Error> {
        let response = self
            .http
            .post(&self.api)
            .form(form)
            .send()
            .map_err(|e| classify_transport(e, what))?;
        response.text().map_err(|e| classify_transport(e, what))
    }
}

// Timeouts and connection problems are worth retrying later; anything else
// coming out of the transport is unexpected and surfaced as such.
fn classify_transport(err: reqwest::Error, what: &'static str) -> Error {
    if err.is_timeout() || err.is_connect() || err.is_request() {
        error!("{} request failed: {}", what, err);
        Error::Request(err)
    } else {
        error!("Unexpected error during {} request: {}", what, err);
        Error::Unknown(err.to_string())
    }
}

fn interpret_login_response(body: &str) -> Result<SessionTokens, Error> {
    // The portal answers a bad login with the login page itself.
    if parser::is_login_page(body) {
        error!("Login failed: invalid credentials");
        return Err(Error::Login("invalid credentials"));
    }
    let key = parser::hidden_input(body, "current_key");
    let user = parser::hidden_input(body, "current_user");
    match (key, user) {
        (Some(key), Some(user)) if !key.is_empty() && !user.is_empty() => {
            Ok(SessionTokens { key, user })
        }
        _ => {
            // An authenticated-looking page without the session markers means
            // the portal broke its contract, not that the credentials are bad.
            error!("Login failed: missing session parameters");
            Err(Error::Unknown(
                "missing session parameters after login".to_string(),
            ))
        }
    }
}

fn interpret_grades_response(body: String) -> Result<String, Error> {
    if parser::is_login_page(&body) {
        error!("Session invalid: wrong or expired session");
        return Err(Error::Login("wrong or expired session"));
    }
    Ok(body)
}
