//! Signavio API client
//!
//! Handles login, user listing, user deletion and job status polling against
//! the Signavio REST API. Every call is a single request; the session token
//! obtained at login is attached to every following request.

use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use super::http::{default_headers, with_session, HttpResponse, HttpTransport};
use super::multipart::{csv_file_part, email_csv};
use crate::config::Config;
use crate::domain::result::{Error, Result};
use crate::domain::{Job, JobUpdate, User};
use crate::ports::{SeatProvider, UserPage};

pub const LOGIN_PATH: &str = "/p/login";
pub const USERS_PATH: &str = "/p/user";
pub const DELETE_USER_PATH: &str = "/api/v2/user-jobs/delete";
pub const JOB_STATUS_PATH: &str = "/api/v2/user-jobs/";

/// Users requested per listing call
pub const PAGE_SIZE: usize = 200;
/// Server-side timeout requested for the listing call, in milliseconds
const LIST_TIMEOUT_MS: u64 = 900_000;

/// Cookie set by a successful login
pub const SESSION_COOKIE: &str = "token";

// =============================================================================
// API Response Models
// =============================================================================

/// Entry of the user listing: `{rel, href, rep: {mail, ...}}`.
///
/// The listing also contains non-user records (e.g. `rel: "info"`) whose
/// `rep` has no `mail`.
#[derive(Debug, Deserialize)]
struct UserRecord {
    #[serde(default)]
    rep: Option<UserRep>,
}

#[derive(Debug, Deserialize)]
struct UserRep {
    #[serde(default)]
    mail: Option<String>,
}

impl UserRecord {
    fn into_user(self) -> Option<User> {
        self.rep.and_then(|rep| rep.mail).map(User::new)
    }
}

// =============================================================================
// Signavio HTTP Client
// =============================================================================

/// Signavio API client
pub struct SignavioClient {
    transport: HttpTransport,
    base_url: String,
    tenant: String,
    user: String,
    password: String,
    session: Option<String>,
}

impl fmt::Debug for SignavioClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignavioClient")
            .field("base_url", &self.base_url)
            .field("tenant", &self.tenant)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("logged_in", &self.session.is_some())
            .finish()
    }
}

impl SignavioClient {
    /// Create a client for `base_url` (e.g. `https://editor.signavio.com`)
    pub fn new(
        tenant: &str,
        base_url: &str,
        user: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self> {
        if base_url.trim().is_empty() {
            return Err(Error::config("Signavio URL cannot be empty"));
        }

        Ok(Self {
            transport: HttpTransport::new(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            tenant: tenant.to_string(),
            user: user.to_string(),
            password: password.to_string(),
            session: None,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.tenant,
            &config.url,
            &config.user,
            &config.password,
            config.request_timeout,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Default headers plus the session header once logged in
    fn headers(&self) -> Result<HeaderMap> {
        match &self.session {
            Some(token) => with_session(default_headers(), token),
            None => Ok(default_headers()),
        }
    }

    fn users_path(offset: usize) -> String {
        format!(
            "{}?count={}&offset={}&excludeLicenses=true&timeout={}&",
            USERS_PATH, PAGE_SIZE, offset, LIST_TIMEOUT_MS
        )
    }

    /// Check response status and return appropriate errors
    fn check_response_status(
        &self,
        operation: &'static str,
        expected: u16,
        response: &HttpResponse,
    ) -> Result<()> {
        match response.status {
            status if status == expected => Ok(()),
            401 | 403 => Err(Error::auth(format!(
                "{} was rejected with HTTP {}, response was {:?}",
                operation,
                response.status,
                response.text()
            ))),
            status => Err(Error::Api {
                operation,
                status,
                body: response.text(),
            }),
        }
    }
}

impl SeatProvider for SignavioClient {
    fn login(&mut self) -> Result<()> {
        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("name", &self.user)
            .append_pair("password", &self.password)
            .append_pair("tokenonly", "true")
            .append_pair("tenant", &self.tenant)
            .finish();

        let mut headers = default_headers();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );

        let response = self.transport.send(
            Method::POST,
            &self.url(LOGIN_PATH),
            headers,
            Some(form.into_bytes().into()),
        )?;

        if response.status != 200 {
            return Err(Error::auth(format!(
                "login failed, response status was {}",
                response.status
            )));
        }

        let token = response
            .cookie(SESSION_COOKIE)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::auth("login failed, no session cookie found"))?;

        self.session = Some(token.to_string());
        Ok(())
    }

    fn list_users_page(&self, offset: usize) -> Result<UserPage> {
        let response = self.transport.send(
            Method::GET,
            &self.url(&Self::users_path(offset)),
            self.headers()?,
            None,
        )?;
        self.check_response_status("get users", 200, &response)?;

        let records: Vec<UserRecord> = serde_json::from_slice(&response.body)?;
        let total = records.len();
        let users: Vec<User> = records.into_iter().filter_map(UserRecord::into_user).collect();
        debug!(offset, records = total, users = users.len(), "Fetched user page");

        // The page size counts info records as well
        let next_offset = (total >= PAGE_SIZE).then_some(offset + PAGE_SIZE);
        Ok(UserPage { users, next_offset })
    }

    fn delete_user(&self, user: &User) -> Result<Job> {
        let csv = email_csv(&[user.email.as_str()])?;
        let upload = csv_file_part(&csv)?;
        debug!(content_type = %upload.content_type, "Uploading delete request");

        let response = self.transport.send(
            Method::POST,
            &self.url(DELETE_USER_PATH),
            self.headers()?,
            Some(upload.form.into()),
        )?;
        self.check_response_status("schedule delete request", 201, &response)?;

        Ok(serde_json::from_slice(&response.body)?)
    }

    fn refresh_job(&self, job: &mut Job) -> Result<()> {
        let url = self.url(&format!("{}{}", JOB_STATUS_PATH, job.id));
        let response = self.transport.send(Method::GET, &url, self.headers()?, None)?;
        self.check_response_status("get job status", 200, &response)?;

        let update: JobUpdate = serde_json::from_slice(&response.body)?;
        job.apply(update);
        Ok(())
    }
}
