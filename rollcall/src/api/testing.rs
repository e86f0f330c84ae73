use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{json, Value};

use super::*;
use crate::session::Role;

/// An in-process backend that answers from canned data and remembers what it
/// was asked.
#[derive(Default)]
pub struct FakeBackend {
    ngos: Vec<Ngo>,
    colleges: Vec<College>,
    events: Vec<Event>,
    report: AttendanceReport,
    login_body: Value,
    rejection: Option<String>,
    watched: Option<SessionManager>,
    calls: Mutex<Vec<(String, Value)>>,
    roles_at_login: Mutex<Vec<Option<Role>>>,
    forgot_cookies: Mutex<usize>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            login_body: json!({"accessToken": "tok"}),
            ..Self::default()
        }
    }

    pub fn with_ngos(mut self, ngos: Vec<Ngo>) -> Self {
        self.ngos = ngos;
        self
    }

    pub fn with_colleges(mut self, colleges: Vec<College>) -> Self {
        self.colleges = colleges;
        self
    }

    pub fn with_events(mut self, events: Vec<Event>) -> Self {
        self.events = events;
        self
    }

    pub fn with_report(mut self, report: AttendanceReport) -> Self {
        self.report = report;
        self
    }

    /// What the login endpoint responds with.
    pub fn granting(mut self, body: Value) -> Self {
        self.login_body = body;
        self
    }

    /// Make every call fail with this message.
    pub fn rejecting(mut self, message: &str) -> Self {
        self.rejection = Some(message.to_string());
        self
    }

    /// Record the session's role whenever login is called.
    pub fn watching(mut self, session: SessionManager) -> Self {
        self.watched = Some(session);
        self
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }

    pub fn call_names(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn roles_at_login(&self) -> Vec<Option<Role>> {
        self.roles_at_login.lock().clone()
    }

    pub fn forgot_cookies(&self) -> usize {
        *self.forgot_cookies.lock()
    }

    fn record<B: Serialize + ?Sized>(&self, name: &str, body: &B) -> Result<(), ApiError> {
        let body = serde_json::to_value(body).unwrap_or(Value::Null);
        self.calls.lock().push((name.to_string(), body));
        match &self.rejection {
            Some(message) => Err(ApiError::Rejected {
                status: 400,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn login(&self, request: &LoginRequest) -> Result<LoginGrant, ApiError> {
        if let Some(session) = &self.watched {
            self.roles_at_login.lock().push(session.role());
        }
        self.record("login", request)?;
        LoginGrant::from_body(&self.login_body).ok_or(ApiError::MissingToken)
    }

    async fn colleges(&self) -> Result<Vec<College>, ApiError> {
        self.record("colleges", &Value::Null)?;
        Ok(self.colleges.clone())
    }

    async fn ngos(&self) -> Result<Vec<Ngo>, ApiError> {
        self.record("ngos", &Value::Null)?;
        Ok(self.ngos.clone())
    }

    async fn events(&self) -> Result<Vec<Event>, ApiError> {
        self.record("events", &Value::Null)?;
        Ok(self.events.clone())
    }

    async fn event_attendance(&self, event_id: &str) -> Result<AttendanceReport, ApiError> {
        self.record("event_attendance", event_id)?;
        Ok(self.report.clone())
    }

    async fn add_ngo(&self, ngo: &NewNgo) -> Result<(), ApiError> {
        self.record("add_ngo", ngo)
    }

    async fn add_college(&self, college: &NewCollege) -> Result<(), ApiError> {
        self.record("add_college", college)
    }

    async fn add_class(&self, class: &NewClass) -> Result<(), ApiError> {
        self.record("add_class", class)
    }

    async fn add_students(&self, students: &NewStudents) -> Result<(), ApiError> {
        self.record("add_students", students)
    }

    async fn add_event(&self, event: &NewEvent) -> Result<(), ApiError> {
        self.record("add_event", event)
    }

    async fn submit_attendance(&self, attendance: &Attendance) -> Result<(), ApiError> {
        self.record("submit_attendance", attendance)
    }

    async fn forget_cookies(&self) {
        *self.forgot_cookies.lock() += 1;
    }
}
