//! What the backend sends and receives.
//!
//! Incoming types are lenient: every field has a default, ids may be called
//! `_id` or `id`, and free-text fields accept whatever scalar the backend
//! stored. The backend has changed shapes often enough that failing on a
//! single odd field would mostly just hide data.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::session::{Identity, Role};

/// Render any JSON value as text. Numbers keep their digits, arrays are
/// joined with commas, null and objects become empty.
fn as_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Array(items) => items
            .into_iter()
            .map(as_text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null | Value::Object(_) => String::new(),
    }
}

fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Value::deserialize(deserializer).map(as_text)
}

/// A reference that the backend may or may not have populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ref<T> {
    Full(T),
    Id(String),
}

impl<T> Ref<T> {
    pub fn full(&self) -> Option<&T> {
        match self {
            Self::Full(value) => Some(value),
            Self::Id(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Ngo {
    #[serde(rename = "_id", alias = "id", deserialize_with = "text")]
    pub id: String,
    #[serde(deserialize_with = "text")]
    pub name: String,
    #[serde(deserialize_with = "text")]
    pub email: String,
    #[serde(deserialize_with = "text")]
    pub address: String,
    #[serde(deserialize_with = "text")]
    pub mobile: String,
    #[serde(deserialize_with = "text")]
    pub registration_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct College {
    #[serde(rename = "_id", alias = "id", deserialize_with = "text")]
    pub id: String,
    #[serde(deserialize_with = "text")]
    pub name: String,
    #[serde(deserialize_with = "text")]
    pub email: String,
    #[serde(deserialize_with = "text")]
    pub address: String,
    #[serde(deserialize_with = "text")]
    pub mobile: String,
    pub classes: Vec<Class>,
}

impl College {
    pub fn students(&self) -> impl Iterator<Item = (&Class, &Student)> {
        self.classes
            .iter()
            .flat_map(|class| class.students.iter().map(move |student| (class, student)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Class {
    #[serde(rename = "_id", alias = "id", deserialize_with = "text")]
    pub id: String,
    #[serde(rename = "className", alias = "name", deserialize_with = "text")]
    pub class_name: String,
    pub students: Vec<Student>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Student {
    #[serde(rename = "_id", alias = "id", deserialize_with = "text")]
    pub id: String,
    #[serde(deserialize_with = "text")]
    pub name: String,
    #[serde(alias = "PRN", alias = "roll", alias = "regNo", deserialize_with = "text")]
    pub prn: String,
    #[serde(deserialize_with = "text")]
    pub department: String,
    #[serde(deserialize_with = "text")]
    pub email: String,
    pub attended_events: Vec<AttendedEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendedEvent {
    #[serde(rename = "eventId", default)]
    pub event: Option<Ref<Event>>,
    #[serde(default)]
    pub attendance_marked_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "_id", alias = "id", deserialize_with = "text")]
    pub id: String,
    #[serde(deserialize_with = "text")]
    pub aim: String,
    #[serde(deserialize_with = "text")]
    pub location: String,
    #[serde(deserialize_with = "text")]
    pub description: String,
    #[serde(deserialize_with = "text")]
    pub images: String,
    pub event_date: Option<String>,
    pub created_by: Option<Ref<Ngo>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AttendanceReport {
    pub event: Option<Event>,
    pub attendance: Vec<AttendanceEntry>,
    #[serde(rename = "totalStudentsPresent")]
    pub total_present: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AttendanceEntry {
    #[serde(deserialize_with = "text")]
    pub name: String,
    #[serde(deserialize_with = "text")]
    pub department: String,
    #[serde(rename = "classId")]
    pub class: Option<Ref<Class>>,
    pub attendance_marked_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(rename = "userType")]
    pub role: Role,
}

/// What a successful login hands back.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: Option<Identity>,
}

impl LoginGrant {
    /// Pick the grant out of a login response body.
    ///
    /// The token is `accessToken`, or `token` on older backends. Returns
    /// `None` if neither holds a non-empty string.
    pub fn from_body(body: &Value) -> Option<Self> {
        let non_empty = |key: &str| {
            body.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let access_token = non_empty("accessToken").or_else(|| non_empty("token"))?;
        let user = body
            .get("user")
            .filter(|user| !user.is_null())
            .cloned()
            .map(Identity);

        Some(Self {
            access_token,
            refresh_token: non_empty("refreshToken"),
            user,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNgo {
    pub name: String,
    pub email: String,
    pub address: String,
    pub password: String,
    pub mobile: String,
    pub registration_number: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewCollege {
    pub name: String,
    pub email: String,
    pub address: String,
    pub password: String,
    pub mobile: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClass {
    pub class_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewStudent {
    pub name: String,
    pub department: String,
    pub email: String,
    pub prn: String,
}

impl NewStudent {
    fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            department: self.department.trim().to_string(),
            email: self.email.trim().to_string(),
            prn: self.prn.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudents {
    pub class_id: String,
    pub students: Vec<NewStudent>,
}

impl NewStudents {
    /// Trims every field and drops rows without a name.
    pub fn new(class_id: String, drafts: &[NewStudent]) -> Self {
        let students = drafts
            .iter()
            .map(NewStudent::trimmed)
            .filter(|s| !s.name.is_empty())
            .collect();
        Self { class_id, students }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub location: String,
    pub aim: String,
    pub description: String,
    pub images: String,
    /// RFC 3339 timestamp.
    pub event_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub student_ids: Vec<String>,
    pub event_id: String,
    pub college_id: String,
}
