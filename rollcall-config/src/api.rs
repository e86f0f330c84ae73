use serde::Deserialize;

use crate::doc::{Doc, Document};

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Document)]
pub struct Api {
    /// Base URL of the attendance backend. All endpoint paths are resolved
    /// relative to it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// How long to wait for a single request to complete, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    #[document(no_default)]
    pub endpoints: Endpoints,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
            endpoints: Endpoints::default(),
        }
    }
}

/// Paths of the individual backend endpoints.
///
/// The backend has moved these around before, so they are configurable
/// instead of hard-coded.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub login: String,
    pub all_colleges: String,
    pub all_ngos: String,
    pub add_ngo: String,
    pub add_college: String,
    pub add_class: String,
    pub add_students: String,
    pub events: String,
    pub attendance: String,
    pub event_attendance: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "/api/auth/login".to_string(),
            all_colleges: "/api/college/all".to_string(),
            all_ngos: "/api/ngo/all".to_string(),
            add_ngo: "/api/admin/ngo".to_string(),
            add_college: "/api/admin/college".to_string(),
            add_class: "/api/college/class".to_string(),
            add_students: "/api/college/students".to_string(),
            events: "/api/ngo/events".to_string(),
            attendance: "/api/ngo/attendance".to_string(),
            event_attendance: "/api/ngo/event/{event}/attendance".to_string(),
        }
    }
}

impl Endpoints {
    /// The attendance report path for a single event.
    pub fn event_attendance_for(&self, event_id: &str) -> String {
        self.event_attendance.replace("{event}", event_id)
    }
}

// Written by hand so every path shows up with its default value.
impl Document for Endpoints {
    fn doc() -> Doc {
        let defaults = Self::default();
        let paths = [
            ("login", defaults.login, "Login, used by all three roles."),
            ("all_colleges", defaults.all_colleges, "List of all colleges."),
            ("all_ngos", defaults.all_ngos, "List of all NGOs."),
            ("add_ngo", defaults.add_ngo, "Register a new NGO (admin)."),
            ("add_college", defaults.add_college, "Register a new college (admin)."),
            ("add_class", defaults.add_class, "Add a class (college)."),
            ("add_students", defaults.add_students, "Add students to a class (college)."),
            ("events", defaults.events, "List and create events (NGO)."),
            ("attendance", defaults.attendance, "Submit attendance for an event (NGO)."),
            (
                "event_attendance",
                defaults.event_attendance,
                "Attendance report of one event. `{event}` is replaced by the event id.",
            ),
        ];

        let mut doc = Doc::default();
        for (name, default, description) in paths {
            let mut field = String::doc();
            field.description = Some(description.to_string());
            field.value_info.default = Some(crate::doc::toml_value_as_markdown(&default));
            doc.struct_info.fields.insert(name.to_string(), Box::new(field));
        }
        doc
    }
}
