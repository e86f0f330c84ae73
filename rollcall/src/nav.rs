//! Which screen is showing, and how we got there.

use log::debug;

use crate::api::{Class, College, Event, Ngo, Student};
use crate::session::{Credentials, Role, Session};

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Home,
    Login(Role),
    NgoEvents { ngo: Ngo },
    EventInfo { event: Event },
    SelectCollege { event: Event },
    StudentsList { event: Event, college: College },
    AttendanceRecords { event: Event },
    CollegeClasses { college: College },
    ClassStudents { college: College, class: Class },
    StudentEvents { student: Student },
    AdminPanel,
    Log,
}

impl Route {
    /// The role a session must have for this screen to make sense.
    pub fn required_role(&self) -> Option<Role> {
        match self {
            Self::Home | Self::Login(_) | Self::Log => None,
            Self::NgoEvents { .. }
            | Self::EventInfo { .. }
            | Self::SelectCollege { .. }
            | Self::StudentsList { .. }
            | Self::AttendanceRecords { .. } => Some(Role::Ngo),
            Self::CollegeClasses { .. }
            | Self::ClassStudents { .. }
            | Self::StudentEvents { .. } => Some(Role::College),
            Self::AdminPanel => Some(Role::Admin),
        }
    }

    pub fn title(&self) -> String {
        match self {
            Self::Home => "Home".to_string(),
            Self::Login(role) => format!("{} Login", role.label()),
            Self::NgoEvents { ngo } => format!("Events of {}", ngo.name),
            Self::EventInfo { event } => format!("Event: {}", event.aim),
            Self::SelectCollege { event } => format!("Select college for {}", event.aim),
            Self::StudentsList { event, college } => {
                format!("Attendance for {} at {}", event.aim, college.name)
            }
            Self::AttendanceRecords { event } => format!("Attendance records of {}", event.aim),
            Self::CollegeClasses { college } => format!("Classes of {}", college.name),
            Self::ClassStudents { class, .. } => format!("Students of {}", class.class_name),
            Self::StudentEvents { student } => format!("Events attended by {}", student.name),
            Self::AdminPanel => "Admin Panel".to_string(),
            Self::Log => "Log".to_string(),
        }
    }

    /// The screen a freshly logged in user lands on.
    ///
    /// NGOs and colleges see their own workspace, so the identity must
    /// describe one. Returns `None` if it doesn't.
    pub fn workspace(credentials: &Credentials) -> Option<Self> {
        let identity = credentials.identity.0.clone();
        match credentials.role {
            Role::Ngo => serde_json::from_value(identity)
                .ok()
                .map(|ngo| Self::NgoEvents { ngo }),
            Role::College => serde_json::from_value(identity)
                .ok()
                .map(|college| Self::CollegeClasses { college }),
            Role::Admin => Some(Self::AdminPanel),
        }
    }
}

pub trait Navigator {
    /// Show a new screen on top of the current one.
    fn navigate(&mut self, route: Route);

    /// Return to the previous screen. Returns `false` if already at the root.
    fn go_back(&mut self) -> bool;

    /// Forget the history and show only `route`.
    fn reset(&mut self, route: Route);

    fn current(&self) -> &Route;
}

/// A history of screens. Never empty.
#[derive(Debug, Clone)]
pub struct NavStack {
    root: Route,
    above: Vec<Route>,
}

impl NavStack {
    pub fn new(root: Route) -> Self {
        Self {
            root,
            above: vec![],
        }
    }

    /// Start at home, or in the workspace of a restored session.
    pub fn for_session(session: &Session) -> Self {
        let mut stack = Self::new(Route::Home);
        if let Some(workspace) = session.credentials().and_then(Route::workspace) {
            stack.navigate(workspace);
        }
        stack
    }

    pub fn depth(&self) -> usize {
        self.above.len() + 1
    }
}

impl Navigator for NavStack {
    fn navigate(&mut self, route: Route) {
        debug!("navigating to {}", route.title());
        self.above.push(route);
    }

    fn go_back(&mut self) -> bool {
        self.above.pop().is_some()
    }

    fn reset(&mut self, route: Route) {
        debug!("resetting navigation to {}", route.title());
        self.root = route;
        self.above.clear();
    }

    fn current(&self) -> &Route {
        self.above.last().unwrap_or(&self.root)
    }
}
