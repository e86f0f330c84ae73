mod admin;
mod college;
mod form;
mod home;
mod login;
mod logs;
mod ngo;
mod prompt;

use std::fmt;
use std::io;

use jiff::tz::TimeZone;
use log::{debug, error, warn};
use rustyline::error::ReadlineError;

use crate::api::Backend;
use crate::logger::Logger;
use crate::nav::{NavStack, Navigator, Route};
use crate::session::SessionManager;

pub use self::prompt::{Prompt, Terminal};

/// Error for anything that can go wrong while talking to the user.
#[derive(Debug, thiserror::Error)]
pub enum UiError {
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Readline(#[from] ReadlineError),
}

/// What a screen wants to happen next.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Navigate(Route),
    /// Show `route` instead of the current screen.
    Replace(Route),
    Back,
    Reset(Route),
    Stay,
    Quit,
}

/// Everything a screen may use.
pub struct Ctx<'a> {
    pub session: &'a SessionManager,
    pub backend: &'a dyn Backend,
    pub prompt: &'a mut dyn Prompt,
    pub logger: &'a Logger,
    pub time_zone: &'a TimeZone,
}

impl Ctx<'_> {
    /// Tell the user something failed. The details also go to the log.
    fn report(&mut self, title: &str, err: &dyn fmt::Display) {
        warn!("{title}: {err}");
        self.prompt.alert(title, &err.to_string());
    }

    /// Log out and go home. Shared by every workspace.
    async fn logout(&mut self) -> Transition {
        if let Err(err) = self.session.logout().await {
            error!("failed to log out: {err}");
            self.prompt.alert("Logout failed", &err.to_string());
            return Transition::Stay;
        }
        self.backend.forget_cookies().await;
        Transition::Reset(Route::Home)
    }
}

async fn show(ctx: &mut Ctx<'_>, route: &Route) -> Result<Transition, UiError> {
    ctx.prompt.heading(&route.title());
    match route {
        Route::Home => home::show(ctx).await,
        Route::Login(role) => login::show(ctx, *role).await,
        Route::NgoEvents { ngo } => ngo::events(ctx, ngo).await,
        Route::EventInfo { event } => ngo::event_info(ctx, event).await,
        Route::SelectCollege { event } => ngo::select_college(ctx, event).await,
        Route::StudentsList { event, college } => ngo::students_list(ctx, event, college).await,
        Route::AttendanceRecords { event } => ngo::attendance_records(ctx, event).await,
        Route::CollegeClasses { college } => college::classes(ctx, college).await,
        Route::ClassStudents { college, class } => {
            college::class_students(ctx, college, class).await
        }
        Route::StudentEvents { student } => college::student_events(ctx, student).await,
        Route::AdminPanel => admin::panel(ctx).await,
        Route::Log => logs::show(ctx),
    }
}

/// Show screens until the user quits.
pub async fn run(ctx: &mut Ctx<'_>, nav: &mut NavStack) -> Result<(), UiError> {
    loop {
        let route = nav.current().clone();

        if let Some(role) = route.required_role() {
            if ctx.session.role() != Some(role) {
                debug!("{} needs a {role} session, going home", route.title());
                nav.reset(Route::Home);
                continue;
            }
        }

        debug!("showing {} at depth {}", route.title(), nav.depth());
        match show(ctx, &route).await? {
            Transition::Navigate(route) => nav.navigate(route),
            Transition::Replace(route) => {
                nav.go_back();
                nav.navigate(route);
            }
            Transition::Back => {
                if !nav.go_back() {
                    return Ok(());
                }
            }
            Transition::Reset(route) => nav.reset(route),
            Transition::Stay => {}
            Transition::Quit => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::prompt::Script;
    use super::*;
    use crate::api::testing::FakeBackend;
    use crate::api::Ngo;
    use crate::session::testing::MemoryStore;
    use crate::session::{Identity, Role, Session};

    #[tokio::test]
    async fn ngo_logs_in_and_out_from_home() {
        let store = Arc::new(MemoryStore::new());
        let session = SessionManager::hydrate(store.clone()).await.unwrap();
        let backend = FakeBackend::new()
            .with_ngos(vec![Ngo {
                id: "n1".to_string(),
                name: "NGO Alpha".to_string(),
                email: "alpha@ngo.org".to_string(),
                ..Ngo::default()
            }])
            .granting(json!({"accessToken": "tok1", "user": {"name": "NGO Alpha"}}));
        let logger = Logger::new();
        let time_zone = TimeZone::UTC;
        let mut prompt = Script::new([
            "1",         // home: NGO login
            "1",         // NGO Alpha
            "",          // keep the filled in email
            "secret123", // password
            "2",         // events: logout
            "",          // home: quit
        ]);

        let mut ctx = Ctx {
            session: &session,
            backend: &backend,
            prompt: &mut prompt,
            logger: &logger,
            time_zone: &time_zone,
        };
        let mut nav = NavStack::new(Route::Home);
        run(&mut ctx, &mut nav).await.unwrap();

        assert_eq!(prompt.remaining(), 0, "asked: {:?}", prompt.asked);
        assert!(prompt.alerts.is_empty(), "{:?}", prompt.alerts);
        assert!(prompt.saw("Events of NGO Alpha"));
        assert_eq!(session.get(), Session::LoggedOut);
        assert!(store.contents().is_empty());
        assert_eq!(backend.forgot_cookies(), 1);
        assert_eq!(backend.call_names(), ["ngos", "login", "events"]);
    }

    #[tokio::test]
    async fn workspaces_of_other_roles_are_left() {
        let store = Arc::new(MemoryStore::new());
        let session = SessionManager::hydrate(store).await.unwrap();
        session
            .login(
                Identity(json!({"email": "root@admin.org"})),
                "tok".to_string(),
                None,
                Role::Admin,
            )
            .await
            .unwrap();
        let backend = FakeBackend::new();
        let logger = Logger::new();
        let time_zone = TimeZone::UTC;
        let mut prompt = Script::new([""]);

        let mut ctx = Ctx {
            session: &session,
            backend: &backend,
            prompt: &mut prompt,
            logger: &logger,
            time_zone: &time_zone,
        };
        let mut nav = NavStack::new(Route::Home);
        nav.navigate(Route::CollegeClasses {
            college: Default::default(),
        });
        run(&mut ctx, &mut nav).await.unwrap();

        assert_eq!(nav.current(), &Route::Home);
        assert!(backend.calls().is_empty());
    }
}
