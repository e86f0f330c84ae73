use super::form::Menu;
use super::{Ctx, Transition, UiError};
use crate::nav::Route;
use crate::session::Role;

enum Action {
    Login(Role),
    Resume(Route),
    Logout,
    Log,
    Quit,
}

pub async fn show(ctx: &mut Ctx<'_>) -> Result<Transition, UiError> {
    let session = ctx.session.get();
    let mut menu = Menu::new();

    if let Some(credentials) = session.credentials() {
        ctx.prompt.show(&format!(
            "Logged in as {} {}",
            credentials.role.label(),
            credentials.identity.display_name()
        ));
        if let Some(workspace) = Route::workspace(credentials) {
            menu.push("Continue to workspace", Action::Resume(workspace));
        }
        menu.push("Logout", Action::Logout);
    }

    for role in Role::ALL {
        menu.push(format!("{} Login", role.label()), Action::Login(role));
    }
    menu.push("View log", Action::Log);
    menu.push("Quit", Action::Quit);

    Ok(match menu.choose(ctx.prompt)? {
        Some(Action::Login(role)) => Transition::Navigate(Route::Login(role)),
        Some(Action::Resume(workspace)) => Transition::Navigate(workspace),
        Some(Action::Logout) => ctx.logout().await,
        Some(Action::Log) => Transition::Navigate(Route::Log),
        Some(Action::Quit) | None => Transition::Quit,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use jiff::tz::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::api::testing::FakeBackend;
    use crate::logger::Logger;
    use crate::session::testing::MemoryStore;
    use crate::session::{Identity, SessionManager};
    use crate::ui::prompt::Script;

    #[tokio::test]
    async fn restored_sessions_can_resume_or_log_out() {
        let session = SessionManager::hydrate(Arc::new(MemoryStore::new()))
            .await
            .unwrap();
        session
            .login(
                Identity(json!({"_id": "c1", "name": "Beta College"})),
                "tok".to_string(),
                None,
                Role::College,
            )
            .await
            .unwrap();
        let backend = FakeBackend::new();
        let logger = Logger::new();
        let time_zone = TimeZone::UTC;
        let mut prompt = Script::new(["1", "2"]);
        let mut ctx = Ctx {
            session: &session,
            backend: &backend,
            prompt: &mut prompt,
            logger: &logger,
            time_zone: &time_zone,
        };

        let Transition::Navigate(Route::CollegeClasses { college }) = show(&mut ctx).await.unwrap()
        else {
            panic!("expected to resume the college workspace");
        };
        assert_eq!(college.id, "c1");

        assert_eq!(show(&mut ctx).await.unwrap(), Transition::Reset(Route::Home));
        assert!(!session.get().is_authenticated());
        assert!(prompt.saw("Logged in as College Beta College"));
    }
}
