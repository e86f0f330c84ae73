//! Logging in as one of the three roles.
//!
//! NGOs and colleges first pick themselves from a list fetched from the
//! backend, which also fills in their email. Admins only enter credentials.

use log::info;
use serde_json::json;

use super::form::{self, Menu};
use super::{Ctx, Transition, UiError};
use crate::api::{ApiError, Backend, College, LoginRequest, Ngo};
use crate::nav::Route;
use crate::session::{Identity, Role, SessionManager, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("Please select {}", article(.0))]
    NothingSelected(Role),
    #[error("Please enter email and password")]
    MissingCredentials,
    #[error("A login is already in progress")]
    InProgress,
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("could not save the session: {0}")]
    Store(#[from] StoreError),
}

fn article(role: &Role) -> &'static str {
    match role {
        Role::Ngo => "an NGO",
        Role::College => "a college",
        Role::Admin => "an admin",
    }
}

/// Someone that can log in.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Ngo(Ngo),
    College(College),
}

impl Entity {
    pub fn name(&self) -> &str {
        match self {
            Self::Ngo(ngo) => &ngo.name,
            Self::College(college) => &college.name,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Self::Ngo(ngo) => &ngo.email,
            Self::College(college) => &college.email,
        }
    }

    fn identity(&self) -> Identity {
        let value = match self {
            Self::Ngo(ngo) => serde_json::to_value(ngo),
            Self::College(college) => serde_json::to_value(college),
        };
        Identity(value.unwrap_or_else(|_| json!({ "name": self.name() })))
    }

    fn workspace(&self) -> Route {
        match self {
            Self::Ngo(ngo) => Route::NgoEvents { ngo: ngo.clone() },
            Self::College(college) => Route::CollegeClasses {
                college: college.clone(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginForm {
    pub role: Role,
    pub entities: Vec<Entity>,
    selected: Option<usize>,
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            entities: vec![],
            selected: None,
            email: String::new(),
            password: String::new(),
        }
    }

    fn needs_entity(&self) -> bool {
        self.role != Role::Admin
    }

    pub async fn load_entities(&mut self, backend: &dyn Backend) -> Result<(), ApiError> {
        self.entities = match self.role {
            Role::Ngo => backend.ngos().await?.into_iter().map(Entity::Ngo).collect(),
            Role::College => backend
                .colleges()
                .await?
                .into_iter()
                .map(Entity::College)
                .collect(),
            Role::Admin => vec![],
        };
        self.selected = None;
        Ok(())
    }

    /// Pick an entity and fill in its email.
    pub fn select(&mut self, index: usize) {
        if let Some(entity) = self.entities.get(index) {
            self.email = entity.email().to_string();
            self.selected = Some(index);
        }
    }

    pub fn selected(&self) -> Option<&Entity> {
        self.entities.get(self.selected?)
    }

    pub fn validate(&self) -> Result<(), LoginError> {
        if self.needs_entity() && self.selected().is_none() {
            return Err(LoginError::NothingSelected(self.role));
        }
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(LoginError::MissingCredentials);
        }
        Ok(())
    }

    /// Log in and return the workspace to show.
    ///
    /// A session of another role is logged out before the backend is asked.
    /// If the backend then refuses, the client ends up logged out.
    pub async fn submit(
        &self,
        session: &SessionManager,
        backend: &dyn Backend,
    ) -> Result<Route, LoginError> {
        self.validate()?;
        let _ticket = session.begin_login().ok_or(LoginError::InProgress)?;

        session.switch_role(self.role).await?;

        let email = self.email.trim().to_string();
        let request = LoginRequest {
            email: email.clone(),
            password: self.password.clone(),
            role: self.role,
        };
        let grant = backend.login(&request).await?;

        let identity = grant
            .user
            .or_else(|| self.selected().map(Entity::identity))
            .unwrap_or_else(|| Identity(json!({ "email": email })));
        session
            .login(identity, grant.access_token, grant.refresh_token, self.role)
            .await?;

        Ok(match self.selected() {
            Some(entity) => entity.workspace(),
            None => Route::AdminPanel,
        })
    }
}

fn plural(role: Role) -> &'static str {
    match role {
        Role::Ngo => "NGOs",
        Role::College => "colleges",
        Role::Admin => "admins",
    }
}

pub async fn show(ctx: &mut Ctx<'_>, role: Role) -> Result<Transition, UiError> {
    let mut form = LoginForm::new(role);

    if form.needs_entity() {
        if let Err(err) = form.load_entities(ctx.backend).await {
            ctx.report(&format!("Failed to load {}", plural(role)), &err);
            return Ok(Transition::Back);
        }
        if form.entities.is_empty() {
            ctx.prompt
                .alert("Nothing to log in as", &format!("No {} found", plural(role)));
            return Ok(Transition::Back);
        }

        let mut menu = Menu::new();
        for (i, entity) in form.entities.iter().enumerate() {
            menu.push(entity.name(), i);
        }
        let Some(index) = menu.choose(ctx.prompt)? else {
            return Ok(Transition::Back);
        };
        form.select(index);
    }

    // A failed attempt keeps the selection and the email.
    loop {
        let Some(email) = form::field_or(ctx.prompt, "Email", &form.email)? else {
            return Ok(Transition::Back);
        };
        form.email = email;
        let Some(password) = ctx.prompt.secret("Password")? else {
            return Ok(Transition::Back);
        };
        form.password = password;

        match form.submit(ctx.session, ctx.backend).await {
            Ok(workspace) => {
                info!("{} login succeeded", role.label());
                return Ok(Transition::Replace(workspace));
            }
            Err(err) => ctx.report("Login failed", &err),
        }
    }
}
