use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use super::dto::{AuthResponse, LoginRequest, RegisterForm, RegisterRequest};
use crate::{
    api::ApiClient,
    error::{ClientError, Result},
    navigation::{Navigator, Route},
    session::{Session, SessionStore},
    users::{dto::User, services::UserService},
};

const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex =
            Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles");
    }
    EMAIL_RE.is_match(email)
}

/// Checks a registration form and returns the normalized request.
pub fn validate_registration(form: &RegisterForm) -> Result<RegisterRequest> {
    let email = form.email.trim().to_lowercase();
    let username = form.username.trim().to_string();

    if !is_valid_email(&email) {
        return Err(ClientError::Validation("Invalid email".into()));
    }
    if username.is_empty() {
        return Err(ClientError::Validation("Username is required".into()));
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ClientError::Validation("Password too short".into()));
    }
    if form.password != form.confirm_password {
        return Err(ClientError::Validation("Passwords do not match".into()));
    }
    Ok(RegisterRequest {
        username,
        email,
        password: form.password.clone(),
    })
}

/// Current user and the operations that change it.
#[derive(Clone)]
pub struct AuthState {
    api: ApiClient,
    users: UserService,
    session: SessionStore,
    navigator: Arc<dyn Navigator>,
}

impl AuthState {
    pub fn new(
        api: ApiClient,
        users: UserService,
        session: SessionStore,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            api,
            users,
            session,
            navigator,
        }
    }

    pub async fn user(&self) -> Option<User> {
        self.session.user().await
    }

    pub async fn is_signed_in(&self) -> bool {
        self.session.token().await.is_some()
    }

    /// Loads the persisted session and routes to the first screen.
    ///
    /// A rejected token ends on `Login`, where the 401 handling already sent
    /// the app.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Route {
        let route = match self.session.load().await {
            Ok(Some(session)) => {
                info!(user_id = session.user.id, "session restored");
                match self.refresh_profile().await {
                    Err(ClientError::Unauthorized) => return Route::Login,
                    _ => Route::Home,
                }
            }
            Ok(None) => Route::Welcome,
            Err(e) => {
                warn!(error = %e, "could not read stored session");
                Route::Welcome
            }
        };
        self.navigator.replace(route.clone());
        route
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let request = LoginRequest {
            email: email.trim().to_lowercase(),
            password: password.to_string(),
        };
        let res: AuthResponse = self
            .api
            .post("/auth/login", &request)
            .await
            .map_err(|e| e.or_message("Error signing in"))?;
        self.establish(res).await?;
        let user = self.refresh_profile().await?;
        info!(user_id = user.id, "user logged in");
        self.navigator.replace(Route::Home);
        Ok(user)
    }

    /// Registers and sends the new user to skin-type onboarding.
    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let request = RegisterRequest {
            username: username.trim().to_string(),
            email: email.trim().to_lowercase(),
            password: password.to_string(),
        };
        self.register_request(request).await
    }

    /// Validates the form before registering.
    pub async fn register_form(&self, form: &RegisterForm) -> Result<User> {
        let request = validate_registration(form)?;
        self.register_request(request).await
    }

    async fn register_request(&self, request: RegisterRequest) -> Result<User> {
        let res: AuthResponse = self
            .api
            .post("/auth/register", &request)
            .await
            .map_err(|e| e.or_message("Error signing up"))?;
        let user = self.establish(res).await?;
        info!(user_id = user.id, "user registered");
        self.navigator.replace(Route::SkinTypeOnboarding);
        Ok(user)
    }

    async fn establish(&self, res: AuthResponse) -> Result<User> {
        let user = res.user();
        self.session
            .save(Session {
                token: res.token,
                user: user.clone(),
            })
            .await?;
        Ok(user)
    }

    /// Replaces the session user with the backend profile.
    ///
    /// The auth response carries no skin type or goals. When the profile
    /// cannot be fetched the stored user is kept, unless the token was
    /// rejected.
    async fn refresh_profile(&self) -> Result<User> {
        let current = self.session.require_user().await?;
        match self.users.profile(current.id).await {
            Ok(profile) => self.session.update_user(|u| *u = profile).await,
            Err(ClientError::Unauthorized) => Err(ClientError::Unauthorized),
            Err(e) => {
                warn!(error = %e, user_id = current.id, "could not refresh profile");
                Ok(current)
            }
        }
    }

    /// Forgets the session locally. The backend is not contacted.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if let Err(e) = self.session.clear().await {
            warn!(error = %e, "failed to clear stored credentials on logout");
        }
        info!("user logged out");
        self.navigator.replace(Route::Login);
    }
}
