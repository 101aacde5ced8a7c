//! Onboarding steps and the profile editor.

use std::collections::BTreeSet;

use futures::future::try_join_all;
use tracing::{info, instrument};

use super::{dto::User, services::UserService};
use crate::{
    catalog::{Goal, SkinType},
    error::{ClientError, Result},
    navigation::{Navigator, Route},
    session::SessionStore,
    state::AppState,
};

fn require_goals(goals: &BTreeSet<Goal>) -> Result<()> {
    if goals.is_empty() {
        return Err(ClientError::Validation("Select at least one goal".into()));
    }
    Ok(())
}

/// Saves the skin type picked during onboarding and moves on to goals.
#[instrument(skip(app))]
pub async fn choose_skin_type(app: &AppState, skin_type: SkinType) -> Result<User> {
    let user = app.session.require_user().await?;
    app.users.set_skin_type(user.id, skin_type).await?;
    let user = app
        .session
        .update_user(|u| u.skin_type = Some(skin_type))
        .await?;
    app.router.replace(Route::GoalsOnboarding);
    Ok(user)
}

/// Saves the onboarding goals, all requests in parallel, and opens home.
#[instrument(skip(app))]
pub async fn choose_goals(app: &AppState, goals: &[Goal]) -> Result<User> {
    let goals: BTreeSet<Goal> = goals.iter().copied().collect();
    require_goals(&goals)?;
    let user = app.session.require_user().await?;
    try_join_all(goals.iter().map(|g| app.users.add_goal(user.id, *g))).await?;
    let user = app
        .session
        .update_user(|u| u.goals = goals.into_iter().collect())
        .await?;
    info!(user_id = user.id, goals = user.goals.len(), "onboarding finished");
    app.router.replace(Route::Home);
    Ok(user)
}

/// Pending edits of the profile screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDraft {
    pub skin_type: Option<SkinType>,
    pub goals: BTreeSet<Goal>,
}

pub struct ProfileEditor {
    users: UserService,
    session: SessionStore,
    profile: User,
    draft: Option<ProfileDraft>,
}

impl ProfileEditor {
    /// Fetches the profile and refreshes the stored copy of the user.
    #[instrument(skip(app))]
    pub async fn load(app: &AppState) -> Result<Self> {
        let user = app.session.require_user().await?;
        let profile = app.users.profile(user.id).await?;
        let fresh = profile.clone();
        app.session.update_user(move |u| *u = fresh).await?;
        Ok(Self {
            users: app.users.clone(),
            session: app.session.clone(),
            profile,
            draft: None,
        })
    }

    pub fn profile(&self) -> &User {
        &self.profile
    }

    pub fn draft(&self) -> Option<&ProfileDraft> {
        self.draft.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.draft.is_some()
    }

    pub fn begin_edit(&mut self) -> &mut ProfileDraft {
        let profile = &self.profile;
        self.draft.get_or_insert_with(|| ProfileDraft {
            skin_type: profile.skin_type,
            goals: profile.goals.iter().copied().collect(),
        })
    }

    pub fn cancel(&mut self) {
        self.draft = None;
    }

    /// Sends only what changed: the skin type if it differs, and the goal
    /// set difference as adds and removes.
    #[instrument(skip(self))]
    pub async fn save(&mut self) -> Result<&User> {
        let Some(draft) = self.draft.clone() else {
            return Ok(&self.profile);
        };
        require_goals(&draft.goals)?;
        let user_id = self.profile.id;

        if let Some(skin_type) = draft.skin_type.filter(|s| Some(*s) != self.profile.skin_type) {
            self.users.set_skin_type(user_id, skin_type).await?;
        }

        let current: BTreeSet<Goal> = self.profile.goals.iter().copied().collect();
        let added = draft.goals.difference(&current).copied();
        let removed = current.difference(&draft.goals).copied();
        futures::try_join!(
            try_join_all(added.map(|g| self.users.add_goal(user_id, g))),
            try_join_all(removed.map(|g| self.users.remove_goal(user_id, g))),
        )?;

        let skin_type = draft.skin_type.or(self.profile.skin_type);
        let goals: Vec<Goal> = draft.goals.into_iter().collect();
        self.profile.skin_type = skin_type;
        self.profile.goals = goals.clone();
        self.session
            .update_user(|u| {
                u.skin_type = skin_type;
                u.goals = goals;
            })
            .await?;
        self.draft = None;
        info!(user_id, "profile updated");
        Ok(&self.profile)
    }
}
