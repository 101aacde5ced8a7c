use tracing::{info, instrument, warn};

use super::{
    dto::{Routine, RoutineType},
    editor::{steps_of, RoutineEditor, Step},
};
use crate::{
    error::{ClientError, Result},
    navigation::{Navigator, Route},
    state::AppState,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ScreenState {
    Loading,
    /// No active routine of this type yet.
    Empty,
    Loaded(Routine),
    Editing(Routine),
    Failed(String),
}

/// Day or night routine screen.
///
/// `Loading` resolves to `Empty` or `Loaded`; `Empty` becomes `Loaded`
/// through [`RoutineScreen::create_initial`]; `Loaded` and `Editing` switch
/// back and forth. A failed load ends in `Failed` and can be retried.
pub struct RoutineScreen {
    app: AppState,
    routine_type: RoutineType,
    state: ScreenState,
}

impl RoutineScreen {
    pub fn new(app: &AppState, routine_type: RoutineType) -> Self {
        Self {
            app: app.clone(),
            routine_type,
            state: ScreenState::Loading,
        }
    }

    pub fn state(&self) -> &ScreenState {
        &self.state
    }

    pub fn routine_type(&self) -> RoutineType {
        self.routine_type
    }

    /// Steps of the shown routine; empty unless a routine is loaded.
    pub fn steps(&self) -> Vec<Step> {
        match &self.state {
            ScreenState::Loaded(r) | ScreenState::Editing(r) => steps_of(r),
            _ => Vec::new(),
        }
    }

    #[instrument(skip(self), fields(routine_type = %self.routine_type))]
    pub async fn load(&mut self) -> Result<&ScreenState> {
        self.state = ScreenState::Loading;
        let result = match self.app.session.require_user().await {
            Ok(user) => self.app.routines.active(user.id, self.routine_type).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(Some(routine)) => self.state = ScreenState::Loaded(routine),
            Ok(None) => self.state = ScreenState::Empty,
            Err(e) => {
                warn!(error = %e, "failed to load routine");
                self.state = ScreenState::Failed(e.to_string());
                return Err(e);
            }
        }
        Ok(&self.state)
    }

    /// Creates the starter routine while the screen shows the empty state.
    #[instrument(skip(self), fields(routine_type = %self.routine_type))]
    pub async fn create_initial(&mut self) -> Result<&ScreenState> {
        if self.state != ScreenState::Empty {
            return Err(ClientError::Validation(
                "an active routine already exists".into(),
            ));
        }
        let user = self.app.session.require_user().await?;
        let routine = self
            .app
            .routines
            .create_initial(user.id, self.routine_type)
            .await?;
        info!(routine_id = routine.id, products = routine.products.len(), "initial routine created");
        self.state = ScreenState::Loaded(routine);
        Ok(&self.state)
    }

    /// Switches to the edit view of the loaded routine.
    pub fn edit(&mut self) -> Result<RoutineEditor> {
        let ScreenState::Loaded(routine) = &self.state else {
            return Err(ClientError::Validation("no routine to edit".into()));
        };
        let editor = RoutineEditor::new(&self.app, routine);
        self.state = ScreenState::Editing(routine.clone());
        self.app.router.replace(Route::RoutineEdit(self.routine_type));
        Ok(editor)
    }

    /// Leaves the edit view and shows the routine as stored.
    pub async fn finish_edit(&mut self, editor: RoutineEditor) -> Result<&ScreenState> {
        if !matches!(self.state, ScreenState::Editing(_)) {
            return Err(ClientError::Validation("routine is not being edited".into()));
        }
        let routine = self.app.routines.get(editor.routine_id()).await?;
        self.state = ScreenState::Loaded(routine);
        self.app.router.replace(Route::Routine(self.routine_type));
        Ok(&self.state)
    }
}

/// Both active routines, as shown on the home tab.
#[derive(Debug, Clone, PartialEq)]
pub struct HomeOverview {
    pub day: Option<Routine>,
    pub night: Option<Routine>,
}

impl HomeOverview {
    pub async fn load(app: &AppState) -> Result<Self> {
        let user = app.session.require_user().await?;
        let (day, night) = tokio::try_join!(
            app.routines.active(user.id, RoutineType::Day),
            app.routines.active(user.id, RoutineType::Night),
        )?;
        Ok(Self { day, night })
    }
}
