use tracing::{debug, info, instrument, warn};

use super::{
    dto::{Routine, RoutineType},
    services::RoutineService,
};
use crate::{
    catalog::StepKind,
    error::{ClientError, Result},
    navigation::Route,
    products::{dto::ProductSummary, services::ProductService},
    state::AppState,
};

/// One step of a routine, optionally bound to a product.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub kind: StepKind,
    pub product: Option<ProductSummary>,
}

/// Builds the ordered step list of a routine from its products.
///
/// Each product lands on the step of its category. A second product of the
/// same category and products of unknown categories are left out.
pub fn steps_of(routine: &Routine) -> Vec<Step> {
    let mut steps: Vec<Step> = Vec::new();
    for product in &routine.products {
        let Some(kind) = StepKind::for_category(&product.category) else {
            warn!(product_id = product.id, category = %product.category, "product has no routine step");
            continue;
        };
        if steps.iter().any(|s| s.kind == kind) {
            debug!(product_id = product.id, step = %kind, "step already bound; skipping product");
            continue;
        }
        steps.push(Step {
            kind,
            product: Some(product.clone().into()),
        });
    }
    steps.sort_by_key(|s| s.kind.order());
    steps
}

/// Edit view of a routine.
pub struct RoutineEditor {
    routines: RoutineService,
    products: ProductService,
    routine_id: i64,
    routine_type: RoutineType,
    steps: Vec<Step>,
}

impl RoutineEditor {
    pub fn new(app: &AppState, routine: &Routine) -> Self {
        Self {
            routines: app.routines.clone(),
            products: app.products.clone(),
            routine_id: routine.id,
            routine_type: routine.routine_type,
            steps: steps_of(routine),
        }
    }

    pub fn routine_id(&self) -> i64 {
        self.routine_id
    }

    pub fn routine_type(&self) -> RoutineType {
        self.routine_type
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, kind: StepKind) -> Option<&Step> {
        self.steps.iter().find(|s| s.kind == kind)
    }

    fn step_mut(&mut self, kind: StepKind) -> Result<&mut Step> {
        self.steps
            .iter_mut()
            .find(|s| s.kind == kind)
            .ok_or_else(|| ClientError::Validation(format!("routine has no {kind} step")))
    }

    fn allows(&self, kind: StepKind) -> bool {
        self.routine_type == RoutineType::Day || !kind.day_only()
    }

    /// Steps that can still be added to this routine.
    pub fn available_steps(&self) -> Vec<StepKind> {
        StepKind::ALL
            .into_iter()
            .filter(|k| self.allows(*k) && self.step(*k).is_none())
            .collect()
    }

    /// Adds an empty step in its fixed position.
    pub fn add_step(&mut self, kind: StepKind) -> Result<()> {
        if !self.available_steps().contains(&kind) {
            return Err(ClientError::Validation(format!(
                "{kind} cannot be added to the {}",
                self.routine_type.title().to_lowercase()
            )));
        }
        self.steps.push(Step {
            kind,
            product: None,
        });
        self.steps.sort_by_key(|s| s.kind.order());
        Ok(())
    }

    /// Removes a step, deleting its product from the routine first.
    pub async fn remove_step(&mut self, kind: StepKind) -> Result<()> {
        self.clear_product(kind).await?;
        self.steps.retain(|s| s.kind != kind);
        Ok(())
    }

    /// Screen that picks a product for `kind`.
    pub fn select_route(&self, kind: StepKind) -> Route {
        Route::SelectProduct {
            routine_type: self.routine_type,
            step: kind,
        }
    }

    /// Binds the chosen product to `kind` and persists it.
    ///
    /// The product summary is fetched before anything is written, so a failed
    /// lookup leaves both the step and the routine untouched. A product
    /// already bound to the step is removed from the routine first.
    #[instrument(skip(self))]
    pub async fn assign_product(&mut self, kind: StepKind, product_id: i64) -> Result<()> {
        let routine_id = self.routine_id;
        let previous = self.step_mut(kind)?.product.as_ref().map(|p| p.id);
        if previous == Some(product_id) {
            return Ok(());
        }
        let summary = self.products.summary(product_id).await?;
        if let Some(old) = previous {
            self.routines.remove_product(routine_id, old).await?;
            self.step_mut(kind)?.product = None;
        }

        self.routines.add_product(routine_id, product_id).await?;
        self.step_mut(kind)?.product = Some(summary);
        info!(routine_id, product_id, step = %kind, "product assigned");
        Ok(())
    }

    /// Deletes the step's product from the routine; the step itself stays.
    #[instrument(skip(self))]
    pub async fn clear_product(&mut self, kind: StepKind) -> Result<()> {
        let routine_id = self.routine_id;
        let Some(product_id) = self.step_mut(kind)?.product.as_ref().map(|p| p.id) else {
            return Ok(());
        };
        self.routines.remove_product(routine_id, product_id).await?;
        self.step_mut(kind)?.product = None;
        Ok(())
    }
}
