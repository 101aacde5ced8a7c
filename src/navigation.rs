use std::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

use tokio::sync::watch;

use crate::{catalog::StepKind, routines::dto::RoutineType};

/// Screens the front-end can be sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Welcome,
    Login,
    Register,
    SkinTypeOnboarding,
    GoalsOnboarding,
    Home,
    Explore,
    Favorites,
    MyProducts,
    Profile,
    ProductDetail(i64),
    Routine(RoutineType),
    RoutineEdit(RoutineType),
    SelectProduct {
        routine_type: RoutineType,
        step: StepKind,
    },
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Welcome => f.write_str("/"),
            Route::Login => f.write_str("/(auth)/login"),
            Route::Register => f.write_str("/(auth)/register"),
            Route::SkinTypeOnboarding => f.write_str("/(auth)/skin-type"),
            Route::GoalsOnboarding => f.write_str("/(auth)/goals"),
            Route::Home => f.write_str("/(tabs)/home"),
            Route::Explore => f.write_str("/(tabs)/explore"),
            Route::Favorites => f.write_str("/products/favorites"),
            Route::MyProducts => f.write_str("/products/my-products"),
            Route::Profile => f.write_str("/(tabs)/profile"),
            Route::ProductDetail(id) => write!(f, "/products/{id}"),
            Route::Routine(t) => write!(f, "/routine/{}", t.path_segment()),
            Route::RoutineEdit(t) => write!(f, "/routine/edit?type={}", t.path_segment()),
            Route::SelectProduct { routine_type, step } => write!(
                f,
                "/routine/select-product?stepId={}&type={}",
                step.id(),
                routine_type.path_segment()
            ),
        }
    }
}

/// Replaces the visible screen.
pub trait Navigator: Send + Sync {
    fn replace(&self, route: Route);
}

/// Navigator backed by a watch channel so views can follow route changes.
pub struct AppRouter {
    tx: watch::Sender<Route>,
    transitions: AtomicUsize,
}

impl AppRouter {
    pub fn new(initial: Route) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            tx,
            transitions: AtomicUsize::new(0),
        }
    }

    pub fn current(&self) -> Route {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.tx.subscribe()
    }

    /// Number of `replace` calls since creation.
    pub fn transitions(&self) -> usize {
        self.transitions.load(Ordering::SeqCst)
    }
}

impl Default for AppRouter {
    fn default() -> Self {
        Self::new(Route::Welcome)
    }
}

impl Navigator for AppRouter {
    fn replace(&self, route: Route) {
        tracing::debug!(route = %route, "navigate");
        self.transitions.fetch_add(1, Ordering::SeqCst);
        self.tx.send_replace(route);
    }
}
