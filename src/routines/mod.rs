pub mod dto;
pub mod editor;
pub mod picker;
pub mod screen;
pub mod services;

pub use editor::{RoutineEditor, Step};
pub use picker::{PickerTab, ProductPicker};
pub use screen::{HomeOverview, RoutineScreen, ScreenState};
