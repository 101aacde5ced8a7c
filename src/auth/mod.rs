pub mod dto;
pub mod services;

pub use services::{validate_registration, AuthState};
