pub mod dto;
pub mod profile;
pub mod services;
