mod debounce;
pub mod detail;
pub mod dto;
pub mod list;
pub mod services;

pub use debounce::{SearchDebouncer, SettledSearch};
pub use detail::ProductDetail;
pub use list::{ListFilter, ListSnapshot, ProductList};
