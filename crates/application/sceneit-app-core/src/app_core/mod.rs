//! Client state outside the per-screen view model: route, session, table
//! settings and per-item action state, changed only through `reduce`.

pub mod commands;
pub mod events;
pub mod reducer;
pub mod store;

pub use commands::AppCommand;
pub use events::DomainEvent;
pub use reducer::reduce;
pub use store::AppStore;
