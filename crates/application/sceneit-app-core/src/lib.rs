pub mod actions;
pub mod app_core;
mod async_runtime;
pub mod domain;
pub mod kernel;
pub mod loader;
pub mod screens;
pub mod viewmodel;

pub use actions::{ActionError, MovieDraft, ReviewDraft};
pub use app_core::*;
pub use domain::{AppState, ItemRef, MovieQuery, Notice, Route, TablePrefs};
pub use kernel::AppKernel;
pub use loader::{LoaderOptions, SettleEvent, ViewLoader};
pub use viewmodel::*;
