pub mod list_effect_handler;
pub mod list_models;

pub use list_effect_handler::ListEffectHandler;
pub use list_models::{ListEffect, ListEvent, ListViewEffect};
