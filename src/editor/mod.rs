pub mod editor_effect_handler;
pub mod editor_models;
pub mod schedule_validator;

pub use editor_effect_handler::EditorEffectHandler;
pub use editor_models::{EditorEffect, EditorEvent, EditorViewEffect};
pub use schedule_validator::{validate_at, InvalidReason, ScheduleValidator, ValidationResult};
