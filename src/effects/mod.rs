pub mod dispatcher;
pub mod session;
pub mod tiers;
pub mod view_effects;

pub use dispatcher::{EffectDispatcher, EffectHandler, EffectOutput};
pub use session::{Session, SessionScope};
pub use tiers::{ExecutionTiers, Tier};
pub use view_effects::{follow_view_effects, ViewEffectChannel};
