//! Session-scoped execution plans: store, update, and Markdown rendering.

mod store;

pub use store::{
    PlanStore, SessionPlanStep, STATUS_DONE, STATUS_ERROR, STATUS_IN_PROGRESS, STATUS_PENDING,
    STATUS_SKIPPED,
};
