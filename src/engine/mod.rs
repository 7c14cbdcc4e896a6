//! Registration-conversation correlation engine.

pub mod outreach;
pub mod reconcile;
pub mod registry;
pub mod router;

pub use outreach::OutreachEngine;
pub use reconcile::StatusReconciler;
pub use registry::{ConversationEntry, ConversationRegistry};
pub use router::ReplyRouter;
