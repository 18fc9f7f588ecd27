/*
 * Responsibility
 * - claimed capability が granted capability の範囲内かを判定する (escalation check)
 * - ConstraintChecker (constraint.rs) / CapabilityChecker (checker.rs)
 * - violation の型 (error.rs)
 */
pub mod checker;
pub mod constraint;
pub mod error;
pub mod types;

pub use checker::check_all;
pub use error::EscalationError;
pub use types::{Capability, STORAGE_LIMIT};
