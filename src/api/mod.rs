/*
 * Responsibility
 * - API version ごとの module (現状は v1 のみ)
 */
pub mod v1;
