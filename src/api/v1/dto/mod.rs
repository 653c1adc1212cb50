/*
 * Responsibility
 * - report ごとの request DTO (query / body / path)
 * - serde で deserialize、validator で形式チェック、RequestSchema::normalize で正規化
 */
pub mod accounting;
pub mod common;
pub mod sica;
pub mod tracking;
pub mod warehouse;
