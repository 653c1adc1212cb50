/*
 * Responsibility
 * - 外部依存 (token 検証, database pool) を handler/repo から隠す層
 */
pub mod auth;
pub mod db;
