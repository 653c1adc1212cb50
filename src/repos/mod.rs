/*
 * Responsibility
 * - report ごとの data-access adapter (1 関数 = 1 statement)
 * - statement の文字列 / procedure 名はここに固定し、呼び出し側の値は bind のみ
 */
pub mod accounting_repo;
pub mod error;
pub mod sica_repo;
pub mod tracking_repo;
pub mod warehouse_repo;
