/*!
 * Schema-validated request extractors
 *
 * Responsibility:
 * - query / JSON body / path を DTO に deserialize し、normalize → validate してから handler に渡す
 * - 失敗時は 400 VALIDATION_FAILED + `(path, message)` の一覧。handler は呼ばれない
 *
 * Public API:
 * - RequestSchema
 * - ValidQuery / ValidJson / ValidPath
 */

mod core;
mod violations;

pub use core::{RequestPart, RequestSchema, ValidJson, ValidPath, ValidQuery};
pub use violations::{flatten, index_error, schema_error};
