//!  Storage is organized through [document_store::JsonDocumentStore].
//!  The basic idea is:
//!   - There is a data directory with one file per tool.
//!   - Most tools keep a single JSON document that is rewritten as a whole. Rewrites go through a
//!     temporary file and a rename, so a crash never leaves half a document behind.
//!   - The time log is an append-only file of JSON lines, see [record_log::RecordLog].
//!   - Every read or write takes an advisory lock on a sibling `.lock` file, so two invocations
//!     running at once are serialized instead of overwriting each other.

pub mod document_store;
pub mod lock;
pub mod record_log;
