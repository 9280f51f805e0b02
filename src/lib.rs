//! # Kursoj (Users & Courses REST API)
//!
//! `kursoj` is a small REST API exposing two resources, users and courses,
//! backed by PostgreSQL.
//!
//! ## Authentication & Ownership
//!
//! - Write endpoints require HTTP Basic credentials (`email:password`).
//!   Passwords are stored as Argon2id hashes and verified with the hash
//!   library's dedicated compare routine.
//! - Every course has exactly one owning user. Only the owner may update or
//!   delete a course; reads are open to everyone.
//! - All credential failures are reported to the client as an identical
//!   `401 Access Denied` body. The distinct failure kinds are only visible
//!   in the logs.
//!
//! ## Error Boundary
//!
//! Handlers translate validation and uniqueness failures into structured
//! `400` payloads. Anything else reaches a single terminal boundary that
//! answers `{"message": ..., "error": {}}` and logs the failure only when
//! error logging is enabled at startup.

pub mod api;
pub mod cli;
