//! Membership and attendance register for a congregation.
//!
//! Visitors register once as members, then check in as present or absent
//! (with a reason) for one of the two weekly services. An administrator
//! reviews, edits and deletes the records.
//!
//! - [`domain`]: members, services, attendance entries, validation.
//! - [`persistence`]: repository traits, the error type, and the SQLite
//!   implementation with its schema and sequence bookkeeping.
//! - [`register`]: the flows a front end calls.

pub mod domain;
pub mod persistence;
pub mod register;

pub use domain::{
    Admin, AttendanceChange, AttendanceFilter, AttendanceId, AttendanceStatus, AttendanceView,
    Member, MemberId, MemberInput, NewAttendance, Service, ValidationError,
};
pub use persistence::sqlite::{Database, SequencePolicy};
pub use persistence::RegisterError;
pub use register::{AuthError, Register, SqliteRegister};
