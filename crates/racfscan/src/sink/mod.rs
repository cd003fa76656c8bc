//! Output sinks for the decoded profile list.

pub mod sqlite;
pub mod text;
