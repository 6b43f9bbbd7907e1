//! Route handlers organized by access level and protection type.

pub mod home;
pub mod login;
pub mod secured;
