//! Core business logic.
//!
//! Every service takes a `DatabaseConnection` and, for mutations, the acting
//! user. Permission checks go through [`policy`].

pub mod authorization;
pub mod catalog;
pub mod company;
pub mod job;
pub mod level;
pub mod policy;
pub mod project;
pub mod reference;
pub mod relation;
pub mod request;
pub mod seed;
pub mod session;
pub mod skill;
pub mod system_state;
pub mod user;
