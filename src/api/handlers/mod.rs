//! API handlers for Demando.
//!
//! Auth flows live under [`auth`]; question/answer CRUD sits beside them.

pub mod answers;
pub mod auth;
pub mod health;
pub mod questions;
pub mod root;
