//! lotgen subsystems: rule table, draw engine, batch store and the
//! request session that composes them.

pub mod batch;
pub mod draw;
pub mod rules;
pub mod session;
