//! Process, clipboard and database collaborators for the result grid.

pub mod clipboard;
pub mod editor;
pub mod mysql;
