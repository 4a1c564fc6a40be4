//! Result grid engine: column layout, SQL clause rewriting and the grid
//! state machine, plus the collaborator traits its hosts implement.

pub mod connection;
pub mod dialect;
pub mod editor_hint;
pub mod grid;
pub mod layout;
pub mod params;
pub mod profiles;
pub mod result_set;
pub mod selection;
pub mod settings;
pub mod sort;
pub mod sql_rewriter;
