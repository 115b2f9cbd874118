//! OMERO.insight login client
//!
//! Login screen state, the persisted list of known servers and the terminal
//! front end that drives them, plus the comments pane model for metadata
//! editors embedding this crate.

pub mod comments;
pub mod config;
pub mod connect;
pub mod login;
pub mod servers;
pub mod tui;
