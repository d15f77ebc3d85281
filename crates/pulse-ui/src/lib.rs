//! Presentation layer for the pulse dashboard.
//!
//! [`render::DashboardRenderer`] turns a metrics snapshot into a plain
//! [`frame::Frame`]; [`draw::draw_frame`] puts that frame on a terminal with
//! [`ratatui`]. Keeping the two apart lets the frame be tested without a
//! terminal.

pub mod draw;
pub mod format;
pub mod frame;
pub mod layout;
pub mod render;

pub use draw::draw_frame;
pub use frame::Frame;
pub use render::{render, DashboardRenderer};
