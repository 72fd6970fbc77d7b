//! Message tables for the protocols this crate talks out of the box.
//!
//! Each interface is an uninhabited marker type plus a module holding its
//! `request` and `event` messages. Tables for further protocols can be
//! written the same way with [`wire_interface!`](crate::wire_interface) and
//! [`wire_message!`](crate::wire_message).

pub mod wayland;
pub mod xdg_shell;
