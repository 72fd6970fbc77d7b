//! `xdg_shell`: desktop-style toplevel windows.

use crate::wire_interface;

wire_interface! {
    /// Global turning surfaces into desktop windows.
    pub enum XdgWmBase = "xdg_wm_base", version 6;
    /// Desktop role wrapper around a `wl_surface`.
    pub enum XdgSurface = "xdg_surface", version 6;
    /// Toplevel window.
    pub enum XdgToplevel = "xdg_toplevel", version 6;
}

pub mod xdg_wm_base {
    pub mod request {
        use super::super::{XdgSurface, XdgWmBase};
        use crate::protocol::{NewId, ObjectId};
        use crate::protocols::wayland::WlSurface;
        use crate::wire_message;

        wire_message! {
            #[derive(Debug, Clone, PartialEq)]
            pub struct Destroy: XdgWmBase = 0, "destroy" {}

            /// Give `surface` the xdg_surface role.
            #[derive(Debug, Clone, PartialEq)]
            pub struct GetXdgSurface: XdgWmBase = 2, "get_xdg_surface" {
                pub id: NewId<XdgSurface>,
                pub surface: ObjectId<WlSurface>,
            }

            /// Answer a `ping` with its serial.
            #[derive(Debug, Clone, PartialEq)]
            pub struct Pong: XdgWmBase = 3, "pong" {
                pub serial: u32,
            }
        }
    }

    pub mod event {
        use super::super::XdgWmBase;
        use crate::wire_message;

        wire_message! {
            /// Liveness check; unanswered pings mark the client unresponsive.
            #[derive(Debug, Clone, PartialEq)]
            pub struct Ping: XdgWmBase = 0, "ping" {
                pub serial: u32,
            }
        }
    }
}

pub mod xdg_surface {
    pub mod request {
        use super::super::{XdgSurface, XdgToplevel};
        use crate::protocol::NewId;
        use crate::wire_message;

        wire_message! {
            #[derive(Debug, Clone, PartialEq)]
            pub struct Destroy: XdgSurface = 0, "destroy" {}

            #[derive(Debug, Clone, PartialEq)]
            pub struct GetToplevel: XdgSurface = 1, "get_toplevel" {
                pub id: NewId<XdgToplevel>,
            }

            #[derive(Debug, Clone, PartialEq)]
            pub struct SetWindowGeometry: XdgSurface = 3, "set_window_geometry" {
                pub x: i32,
                pub y: i32,
                pub width: i32,
                pub height: i32,
            }

            /// Acknowledge the `configure` event with `serial`.
            #[derive(Debug, Clone, PartialEq)]
            pub struct AckConfigure: XdgSurface = 4, "ack_configure" {
                pub serial: u32,
            }
        }
    }

    pub mod event {
        use super::super::XdgSurface;
        use crate::wire_message;

        wire_message! {
            /// End of a configure sequence; must be acked before the next commit.
            #[derive(Debug, Clone, PartialEq)]
            pub struct Configure: XdgSurface = 0, "configure" {
                pub serial: u32,
            }
        }
    }
}

pub mod xdg_toplevel {
    /// Values found in the `states` array of `configure`.
    pub mod state {
        pub const MAXIMIZED: u32 = 1;
        pub const FULLSCREEN: u32 = 2;
        pub const RESIZING: u32 = 3;
        pub const ACTIVATED: u32 = 4;
    }

    pub mod request {
        use super::super::XdgToplevel;
        use crate::wire_message;

        wire_message! {
            #[derive(Debug, Clone, PartialEq)]
            pub struct Destroy: XdgToplevel = 0, "destroy" {}

            #[derive(Debug, Clone, PartialEq)]
            pub struct SetTitle: XdgToplevel = 2, "set_title" {
                pub title: String,
            }

            #[derive(Debug, Clone, PartialEq)]
            pub struct SetAppId: XdgToplevel = 3, "set_app_id" {
                pub app_id: String,
            }
        }
    }

    pub mod event {
        use bytes::Bytes;

        use super::super::XdgToplevel;
        use crate::wire_message;

        wire_message! {
            /// Suggested size (0 means client's choice) and window states.
            #[derive(Debug, Clone, PartialEq)]
            pub struct Configure: XdgToplevel = 0, "configure" {
                pub width: i32,
                pub height: i32,
                pub states: Bytes,
            }

            /// The user asked to close the window.
            #[derive(Debug, Clone, PartialEq)]
            pub struct Close: XdgToplevel = 1, "close" {}
        }

        impl Configure {
            /// The `states` array as native-endian words.
            pub fn states(&self) -> impl Iterator<Item = u32> + '_ {
                self.states
                    .chunks_exact(4)
                    .map(|w| u32::from_ne_bytes([w[0], w[1], w[2], w[3]]))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{interpret, parse_messages, ObjectId, RequestBuffer};
    use bytes::{BufMut, BytesMut};

    #[test]
    fn test_toplevel_configure_states() {
        let mut states = BytesMut::new();
        states.put_slice(&xdg_toplevel::state::MAXIMIZED.to_ne_bytes());
        states.put_slice(&xdg_toplevel::state::ACTIVATED.to_ne_bytes());

        let toplevel: ObjectId<XdgToplevel> = ObjectId::from_raw(8);
        let mut buffer = RequestBuffer::new();
        buffer
            .append(
                toplevel,
                xdg_toplevel::event::Configure {
                    width: 640,
                    height: 480,
                    states: states.freeze(),
                },
            )
            .unwrap();

        let message = parse_messages(buffer.as_bytes()).next().unwrap().unwrap();
        let configure: xdg_toplevel::event::Configure = interpret(message.arguments).unwrap();
        assert_eq!(configure.width, 640);
        assert_eq!(configure.height, 480);
        assert_eq!(
            configure.states().collect::<Vec<_>>(),
            vec![xdg_toplevel::state::MAXIMIZED, xdg_toplevel::state::ACTIVATED]
        );
    }

    #[test]
    fn test_set_title_encoding() {
        let toplevel: ObjectId<XdgToplevel> = ObjectId::from_raw(8);
        let mut buffer = RequestBuffer::new();
        buffer
            .append(
                toplevel,
                xdg_toplevel::request::SetTitle {
                    title: "hi".to_string(),
                },
            )
            .unwrap();

        // header + length word + "hi\0" padded to one word
        assert_eq!(buffer.len(), 16);
        assert_eq!(&buffer.as_bytes()[8..12], &3u32.to_ne_bytes());
        assert_eq!(&buffer.as_bytes()[12..], b"hi\0\0");
    }
}
