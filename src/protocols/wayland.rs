//! Core `wayland` protocol: display, registry, shared memory and surfaces.

use crate::protocol::{ObjectId, DISPLAY_OBJECT_ID};
use crate::wire_interface;

wire_interface! {
    /// Core global object, always id 1.
    pub enum WlDisplay = "wl_display", version 1;
    /// Global registry announcing the compositor's globals.
    pub enum WlRegistry = "wl_registry", version 1;
    /// One-shot completion callback.
    pub enum WlCallback = "wl_callback", version 1;
    /// Surface factory.
    pub enum WlCompositor = "wl_compositor", version 6;
    /// Shared memory support.
    pub enum WlShm = "wl_shm", version 2;
    /// Memory pool backed by a descriptor.
    pub enum WlShmPool = "wl_shm_pool", version 2;
    /// Content for a surface.
    pub enum WlBuffer = "wl_buffer", version 1;
    /// Onscreen rectangle.
    pub enum WlSurface = "wl_surface", version 6;
    /// Compositor output region.
    pub enum WlOutput = "wl_output", version 4;
}

/// The display object.
pub const DISPLAY: ObjectId<WlDisplay> = ObjectId::from_raw(DISPLAY_OBJECT_ID);

pub mod wl_display {
    /// Error codes of the `error` event.
    pub mod error {
        pub const INVALID_OBJECT: u32 = 0;
        pub const INVALID_METHOD: u32 = 1;
        pub const NO_MEMORY: u32 = 2;
        pub const IMPLEMENTATION: u32 = 3;
    }

    pub mod request {
        use super::super::{WlCallback, WlDisplay, WlRegistry};
        use crate::protocol::NewId;
        use crate::wire_message;

        wire_message! {
            /// Ask for a `done` callback once every earlier request is handled.
            #[derive(Debug, Clone, PartialEq)]
            pub struct Sync: WlDisplay = 0, "sync" {
                pub callback: NewId<WlCallback>,
            }

            /// Create the registry object.
            #[derive(Debug, Clone, PartialEq)]
            pub struct GetRegistry: WlDisplay = 1, "get_registry" {
                pub registry: NewId<WlRegistry>,
            }
        }
    }

    pub mod event {
        use super::super::WlDisplay;
        use crate::protocol::ObjectId;
        use crate::wire_message;

        wire_message! {
            /// Fatal protocol error.
            #[derive(Debug, Clone, PartialEq)]
            pub struct Error: WlDisplay = 0, "error" {
                pub object_id: ObjectId,
                pub code: u32,
                pub message: String,
            }

            /// The compositor released an id the client deleted.
            #[derive(Debug, Clone, PartialEq)]
            pub struct DeleteId: WlDisplay = 1, "delete_id" {
                pub id: u32,
            }
        }
    }
}

pub mod wl_registry {
    pub mod request {
        use super::super::WlRegistry;
        use crate::protocol::NewId;
        use crate::wire_message;

        wire_message! {
            /// Bind global `name`. The interface and version travel on the
            /// wire because `id` has no fixed interface.
            #[derive(Debug, Clone, PartialEq)]
            pub struct Bind: WlRegistry = 0, "bind" {
                pub name: u32,
                pub interface: String,
                pub version: u32,
                pub id: NewId,
            }
        }
    }

    pub mod event {
        use super::super::WlRegistry;
        use crate::wire_message;

        wire_message! {
            /// A global became available.
            #[derive(Debug, Clone, PartialEq, Eq, Hash)]
            pub struct Global: WlRegistry = 0, "global" {
                pub name: u32,
                pub interface: String,
                pub version: u32,
            }

            /// A global went away.
            #[derive(Debug, Clone, PartialEq, Eq, Hash)]
            pub struct GlobalRemove: WlRegistry = 1, "global_remove" {
                pub name: u32,
            }
        }
    }
}

pub mod wl_callback {
    pub mod event {
        use super::super::WlCallback;
        use crate::wire_message;

        wire_message! {
            #[derive(Debug, Clone, PartialEq)]
            pub struct Done: WlCallback = 0, "done" {
                pub callback_data: u32,
            }
        }
    }
}

pub mod wl_compositor {
    pub mod request {
        use super::super::{WlCompositor, WlSurface};
        use crate::protocol::NewId;
        use crate::wire_message;

        wire_message! {
            #[derive(Debug, Clone, PartialEq)]
            pub struct CreateSurface: WlCompositor = 0, "create_surface" {
                pub id: NewId<WlSurface>,
            }
        }
    }
}

pub mod wl_shm {
    /// Pixel formats of the `format` event. Only the two every compositor
    /// must support are listed.
    pub mod format {
        pub const ARGB8888: u32 = 0;
        pub const XRGB8888: u32 = 1;
    }

    pub mod request {
        use std::os::fd::OwnedFd;

        use super::super::{WlShm, WlShmPool};
        use crate::protocol::NewId;
        use crate::wire_message;

        wire_message! {
            /// Create a pool over `size` bytes of the memory behind `fd`.
            #[derive(Debug)]
            pub struct CreatePool: WlShm = 0, "create_pool" {
                pub id: NewId<WlShmPool>,
                pub fd: OwnedFd,
                pub size: i32,
            }

            #[derive(Debug, Clone, PartialEq)]
            pub struct Release: WlShm = 1, "release" {}
        }
    }

    pub mod event {
        use super::super::WlShm;
        use crate::wire_message;

        wire_message! {
            #[derive(Debug, Clone, PartialEq)]
            pub struct Format: WlShm = 0, "format" {
                pub format: u32,
            }
        }
    }
}

pub mod wl_shm_pool {
    pub mod request {
        use super::super::{WlBuffer, WlShmPool};
        use crate::protocol::NewId;
        use crate::wire_message;

        wire_message! {
            #[derive(Debug, Clone, PartialEq)]
            pub struct CreateBuffer: WlShmPool = 0, "create_buffer" {
                pub id: NewId<WlBuffer>,
                pub offset: i32,
                pub width: i32,
                pub height: i32,
                pub stride: i32,
                pub format: u32,
            }

            #[derive(Debug, Clone, PartialEq)]
            pub struct Destroy: WlShmPool = 1, "destroy" {}

            /// Grow the pool; shrinking is not allowed.
            #[derive(Debug, Clone, PartialEq)]
            pub struct Resize: WlShmPool = 2, "resize" {
                pub size: i32,
            }
        }
    }
}

pub mod wl_buffer {
    pub mod request {
        use super::super::WlBuffer;
        use crate::wire_message;

        wire_message! {
            #[derive(Debug, Clone, PartialEq)]
            pub struct Destroy: WlBuffer = 0, "destroy" {}
        }
    }

    pub mod event {
        use super::super::WlBuffer;
        use crate::wire_message;

        wire_message! {
            /// The compositor no longer reads the buffer.
            #[derive(Debug, Clone, PartialEq)]
            pub struct Release: WlBuffer = 0, "release" {}
        }
    }
}

pub mod wl_surface {
    pub mod request {
        use super::super::{WlBuffer, WlCallback, WlSurface};
        use crate::protocol::{NewId, ObjectId};
        use crate::wire_message;

        wire_message! {
            #[derive(Debug, Clone, PartialEq)]
            pub struct Destroy: WlSurface = 0, "destroy" {}

            /// Set pending content; buffer id 0 removes it.
            #[derive(Debug, Clone, PartialEq)]
            pub struct Attach: WlSurface = 1, "attach" {
                pub buffer: ObjectId<WlBuffer>,
                pub x: i32,
                pub y: i32,
            }

            /// Mark a rectangle in surface coordinates as changed.
            #[derive(Debug, Clone, PartialEq)]
            pub struct Damage: WlSurface = 2, "damage" {
                pub x: i32,
                pub y: i32,
                pub width: i32,
                pub height: i32,
            }

            /// Request a callback for the next good time to draw.
            #[derive(Debug, Clone, PartialEq)]
            pub struct Frame: WlSurface = 3, "frame" {
                pub callback: NewId<WlCallback>,
            }

            /// Apply the pending state atomically.
            #[derive(Debug, Clone, PartialEq)]
            pub struct Commit: WlSurface = 6, "commit" {}

            /// Mark a rectangle in buffer coordinates as changed.
            #[derive(Debug, Clone, PartialEq)]
            pub struct DamageBuffer: WlSurface = 9, "damage_buffer" {
                pub x: i32,
                pub y: i32,
                pub width: i32,
                pub height: i32,
            }
        }
    }

    pub mod event {
        use super::super::{WlOutput, WlSurface};
        use crate::protocol::ObjectId;
        use crate::wire_message;

        wire_message! {
            #[derive(Debug, Clone, PartialEq)]
            pub struct Enter: WlSurface = 0, "enter" {
                pub output: ObjectId<WlOutput>,
            }

            #[derive(Debug, Clone, PartialEq)]
            pub struct Leave: WlSurface = 1, "leave" {
                pub output: ObjectId<WlOutput>,
            }
        }
    }
}
