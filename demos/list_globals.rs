//! List Globals - registry round trip against a running compositor.
//!
//! This example demonstrates:
//! - Connecting through `WAYLAND_DISPLAY`/`XDG_RUNTIME_DIR`
//! - Reserving ids and registering `get_registry` + `sync`
//! - Collecting `wl_registry.global` events until the sync callback fires
//!
//! Each global is printed as one JSON line:
//!
//! ```text
//! $ RUST_LOG=wlwire_client=debug cargo run --example list_globals
//! {"name":1,"interface":"wl_compositor","version":6}
//! {"name":2,"interface":"wl_shm","version":2}
//! ```

use serde::Serialize;
use tracing_subscriber::EnvFilter;
use wlwire_client::handler::OverloadSet;
use wlwire_client::protocol::ObjectId;
use wlwire_client::protocols::wayland::{
    wl_callback, wl_display, wl_registry, WlCallback, WlRegistry, DISPLAY,
};
use wlwire_client::Connection;

/// One announced global.
#[derive(Serialize, Debug)]
struct GlobalLine {
    name: u32,
    interface: String,
    version: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout stays machine readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut conn = Connection::connect_to_env()?;

    let registry: ObjectId<WlRegistry> = conn.reserve_object_id();
    conn.register_request(
        DISPLAY,
        wl_display::request::GetRegistry {
            registry: registry.into(),
        },
    )?;
    let callback: ObjectId<WlCallback> = conn.reserve_object_id();
    conn.register_request(
        DISPLAY,
        wl_display::request::Sync {
            callback: callback.into(),
        },
    )?;
    conn.flush_registered_requests()?;

    let mut globals = Vec::new();
    {
        let mut overloads = OverloadSet::new();
        overloads.add(registry, |global: wl_registry::event::Global| {
            globals.push(GlobalLine {
                name: global.name,
                interface: global.interface,
                version: global.version,
            })
        })?;
        overloads.add(DISPLAY, |error: wl_display::event::Error| {
            tracing::error!(
                object_id = error.object_id.id(),
                code = error.code,
                message = %error.message,
                "Protocol error"
            );
        })?;
        conn.recv_and_visit(&mut overloads)
            .until::<wl_callback::event::Done>(callback)?;
    }

    for global in &globals {
        println!("{}", serde_json::to_string(global)?);
    }
    Ok(())
}
