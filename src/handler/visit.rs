//! Visiting parsed messages with an overload set.

use std::collections::VecDeque;
use std::os::fd::OwnedFd;

use tracing::trace;

use super::overload_set::OverloadSet;
use crate::connection::RequestQueue;
use crate::error::Result;
use crate::protocol::ParsedMessage;

/// Connection state a handler may touch while it runs.
pub struct DispatchContext<'c> {
    /// Outbound requests, for handlers that answer events.
    pub requests: &'c mut RequestQueue,
    /// Received descriptors, consumed in order by fd arguments.
    pub fds: &'c mut VecDeque<OwnedFd>,
}

impl<'c> DispatchContext<'c> {
    /// Borrow the request queue and the received descriptor queue.
    pub fn new(requests: &'c mut RequestQueue, fds: &'c mut VecDeque<OwnedFd>) -> Self {
        Self { requests, fds }
    }
}

/// Dispatch one message, running `default` if no handler matches.
///
/// Returns whether a handler ran.
pub fn visit<D>(
    message: &ParsedMessage<'_>,
    overloads: &mut OverloadSet<'_>,
    ctx: &mut DispatchContext<'_>,
    default: D,
) -> Result<bool>
where
    D: FnOnce(&ParsedMessage<'_>),
{
    if overloads.dispatch(message, ctx)? {
        return Ok(true);
    }
    default(message);
    Ok(false)
}

/// Dispatch every message in order, running `default` for unmatched ones.
///
/// Stops at the first framing or handler error. Returns the number of
/// messages a handler ran for.
pub fn visit_all<'m, I, D>(
    messages: I,
    overloads: &mut OverloadSet<'_>,
    ctx: &mut DispatchContext<'_>,
    mut default: D,
) -> Result<usize>
where
    I: IntoIterator<Item = Result<ParsedMessage<'m>>>,
    D: FnMut(&ParsedMessage<'_>),
{
    let mut handled = 0;
    for message in messages {
        if visit(&message?, overloads, ctx, &mut default)? {
            handled += 1;
        }
    }
    Ok(handled)
}

/// Dispatch every message in order, skipping unmatched ones.
pub fn dispatch_all<'m, I>(
    messages: I,
    overloads: &mut OverloadSet<'_>,
    ctx: &mut DispatchContext<'_>,
) -> Result<usize>
where
    I: IntoIterator<Item = Result<ParsedMessage<'m>>>,
{
    visit_all(messages, overloads, ctx, log_skipped)
}

pub(crate) fn log_skipped(message: &ParsedMessage<'_>) {
    trace!(
        object_id = message.object_id.id(),
        opcode = message.opcode,
        len = message.wire_len(),
        "No handler, skipping message"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{parse_messages, ObjectId, RequestBuffer};
    use crate::protocols::wayland::{wl_callback, wl_display, WlCallback, DISPLAY};

    #[test]
    fn test_visit_all_runs_handlers_in_wire_order() {
        let first: ObjectId<WlCallback> = ObjectId::from_raw(3);
        let second: ObjectId<WlCallback> = ObjectId::from_raw(4);

        let mut buffer = RequestBuffer::new();
        buffer
            .append(second, wl_callback::event::Done { callback_data: 20 })
            .unwrap();
        buffer
            .append(DISPLAY, wl_display::event::DeleteId { id: 9 })
            .unwrap();
        buffer
            .append(first, wl_callback::event::Done { callback_data: 10 })
            .unwrap();

        let order = std::cell::RefCell::new(Vec::new());
        let mut skipped = Vec::new();
        let mut overloads = OverloadSet::new();
        overloads
            .add(first, |done: wl_callback::event::Done| {
                order.borrow_mut().push(done.callback_data)
            })
            .unwrap();
        overloads
            .add(second, |done: wl_callback::event::Done| {
                order.borrow_mut().push(done.callback_data)
            })
            .unwrap();

        let mut requests = RequestQueue::new();
        let mut fds = VecDeque::new();
        let mut ctx = DispatchContext::new(&mut requests, &mut fds);
        let handled = visit_all(
            parse_messages(buffer.as_bytes()),
            &mut overloads,
            &mut ctx,
            |m| skipped.push((m.object_id.id(), m.opcode)),
        )
        .unwrap();

        assert_eq!(handled, 2);
        assert_eq!(*order.borrow(), vec![20, 10]);
        assert_eq!(skipped, vec![(1, 1)]);
    }

    #[test]
    fn test_dispatch_all_ignores_unmatched() {
        let mut buffer = RequestBuffer::new();
        buffer
            .append(DISPLAY, wl_display::event::DeleteId { id: 3 })
            .unwrap();

        let mut overloads = OverloadSet::new();
        let mut requests = RequestQueue::new();
        let mut fds = VecDeque::new();
        let mut ctx = DispatchContext::new(&mut requests, &mut fds);
        let handled =
            dispatch_all(parse_messages(buffer.as_bytes()), &mut overloads, &mut ctx).unwrap();
        assert_eq!(handled, 0);
    }

    #[test]
    fn test_framing_error_stops_visit() {
        let bytes = crate::protocol::Header::new(1, 0, 4).encode();
        let mut overloads = OverloadSet::new();
        let mut requests = RequestQueue::new();
        let mut fds = VecDeque::new();
        let mut ctx = DispatchContext::new(&mut requests, &mut fds);
        assert!(dispatch_all(parse_messages(&bytes), &mut overloads, &mut ctx).is_err());
    }
}
