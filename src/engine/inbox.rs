use rtrb::Consumer;

use crate::engine::queue::Scheduled;

/// Audio-side end of the handoff from the network thread.
///
/// Must not block: `pop` returns `None` as soon as nothing is waiting.
pub trait EventReceiver {
    fn pop(&mut self) -> Option<Scheduled>;
}

impl EventReceiver for Consumer<Scheduled> {
    fn pop(&mut self) -> Option<Scheduled> {
        Consumer::pop(self).ok()
    }
}

/// Receiver for engines that are only fed through
/// [`Engine::schedule`](crate::engine::Engine::schedule).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInbox;

impl EventReceiver for NoInbox {
    fn pop(&mut self) -> Option<Scheduled> {
        None
    }
}
