//! Frame scheduling for the game loop.
//!
//! The host environment owns the clock. [`FrameScheduler`] is the
//! request/cancel pair it offers (a browser's animation frames, a headless
//! driver stepping by hand), and [`GameLoop`] is the self-rescheduling loop
//! built on top: each accepted frame runs one tick and asks for the next.

use std::collections::VecDeque;

pub type FrameToken = u64;

pub trait FrameScheduler {
    /// Ask for one callback on the next frame.
    fn request_frame(&mut self) -> FrameToken;

    /// Withdraw a pending request. Unknown tokens are ignored.
    fn cancel_frame(&mut self, token: FrameToken);
}

/// Headless scheduler: requests queue up until the driver takes them.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_token: FrameToken,
    pending: VecDeque<FrameToken>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Every request made so far, oldest first. Requests made while the
    /// caller handles these are due on the following frame.
    pub fn take_due(&mut self) -> Vec<FrameToken> {
        self.pending.drain(..).collect()
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameToken {
        self.next_token += 1;
        self.pending.push_back(self.next_token);
        self.next_token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.pending.retain(|t| *t != token);
    }
}

/// Self-rescheduling update/render loop.
///
/// At most one frame request is outstanding at any time. Frames for any
/// other token (stale callbacks that fired after a stop) are refused.
#[derive(Debug, Default)]
pub struct GameLoop {
    pending: Option<FrameToken>,
    frames: u64,
}

impl GameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the loop was already running.
    pub fn start(&mut self, scheduler: &mut dyn FrameScheduler) -> bool {
        if self.pending.is_some() {
            return false;
        }
        self.pending = Some(scheduler.request_frame());
        log::info!("Game loop started");
        true
    }

    /// Cancel the outstanding frame. A second call is a no-op.
    pub fn stop(&mut self, scheduler: &mut dyn FrameScheduler) -> bool {
        let Some(token) = self.pending.take() else {
            return false;
        };
        scheduler.cancel_frame(token);
        log::info!("Game loop stopped after {} frames", self.frames);
        true
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Run `tick` if `token` is the outstanding request, then reschedule.
    pub fn on_frame(
        &mut self,
        token: FrameToken,
        scheduler: &mut dyn FrameScheduler,
        tick: impl FnOnce(),
    ) -> bool {
        if self.pending != Some(token) {
            log::trace!("Ignoring stale frame {}", token);
            return false;
        }
        tick();
        self.frames += 1;
        self.pending = Some(scheduler.request_frame());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_reschedules_each_frame() {
        let mut scheduler = ManualScheduler::new();
        let mut game_loop = GameLoop::new();
        assert!(game_loop.start(&mut scheduler));
        assert!(!game_loop.start(&mut scheduler));
        assert_eq!(scheduler.pending(), 1);

        let mut ticks = 0;
        for _ in 0..3 {
            for token in scheduler.take_due() {
                game_loop.on_frame(token, &mut scheduler, || ticks += 1);
            }
        }
        assert_eq!(ticks, 3);
        assert_eq!(game_loop.frames(), 3);
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_stop_is_idempotent_and_cancels() {
        let mut scheduler = ManualScheduler::new();
        let mut game_loop = GameLoop::new();
        game_loop.start(&mut scheduler);

        assert!(game_loop.stop(&mut scheduler));
        assert!(!game_loop.stop(&mut scheduler));
        assert_eq!(scheduler.pending(), 0);
        assert!(!game_loop.is_running());
    }

    #[test]
    fn test_stale_token_is_refused() {
        let mut scheduler = ManualScheduler::new();
        let mut game_loop = GameLoop::new();
        game_loop.start(&mut scheduler);
        let stale = scheduler.take_due()[0];
        game_loop.stop(&mut scheduler);
        game_loop.start(&mut scheduler);

        let mut ticked = false;
        assert!(!game_loop.on_frame(stale, &mut scheduler, || ticked = true));
        assert!(!ticked);
        // The live request is untouched.
        assert_eq!(scheduler.pending(), 1);
    }
}
