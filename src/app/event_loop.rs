use std::{
    cmp::Reverse,
    collections::BinaryHeap,
    time::{Duration, Instant},
};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};

use crate::models::{
    message::Completion,
    task::{TaskToken, ViewId},
};

/// A scheduled status-line refresh for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AnimatorTick {
    pub view: ViewId,
    pub token: TaskToken,
}

#[derive(Debug)]
pub enum LoopEvent {
    Tick(AnimatorTick),
    Completion(Completion),
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Timer {
    due: Instant,
    seq: u64,
    tick: AnimatorTick,
}

/// Single-threaded scheduler: one-shot timers plus the worker channel.
pub struct EventLoop {
    sender: Sender<Completion>,
    receiver: Receiver<Completion>,
    timers: BinaryHeap<Reverse<Timer>>,
    seq: u64,
}

impl EventLoop {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            timers: BinaryHeap::new(),
            seq: 0,
        }
    }

    /// Handle for workers to post completions back onto this loop.
    pub fn sender(&self) -> Sender<Completion> {
        self.sender.clone()
    }

    pub fn set_timeout(&mut self, delay: Duration, tick: AnimatorTick) {
        self.seq += 1;
        self.timers.push(Reverse(Timer {
            due: Instant::now() + delay,
            seq: self.seq,
            tick,
        }));
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Waits until a timer is due or a completion arrives, giving up at
    /// `deadline`. Due timers are served before queued completions.
    pub fn next_event(&mut self, deadline: Instant) -> Option<LoopEvent> {
        loop {
            if let Some(tick) = self.pop_due(Instant::now()) {
                return Some(LoopEvent::Tick(tick));
            }

            let wake = match self.timers.peek() {
                Some(Reverse(timer)) => timer.due.min(deadline),
                None => deadline,
            };
            match self.receiver.recv_deadline(wake) {
                Ok(completion) => return Some(LoopEvent::Completion(completion)),
                Err(RecvTimeoutError::Timeout) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return self.pop_due(now).map(LoopEvent::Tick);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    fn pop_due(&mut self, now: Instant) -> Option<AnimatorTick> {
        match self.timers.peek() {
            Some(Reverse(timer)) if timer.due <= now => {
                self.timers.pop().map(|Reverse(timer)| timer.tick)
            }
            _ => None,
        }
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}
