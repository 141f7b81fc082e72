//! Panic session state and change notifications

use crate::constants::NOTICE_HISTORY_LIMIT;
use crate::decoy::{DecoyDescriptor, DecoyKind};
use crate::scheduler::Millis;
use log::debug;
use std::collections::VecDeque;
use std::sync::mpsc::{channel, Receiver, Sender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanicState {
    Idle,
    Triggered,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DelayedPanicStatus {
    pub enabled: bool,
    /// Whole seconds left, rounded up. None when no countdown is running.
    pub remaining_seconds: Option<u64>,
    pub deadline: Option<Millis>,
}

impl DelayedPanicStatus {
    pub fn is_counting_down(&self) -> bool {
        self.enabled && self.remaining_seconds.is_some()
    }
}

/// Which layer of the fake lock screen is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockView {
    Locked,
    /// The "unlocked" decoy behind the lock screen
    DecoyShown(DecoyKind),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockScreenStatus {
    pub view: LockView,
    /// Digits entered so far (the digits themselves are never kept)
    pub pin_length: usize,
    pub pin_error: bool,
    pub security_delay: u8,
}

/// User-visible, non-fatal problem report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub at: Millis,
    pub message: String,
}

/// Read-only snapshot handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PanicSession {
    pub is_triggered: bool,
    pub last_triggered_at: Option<Millis>,
    pub active_decoy: Option<DecoyDescriptor>,
    pub delayed_panic: DelayedPanicStatus,
    /// Present while the fake lock screen flow is active
    pub lock_screen: Option<LockScreenStatus>,
    pub confirmation_visible: bool,
    pub emergency_overlay_visible: bool,
    /// Fresh Idle -> Triggered transitions since start
    pub trigger_count: u64,
    pub notices: VecDeque<Notice>,
}

impl PanicSession {
    pub fn state(&self) -> PanicState {
        if self.is_triggered {
            PanicState::Triggered
        } else {
            PanicState::Idle
        }
    }

    pub fn push_notice(&mut self, notice: Notice) {
        if self.notices.len() >= NOTICE_HISTORY_LIMIT {
            self.notices.pop_front();
        }
        self.notices.push_back(notice);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Triggered { at: Millis, decoy: DecoyDescriptor },
    /// Trigger while already triggered: only the confirmation redisplays
    Retriggered { at: Millis },
    Reset,
    DelayedPanicArmed { deadline: Millis },
    CountdownTick { remaining_seconds: u64 },
    DelayedPanicFired,
    DelayedPanicCancelled,
    SettingsUpdated,
    LockScreenChanged(LockScreenStatus),
    Redirected { url: String },
    /// Transient visual flags changed (confirmation flash, overlay)
    ViewChanged,
    Notice(Notice),
}

/// Fan-out of session events to any number of receivers
#[derive(Default)]
pub struct Subscribers {
    senders: Vec<Sender<SessionEvent>>,
}

impl Subscribers {
    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        let (tx, rx) = channel();
        self.senders.push(tx);
        rx
    }

    /// Dropped receivers are pruned on the next broadcast
    pub fn broadcast(&mut self, event: SessionEvent) {
        let before = self.senders.len();
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
        if self.senders.len() != before {
            debug!(
                "Pruned {} closed subscriber(s)",
                before - self.senders.len()
            );
        }
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}
