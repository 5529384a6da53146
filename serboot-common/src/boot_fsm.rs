// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Boot decision FSM: listen for a host, then launch or stay.
//!
//! After reset the bootloader listens for `COMMAND_WINDOW_TICKS` ticks of
//! `TICK_MS`. A single accepted command during the window keeps the device in
//! update mode for the rest of its uptime. A silent window ends with an
//! integrity check: a valid image is launched, anything else restarts the
//! window. This is the only place the application is started without a
//! host asking for it.
//!
//! The FSM never sleeps itself; `tick` reports whether the caller should
//! wait `TICK_MS` before the next one.

use crate::device::{Board, FrameSource};
use crate::dispatch::CommandDispatcher;

/// Ticks in one command window.
pub const COMMAND_WINDOW_TICKS: u32 = 30;

/// Length of one tick in milliseconds.
pub const TICK_MS: u32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootPhase {
    CommandWindow,
    Launch,
    Stay,
}

/// Countdown and sticky host-seen flag of one boot attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BootDecision {
    pub ticks_left: u32,
    pub command_seen: bool,
}

impl BootDecision {
    pub fn new() -> Self {
        Self {
            ticks_left: COMMAND_WINDOW_TICKS,
            command_seen: false,
        }
    }

    /// Record traffic; once set the flag stays set.
    pub fn observe(&mut self, command: bool) {
        self.command_seen |= command;
    }

    /// Count one tick down. Returns true when the window has run out.
    pub fn countdown(&mut self) -> bool {
        self.ticks_left = self.ticks_left.saturating_sub(1);
        self.ticks_left == 0
    }

    /// Start a fresh window, keeping the host-seen flag.
    pub fn rearm(&mut self) {
        self.ticks_left = COMMAND_WINDOW_TICKS;
    }
}

impl Default for BootDecision {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tick {
    /// Still inside the window.
    Waiting { ticks_left: u32 },
    /// A multi-frame command is in flight; poll again without waiting.
    Busy,
    /// Window ran out without a valid image; a new window started.
    Rearmed,
    /// Update mode for the rest of uptime.
    Stay,
    /// The application was started.
    Launched,
}

impl Tick {
    /// Whether the caller should wait one `TICK_MS` before the next tick.
    pub fn wants_delay(&self) -> bool {
        !matches!(self, Tick::Busy)
    }
}

pub struct BootSequencer<B, S> {
    dispatcher: CommandDispatcher<B>,
    source: S,
    phase: BootPhase,
    decision: BootDecision,
}

impl<B: Board, S: FrameSource> BootSequencer<B, S> {
    pub fn new(dispatcher: CommandDispatcher<B>, source: S) -> Self {
        Self {
            dispatcher,
            source,
            phase: BootPhase::CommandWindow,
            decision: BootDecision::new(),
        }
    }

    pub fn phase(&self) -> BootPhase {
        self.phase
    }

    pub fn decision(&self) -> BootDecision {
        self.decision
    }

    pub fn dispatcher(&self) -> &CommandDispatcher<B> {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut CommandDispatcher<B> {
        &mut self.dispatcher
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Poll the dispatcher once and advance the window.
    pub fn tick(&mut self) -> Tick {
        if self.phase == BootPhase::Launch {
            return Tick::Launched;
        }

        match self.dispatcher.poll(&mut self.source) {
            Ok(event) => self.decision.observe(event.is_command_traffic()),
            Err(e) => {
                // Errors only come out of accepted commands.
                boot_log!(error, "boot: command failed: {}", e);
                self.decision.observe(true);
            }
        }

        // The countdown never preempts an in-flight command.
        if !self.dispatcher.is_idle() {
            return Tick::Busy;
        }

        match self.phase {
            BootPhase::Launch => Tick::Launched,
            BootPhase::Stay => Tick::Stay,
            BootPhase::CommandWindow => self.advance_window(),
        }
    }

    fn advance_window(&mut self) -> Tick {
        if !self.decision.countdown() {
            return Tick::Waiting {
                ticks_left: self.decision.ticks_left,
            };
        }

        if self.decision.command_seen {
            boot_log!(info, "boot: host seen, staying in update mode");
            self.phase = BootPhase::Stay;
            return Tick::Stay;
        }

        let verdict = self.dispatcher.verify();
        if !verdict.is_valid() {
            boot_log!(info, "boot: no valid image ({}), listening again", verdict);
            self.decision.rearm();
            return Tick::Rearmed;
        }

        self.phase = BootPhase::Launch;
        match self.dispatcher.launch() {
            Ok(()) => Tick::Launched,
            Err(e) => {
                boot_log!(error, "boot: launch failed: {}", e);
                self.phase = BootPhase::CommandWindow;
                self.decision.rearm();
                Tick::Rearmed
            }
        }
    }
}
