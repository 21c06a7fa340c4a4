// Copyright 2026 The GraphGuard Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Time-driven percentage advancement.
//!
//! A [`ProgressSimulator`] never owns a real timer. The host advances it
//! with the wall-clock time that has elapsed since the last call, and every
//! tick that came due in that window is fired in order. Because the pending
//! run is plain state inside the simulator, cancelling it (or dropping the
//! simulator) is all it takes to guarantee no further ticks happen.

use std::time::Duration;

use tracing::{debug, info};

use crate::common::Result;
use crate::config::ProgressConfig;
use crate::progress_err;

/// What a single tick published.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ProgressTick {
    pub percentage: u32,
    pub sub_step: Option<usize>,
    /// True only on the tick that reached 100%.
    pub completed: bool,
}

#[derive(Clone, Debug)]
enum RunState {
    Idle,
    Running {
        config: ProgressConfig,
        until_next_tick: Duration,
    },
    Completed,
}

#[derive(Clone, Debug)]
pub struct ProgressSimulator {
    name: &'static str,
    state: RunState,
    percentage: u32,
    sub_step: Option<usize>,
    ticks: u32,
}

/// Index of the sub-step a percentage falls into, with `total` equal
/// sub-steps across 0-100. 100% maps onto the last sub-step.
pub fn sub_step_for(percentage: u32, total: u32) -> usize {
    if total == 0 {
        return 0;
    }
    let idx = (u64::from(percentage.min(100)) * u64::from(total)) / 100;
    (idx as usize).min(total as usize - 1)
}

impl ProgressSimulator {
    pub fn new(name: &'static str) -> Self {
        ProgressSimulator {
            name,
            state: RunState::Idle,
            percentage: 0,
            sub_step: None,
            ticks: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Begin a run from 0%. Fails with `AlreadyRunning` while a previous run
    /// of this simulator has neither completed nor been cancelled.
    pub fn start(&mut self, config: ProgressConfig) -> Result<()> {
        config.validate()?;
        if self.is_running() {
            return progress_err!(
                AlreadyRunning,
                format!("{} is already at {}%", self.name, self.percentage)
            );
        }

        info!(
            simulator = self.name,
            increment = config.increment_per_tick,
            interval_ms = config.tick_interval_ms,
            "progress run started"
        );

        self.percentage = 0;
        self.sub_step = None;
        self.ticks = 0;
        self.state = RunState::Running {
            until_next_tick: config.tick_interval(),
            config,
        };
        Ok(())
    }

    /// Stop a run without completing it. Progress made so far is kept.
    /// Returns whether a run was actually in flight.
    pub fn cancel(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        debug!(
            simulator = self.name,
            percentage = self.percentage,
            "progress run cancelled"
        );
        self.state = RunState::Idle;
        true
    }

    /// Consume `elapsed` wall-clock time, firing every tick that came due in
    /// order. Ticks are never coalesced: a long `elapsed` yields one entry
    /// per interval, up to and including the completing tick. Time left
    /// over after completion is discarded.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<ProgressTick> {
        let mut fired = Vec::new();
        let mut remaining = elapsed;

        loop {
            let (config, until_next_tick) = match &mut self.state {
                RunState::Running {
                    config,
                    until_next_tick,
                } => (config.clone(), until_next_tick),
                _ => break,
            };

            if remaining < *until_next_tick {
                *until_next_tick -= remaining;
                break;
            }
            remaining -= *until_next_tick;
            *until_next_tick = config.tick_interval();

            let tick = self.tick(&config);
            fired.push(tick);
            if tick.completed {
                break;
            }
        }

        fired
    }

    fn tick(&mut self, config: &ProgressConfig) -> ProgressTick {
        self.ticks += 1;
        self.percentage = (self.percentage + config.increment_per_tick).min(100);
        self.sub_step = Some(sub_step_for(self.percentage, config.total_sub_steps));

        let completed = self.percentage == 100;
        debug!(
            simulator = self.name,
            tick = self.ticks,
            percentage = self.percentage,
            "progress tick"
        );
        if completed {
            info!(simulator = self.name, ticks = self.ticks, "progress run completed");
            self.state = RunState::Completed;
        }

        ProgressTick {
            percentage: self.percentage,
            sub_step: self.sub_step,
            completed,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, RunState::Running { .. })
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.state, RunState::Completed)
    }

    pub fn percentage(&self) -> u32 {
        self.percentage
    }

    /// Active sub-step, or `None` before the first tick of a run.
    pub fn sub_step(&self) -> Option<usize> {
        self.sub_step
    }

    /// Sub-step as a signed index where -1 means no sub-step is active yet.
    pub fn sub_step_index(&self) -> i32 {
        self.sub_step.map_or(-1, |s| s as i32)
    }

    /// Ticks fired in the current (or last) run.
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Time until the next tick fires, if a run is active.
    pub fn until_next_tick(&self) -> Option<Duration> {
        match &self.state {
            RunState::Running {
                until_next_tick, ..
            } => Some(*until_next_tick),
            _ => None,
        }
    }
}
