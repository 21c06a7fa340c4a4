// Copyright 2026 The GraphGuard Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;

use crate::verdict::{RiskVerdict, ScoringModel};
use crate::wizard::Stage;

/// Published by the controller after every progress tick, layout frame
/// and accepted action. Rejected actions publish nothing.
#[derive(Clone, Debug, PartialEq)]
pub enum WizardEvent {
    FeatureStarted,
    FeatureProgress {
        percentage: u32,
        sub_step: Option<usize>,
    },
    FeatureCompleted,
    StageChanged {
        from: Stage,
        to: Stage,
    },
    ModelSelected(ScoringModel),
    ScoringStarted(ScoringModel),
    ScoringProgress {
        percentage: u32,
    },
    /// A run was abandoned by leaving the judgment stage.
    ScoringCancelled {
        percentage: u32,
    },
    VerdictReady(RiskVerdict),
    RecognitionCompleted,
    GraphFrame {
        alpha: f64,
        running: bool,
    },
    NodeDragged {
        node: String,
        pinned: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

pub type Observer = Box<dyn FnMut(&WizardEvent)>;

/// Callbacks notified synchronously, in subscription order.
#[derive(Default)]
pub struct Observers {
    next_id: u64,
    entries: Vec<(ObserverId, Observer)>,
}

impl Observers {
    pub fn subscribe(&mut self, observer: Observer) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, observer));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub fn emit(&mut self, event: &WizardEvent) {
        for (_, observer) in self.entries.iter_mut() {
            observer(event);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.entries.len())
            .finish()
    }
}
