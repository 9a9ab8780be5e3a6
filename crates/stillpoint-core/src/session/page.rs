use std::fmt;

use serde::{Deserialize, Serialize};

use super::PracticeSession;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    Selection,
    EmotionCheck,
    Preparation,
    Practice,
    Completion,
    MoodRecord,
    Success,
}

impl Page {
    pub fn as_str(&self) -> &'static str {
        match self {
            Page::Selection => "selection",
            Page::EmotionCheck => "emotion-check",
            Page::Preparation => "preparation",
            Page::Practice => "practice",
            Page::Completion => "completion",
            Page::MoodRecord => "mood-record",
            Page::Success => "success",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowKind {
    /// Full flow with emotion check and optional mood record.
    #[default]
    Guided,
    /// Straight to preparation, no emotion check or mood record.
    Quick,
}

const GUIDED_PAGES: &[Page] = &[
    Page::Selection,
    Page::EmotionCheck,
    Page::Preparation,
    Page::Practice,
    Page::Completion,
    Page::MoodRecord,
    Page::Success,
];

const QUICK_PAGES: &[Page] = &[
    Page::Selection,
    Page::Preparation,
    Page::Practice,
    Page::Completion,
    Page::Success,
];

impl FlowKind {
    pub fn pages(&self) -> &'static [Page] {
        match self {
            FlowKind::Guided => GUIDED_PAGES,
            FlowKind::Quick => QUICK_PAGES,
        }
    }
}

/// Result of a single navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Moved { from: Page, to: Page },
    /// Guard refused the move; the current page is unchanged.
    Blocked { page: Page, reason: String },
    /// Back from the first page: leave the flow.
    Exit,
}

/// Position within a flow's fixed page list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageFlow {
    kind: FlowKind,
    index: usize,
}

impl PageFlow {
    pub fn new(kind: FlowKind) -> Self {
        Self { kind, index: 0 }
    }

    /// Position a flow at a recorded page index.
    ///
    /// # Errors
    /// Returns `OutOfRange` if the index is past the last page.
    pub fn at(kind: FlowKind, index: usize) -> Result<Self, ValidationError> {
        let len = kind.pages().len();
        if index >= len {
            return Err(ValidationError::OutOfRange {
                field: "page_index".into(),
                message: format!("{index} is past the last page ({})", len - 1),
            });
        }
        Ok(Self { kind, index })
    }

    pub fn kind(&self) -> FlowKind {
        self.kind
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Page {
        self.kind.pages()[self.index]
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_terminal(&self) -> bool {
        self.current() == Page::Success
    }

    /// Pages between the first and the terminal one can be resumed.
    pub fn is_resumable(&self) -> bool {
        !self.is_first() && !self.is_terminal()
    }

    pub fn next(&mut self, session: &PracticeSession) -> Transition {
        let from = self.current();
        if self.is_terminal() {
            return Transition::Blocked {
                page: from,
                reason: "flow already finished".into(),
            };
        }
        if from == Page::EmotionCheck && session.emotion.is_none() {
            return Transition::Blocked {
                page: from,
                reason: "select an emotion first".into(),
            };
        }
        self.index += 1;
        Transition::Moved {
            from,
            to: self.current(),
        }
    }

    pub fn back(&mut self) -> Transition {
        let from = self.current();
        if self.is_first() {
            return Transition::Exit;
        }
        if self.is_terminal() {
            return Transition::Blocked {
                page: from,
                reason: "flow already finished".into(),
            };
        }
        self.index -= 1;
        Transition::Moved {
            from,
            to: self.current(),
        }
    }

    /// Completion page straight to success, bypassing the mood record.
    pub fn skip_mood_record(&mut self) -> Transition {
        let from = self.current();
        if from != Page::Completion {
            return Transition::Blocked {
                page: from,
                reason: "mood record can only be skipped from the completion page".into(),
            };
        }
        let pages = self.kind.pages();
        // Both built-in flows end in Success.
        self.index = pages.len() - 1;
        Transition::Moved {
            from,
            to: self.current(),
        }
    }
}
