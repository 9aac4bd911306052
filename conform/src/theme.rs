//! Color theme system for conform.
//!
//! A `Theme` holds named `ratatui::style::Color` fields covering every UI surface
//! conform renders. Two built-in themes are provided:
//!
//! - `dark` uses ANSI 16 colors so it works on any terminal, including
//!   256-color SSH sessions with no truecolor support.
//! - `catppuccin_mocha` uses the Catppuccin Mocha palette in RGB; requires truecolor.

use conform_core::citation::CitationStatus;
use conform_core::notify::NoticeLevel;
use conform_core::types::{EvidenceStatus, OverallStatus};
use ratatui::style::Color;
use tracing::warn;

/// All color values used across conform's UI surfaces.
#[derive(Debug, Clone)]
pub struct Theme {
    // Panel borders
    /// Border color for the currently focused panel.
    pub border_active: Color,
    /// Border color for unfocused panels.
    pub border_inactive: Color,

    // Overall status badges
    pub status_pre_approved: Color,
    pub status_review_required: Color,
    pub status_action_mandatory: Color,

    // Evidence and citation markers
    pub evidence_match: Color,
    pub evidence_issue: Color,
    pub evidence_discrepancy: Color,

    // Notices
    pub notice_success: Color,
    pub notice_error: Color,
    pub notice_warning: Color,
    pub notice_info: Color,

    /// Secondary text: timestamps, page numbers, placeholders.
    pub muted: Color,
    /// Selection checkbox and highlighted list row.
    pub highlight: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    /// Mode indicator color in NORMAL mode.
    pub status_mode_normal: Color,
    /// Mode indicator color while typing (comment, search, dialogs).
    pub status_mode_insert: Color,

    /// Application background (used for clearing areas).
    pub background: Color,
}

impl Theme {
    /// Returns the built-in dark theme using ANSI 16 colors.
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            status_pre_approved: Color::Green,
            status_review_required: Color::Yellow,
            status_action_mandatory: Color::Red,

            evidence_match: Color::Green,
            evidence_issue: Color::Yellow,
            evidence_discrepancy: Color::Red,

            notice_success: Color::Green,
            notice_error: Color::Red,
            notice_warning: Color::Yellow,
            notice_info: Color::Blue,

            muted: Color::DarkGray,
            highlight: Color::Cyan,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode_normal: Color::Cyan,
            status_mode_insert: Color::Green,

            background: Color::Reset,
        }
    }

    /// Returns the Catppuccin Mocha theme using RGB truecolor values.
    ///
    /// Palette source: <https://github.com/catppuccin/catppuccin> Mocha variant.
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161);    // #a6e3a1
        let red = Color::Rgb(243, 139, 168);      // #f38ba8
        let yellow = Color::Rgb(249, 226, 175);   // #f9e2af
        let blue = Color::Rgb(137, 180, 250);     // #89b4fa
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface1 = Color::Rgb(69, 71, 90);    // #45475a
        let base = Color::Rgb(30, 30, 46);        // #1e1e2e
        let text = Color::Rgb(205, 214, 244);     // #cdd6f4
        let peach = Color::Rgb(250, 179, 135);    // #fab387

        Self {
            border_active: lavender,
            border_inactive: overlay1,

            status_pre_approved: green,
            status_review_required: yellow,
            status_action_mandatory: red,

            evidence_match: green,
            evidence_issue: peach,
            evidence_discrepancy: red,

            notice_success: green,
            notice_error: red,
            notice_warning: peach,
            notice_info: blue,

            muted: overlay1,
            highlight: lavender,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_mode_normal: lavender,
            status_mode_insert: green,

            background: base,
        }
    }

    /// Resolves a theme name string to the corresponding built-in theme.
    ///
    /// Unknown names fall back to `dark()` so a typo in config never prevents
    /// startup.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                warn!(theme = other, "unknown theme, falling back to 'dark'");
                Self::dark()
            }
        }
    }

    pub fn status(&self, status: OverallStatus) -> Color {
        match status {
            OverallStatus::PreApproved => self.status_pre_approved,
            OverallStatus::ReviewRequired => self.status_review_required,
            OverallStatus::ActionMandatory => self.status_action_mandatory,
        }
    }

    pub fn evidence(&self, status: EvidenceStatus) -> Color {
        match status {
            EvidenceStatus::Match => self.evidence_match,
            EvidenceStatus::PotentialIssue => self.evidence_issue,
            EvidenceStatus::Discrepancy => self.evidence_discrepancy,
        }
    }

    pub fn citation(&self, status: CitationStatus) -> Color {
        match status {
            CitationStatus::Match => self.evidence_match,
            CitationStatus::Issue => self.evidence_issue,
            CitationStatus::Discrepancy => self.evidence_discrepancy,
        }
    }

    pub fn notice(&self, level: NoticeLevel) -> Color {
        match level {
            NoticeLevel::Success => self.notice_success,
            NoticeLevel::Error => self.notice_error,
            NoticeLevel::Warning => self.notice_warning,
            NoticeLevel::Info => self.notice_info,
        }
    }
}
