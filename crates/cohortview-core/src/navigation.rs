//! # Navigation Module
//!
//! The fixed set of dashboard pages and the single "current page" value.
//!
//! Exactly one page is current at any time. Page content is derived solely
//! from that value; nothing else survives a page switch.

use crate::CohortError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A dashboard page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    #[default]
    Home,
    Metrics,
    SingleCellAtlas,
    SingleCellTrajectories,
    Team,
    Contact,
}

impl Page {
    /// All pages in navigation order. The first entry is the landing page.
    pub const ALL: [Page; 6] = [
        Page::Home,
        Page::Metrics,
        Page::SingleCellAtlas,
        Page::SingleCellTrajectories,
        Page::Team,
        Page::Contact,
    ];

    /// URL-safe identifier.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Metrics => "metrics",
            Self::SingleCellAtlas => "single-cell-atlas",
            Self::SingleCellTrajectories => "single-cell-trajectories",
            Self::Team => "team",
            Self::Contact => "contact",
        }
    }

    /// Title shown in the navigation control.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::Metrics => "Biochemical metrics",
            Self::SingleCellAtlas => "Single-cell atlas",
            Self::SingleCellTrajectories => "Single-cell trajectories",
            Self::Team => "Team",
            Self::Contact => "Contact",
        }
    }

    /// One-line description of the page.
    #[must_use]
    pub const fn summary(self) -> &'static str {
        match self {
            Self::Home => "Overview of the cohort dashboard and how to use it.",
            Self::Metrics => {
                "Upload a CSV of biochemical measurements and compare a metric across sex or age."
            }
            Self::SingleCellAtlas => {
                "Cell-type atlas from single-cell sequencing. This view is not available yet."
            }
            Self::SingleCellTrajectories => {
                "Developmental trajectories from single-cell sequencing. This view is not available yet."
            }
            Self::Team => "The people behind the cohort study.",
            Self::Contact => "How to reach the study team.",
        }
    }

    /// Placeholder pages render a static message and carry no data.
    #[must_use]
    pub const fn is_placeholder(self) -> bool {
        matches!(self, Self::SingleCellAtlas | Self::SingleCellTrajectories)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for Page {
    type Err = CohortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|page| page.slug() == wanted)
            .ok_or_else(|| CohortError::UnknownPage(wanted.to_string()))
    }
}

/// The current-page value, scoped to one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NavigationState {
    current: Page,
}

impl NavigationState {
    /// Start on the landing page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The page being shown.
    #[must_use]
    pub fn current(&self) -> Page {
        self.current
    }

    /// Switch pages. Returns the previous page.
    pub fn select(&mut self, page: Page) -> Page {
        std::mem::replace(&mut self.current, page)
    }

    /// Switch pages by slug.
    pub fn select_slug(&mut self, slug: &str) -> Result<Page, CohortError> {
        let page = slug.parse::<Page>()?;
        self.select(page);
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_home() {
        assert_eq!(NavigationState::new().current(), Page::Home);
        assert_eq!(Page::ALL[0], Page::Home);
    }

    #[test]
    fn select_changes_current_page() {
        let mut nav = NavigationState::new();
        let previous = nav.select(Page::Team);
        assert_eq!(previous, Page::Home);
        assert_eq!(nav.current(), Page::Team);
    }

    #[test]
    fn slugs_round_trip() {
        for page in Page::ALL {
            assert_eq!(page.slug().parse::<Page>(), Ok(page));
        }
    }

    #[test]
    fn unknown_slug_leaves_state_untouched() {
        let mut nav = NavigationState::new();
        nav.select(Page::Metrics);
        assert_eq!(
            nav.select_slug("settings"),
            Err(CohortError::UnknownPage("settings".into()))
        );
        assert_eq!(nav.current(), Page::Metrics);
    }

    #[test]
    fn exactly_two_placeholders() {
        let placeholders: Vec<_> = Page::ALL.into_iter().filter(|p| p.is_placeholder()).collect();
        assert_eq!(
            placeholders,
            vec![Page::SingleCellAtlas, Page::SingleCellTrajectories]
        );
    }
}
