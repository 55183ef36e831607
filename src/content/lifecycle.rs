//! Status state machine.
//!
//! ```text
//! draft --schedule--> approved --publish | time elapses--> published
//! draft --publish--> published --unpublish--> draft
//! published --archive--> archived --restore--> draft
//! ```
//!
//! Every transition keeps `status == Published` equivalent to
//! `published_at.is_some()`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::{Content, ContentError, ContentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Transition {
    Schedule { at: DateTime<Utc> },
    Publish,
    Unpublish,
    Archive,
    Restore,
}

impl Transition {
    pub fn action(&self) -> &'static str {
        match self {
            Self::Schedule { .. } => "schedule",
            Self::Publish => "publish",
            Self::Unpublish => "unpublish",
            Self::Archive => "archive",
            Self::Restore => "restore",
        }
    }

    pub fn target(&self) -> ContentStatus {
        match self {
            Self::Schedule { .. } => ContentStatus::Approved,
            Self::Publish => ContentStatus::Published,
            Self::Unpublish | Self::Restore => ContentStatus::Draft,
            Self::Archive => ContentStatus::Archived,
        }
    }

    fn allowed_from(&self, from: ContentStatus) -> bool {
        use ContentStatus::*;
        match self {
            Self::Schedule { .. } => matches!(from, Draft | Approved),
            Self::Publish => matches!(from, Draft | Approved),
            Self::Unpublish => from == Published,
            Self::Archive => from == Published,
            Self::Restore => from == Archived,
        }
    }
}

/// Applies `transition` in place. Does not touch the version counter.
pub fn apply(content: &mut Content, transition: Transition, now: DateTime<Utc>) -> Result<(), ContentError> {
    if !transition.allowed_from(content.status) {
        return Err(ContentError::InvalidTransition {
            id: content.id.clone(),
            action: transition.action(),
            from: content.status,
        });
    }

    match transition {
        Transition::Schedule { at } => {
            content.scheduled_at = Some(at);
            content.published_at = None;
        }
        Transition::Publish => {
            content.published_at = Some(now);
            content.scheduled_at = None;
        }
        Transition::Unpublish | Transition::Archive | Transition::Restore => {
            content.published_at = None;
            content.scheduled_at = None;
        }
    }
    content.status = transition.target();
    content.updated_at = now;
    Ok(())
}

/// Brings `published_at` in line with a status set directly (on create,
/// bulk status changes or form input).
pub fn set_status(content: &mut Content, status: ContentStatus, now: DateTime<Utc>) {
    content.status = status;
    match status {
        ContentStatus::Published => {
            content.published_at.get_or_insert(now);
            content.scheduled_at = None;
        }
        ContentStatus::Approved => content.published_at = None,
        ContentStatus::Draft | ContentStatus::Archived => {
            content.published_at = None;
            content.scheduled_at = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{BodyFormat, ContentBody, ContentSource, ContentType};
    use chrono::Duration;

    fn draft() -> Content {
        Content::new(
            "c1",
            ContentType::Manual,
            ContentSource::Manual,
            "t",
            ContentBody::from_raw("<p>b</p>", BodyFormat::Html),
            Utc::now(),
        )
    }

    fn published_invariant(c: &Content) -> bool {
        (c.status == ContentStatus::Published) == c.published_at.is_some()
    }

    #[test]
    fn test_full_cycle_keeps_invariant() {
        let now = Utc::now();
        let mut c = draft();
        let steps = [
            Transition::Schedule { at: now + Duration::hours(1) },
            Transition::Publish,
            Transition::Unpublish,
            Transition::Publish,
            Transition::Archive,
            Transition::Restore,
        ];
        for step in steps {
            apply(&mut c, step, now).unwrap();
            assert_eq!(c.status, step.target());
            assert!(published_invariant(&c));
        }
        assert!(c.scheduled_at.is_none());
    }

    #[test]
    fn test_rejects_invalid_transitions() {
        let now = Utc::now();
        let mut c = draft();
        for step in [Transition::Unpublish, Transition::Archive, Transition::Restore] {
            let err = apply(&mut c, step, now).unwrap_err();
            assert!(matches!(err, ContentError::InvalidTransition { from: ContentStatus::Draft, .. }));
        }
        assert_eq!(c.status, ContentStatus::Draft);

        apply(&mut c, Transition::Publish, now).unwrap();
        let err = apply(&mut c, Transition::Publish, now).unwrap_err();
        assert_eq!(err.to_string(), "Content c1 cannot publish while published");
    }

    #[test]
    fn test_set_status_keeps_invariant() {
        let now = Utc::now();
        let mut c = draft();
        for status in [
            ContentStatus::Published,
            ContentStatus::Archived,
            ContentStatus::Approved,
            ContentStatus::Published,
            ContentStatus::Draft,
        ] {
            set_status(&mut c, status, now);
            assert!(published_invariant(&c));
        }
    }
}
