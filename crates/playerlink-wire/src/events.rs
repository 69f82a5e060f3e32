//! Inbound event names.
//!
//! `ready` is announced once by each frame when its experience has loaded and
//! is the only event dispatched before the sender's peer id is known. All
//! other events carry `params.experienceId`.

use std::fmt;
use std::str::FromStr;

use crate::error::WireError;

/// A frame finished loading and announces its snapshot.
pub const READY: &str = "ready";

/// The experience navigated to a new page.
pub const PAGE_CHANGED: &str = "page.changed";

/// The experience is about to navigate.
pub const PAGE_CHANGING: &str = "page.changing";

/// A component was clicked.
pub const COMPONENT_CLICKED: &str = "component.clicked";

/// A layer became visible.
pub const LAYER_SHOWN: &str = "layer.shown";

/// A layer was hidden.
pub const LAYER_HIDDEN: &str = "layer.hidden";

/// A share component was used.
pub const SOCIAL_SHARE: &str = "social.share";

/// A component animation started.
pub const ANIMATION_STARTED: &str = "animation.started";

/// A component animation ended.
pub const ANIMATION_ENDED: &str = "animation.ended";

/// A video component started playing.
pub const VIDEO_PLAYED: &str = "video.played";

/// Events a host can subscribe to through the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PageChanged,
    PageChanging,
    ComponentClicked,
    LayerShown,
    LayerHidden,
    SocialShare,
    AnimationStarted,
    AnimationEnded,
    VideoPlayed,
}

impl EventKind {
    /// Every subscribable kind, in declaration order.
    pub const ALL: [EventKind; 9] = [
        EventKind::PageChanged,
        EventKind::PageChanging,
        EventKind::ComponentClicked,
        EventKind::LayerShown,
        EventKind::LayerHidden,
        EventKind::SocialShare,
        EventKind::AnimationStarted,
        EventKind::AnimationEnded,
        EventKind::VideoPlayed,
    ];

    /// Wire name of the event, without namespace.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::PageChanged => PAGE_CHANGED,
            EventKind::PageChanging => PAGE_CHANGING,
            EventKind::ComponentClicked => COMPONENT_CLICKED,
            EventKind::LayerShown => LAYER_SHOWN,
            EventKind::LayerHidden => LAYER_HIDDEN,
            EventKind::SocialShare => SOCIAL_SHARE,
            EventKind::AnimationStarted => ANIMATION_STARTED,
            EventKind::AnimationEnded => ANIMATION_ENDED,
            EventKind::VideoPlayed => VIDEO_PLAYED,
        }
    }

    /// True for the navigation events.
    pub fn is_page_event(self) -> bool {
        matches!(self, EventKind::PageChanged | EventKind::PageChanging)
    }

    /// True for events that name a component in `params.componentId`.
    pub fn is_component_event(self) -> bool {
        matches!(
            self,
            EventKind::ComponentClicked
                | EventKind::SocialShare
                | EventKind::AnimationStarted
                | EventKind::AnimationEnded
                | EventKind::VideoPlayed
        )
    }

    /// True for events that name a layer in `params.layerId`.
    pub fn is_layer_event(self) -> bool {
        matches!(self, EventKind::LayerShown | EventKind::LayerHidden)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = WireError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| WireError::UnknownEvent(name.to_string()))
    }
}

/// Returns true if `name` is an inbound event this protocol defines.
pub fn is_known_event(name: &str) -> bool {
    name == READY || name.parse::<EventKind>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
    }

    #[test]
    fn ready_is_known_but_not_subscribable() {
        assert!(is_known_event(READY));
        assert!(READY.parse::<EventKind>().is_err());
        assert!(!is_known_event("page.exploded"));
    }

    #[test]
    fn kinds_partition_by_target() {
        for kind in EventKind::ALL {
            let targets = [
                kind.is_page_event(),
                kind.is_component_event(),
                kind.is_layer_event(),
            ];
            assert_eq!(targets.iter().filter(|t| **t).count(), 1, "{kind}");
        }
    }
}
