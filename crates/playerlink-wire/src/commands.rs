//! Outbound command names issued by the facade.

/// Navigate to `params.pageNum`.
pub const PAGE_GOTO: &str = "sdk.experience.page.goto";
/// Navigate to the next page.
pub const PAGE_NEXT: &str = "sdk.experience.page.next";
/// Navigate to the previous page.
pub const PAGE_PREVIOUS: &str = "sdk.experience.page.previous";

pub const VIDEO_START: &str = "sdk.component.video.start";
pub const VIDEO_STOP: &str = "sdk.component.video.stop";
pub const COMPONENT_CLICK: &str = "sdk.component.click";
pub const COMPONENT_SHOW: &str = "sdk.component.show";
pub const COMPONENT_HIDE: &str = "sdk.component.hide";

pub const LAYER_SHOW: &str = "sdk.layer.show";
pub const LAYER_HIDE: &str = "sdk.layer.hide";

/// Disable `params.pageNum`.
pub const PAGE_DISABLE: &str = "sdk.page.disable";
/// Enable `params.pageNum`.
pub const PAGE_ENABLE: &str = "sdk.page.enable";
/// Start animations on `params.pageSlug`.
pub const PAGE_ANIMATIONS_START: &str = "sdk.page.animations.start";
/// Pause animations on `params.pageSlug`.
pub const PAGE_ANIMATIONS_PAUSE: &str = "sdk.page.animations.pause";

/// Every command name, for validation and CLI help.
pub const ALL: [&str; 14] = [
    PAGE_GOTO,
    PAGE_NEXT,
    PAGE_PREVIOUS,
    VIDEO_START,
    VIDEO_STOP,
    COMPONENT_CLICK,
    COMPONENT_SHOW,
    COMPONENT_HIDE,
    LAYER_SHOW,
    LAYER_HIDE,
    PAGE_DISABLE,
    PAGE_ENABLE,
    PAGE_ANIMATIONS_START,
    PAGE_ANIMATIONS_PAUSE,
];

/// Returns true if `name` is a command the player understands.
pub fn is_known_command(name: &str) -> bool {
    ALL.contains(&name)
}
