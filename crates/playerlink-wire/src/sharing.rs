use std::fmt;

/// Social network targeted by a `social.share` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SharingType {
    Facebook,
    Twitter,
    Pinterest,
    Email,
}

impl SharingType {
    /// Public name exposed to host code.
    pub fn as_str(self) -> &'static str {
        match self {
            SharingType::Facebook => "facebook",
            SharingType::Twitter => "twitter",
            SharingType::Pinterest => "pinterest",
            SharingType::Email => "email",
        }
    }

    /// Map the player's internal share component type (`share-facebook`, ...).
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "share-facebook" => Some(SharingType::Facebook),
            "share-twitter" => Some(SharingType::Twitter),
            "share-pinterest" => Some(SharingType::Pinterest),
            "share-email" => Some(SharingType::Email),
            _ => None,
        }
    }
}

impl fmt::Display for SharingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
