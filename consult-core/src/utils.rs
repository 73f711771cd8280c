pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_3: &str = "stun:stun2.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_4: &str = "stun:stun3.l.google.com:19302";

/// A consult room pairs exactly one patient with one provider.
pub const DEFAULT_MAX_ROOM_MEMBERS: usize = 2;

/// Upper bound on the length of a room identifier, in bytes.
pub const MAX_ROOM_ID_LEN: usize = 128;

/// Identity headers set by the authenticating gateway in front of `/ws`.
pub const USER_ID_HEADER: &str = "x-user-id";
pub const DISPLAY_NAME_HEADER: &str = "x-display-name";

pub fn default_stun_urls() -> Vec<String> {
    [
        DEFAULT_STUN_ADDR,
        DEFAULT_STUN_ADDR_2,
        DEFAULT_STUN_ADDR_3,
        DEFAULT_STUN_ADDR_4,
    ]
    .iter()
    .map(|url| url.to_string())
    .collect()
}
