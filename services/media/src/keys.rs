//! Object key generation
//!
//! Keys have the form `<orientation>/<id>.<ext>`, where `id` is 32 bytes from
//! the operating system CSPRNG encoded as unpadded base64url (43 chars).
//! Keys are never checked for collisions.

use crate::aspect::Orientation;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;

/// Number of random bytes in an object identifier
pub const OBJECT_ID_BYTES: usize = 32;

/// A fresh random object identifier
pub fn random_object_id() -> String {
    let mut bytes = [0u8; OBJECT_ID_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// File extension for a media type, e.g. `video/mp4` -> `mp4`
pub fn extension_for(media_type: &str) -> &str {
    media_type
        .strip_prefix("video/")
        .or_else(|| media_type.rsplit_once('/').map(|(_, subtype)| subtype))
        .unwrap_or(media_type)
}

/// Derive a new storage key for a video of the given orientation
pub fn generate_object_key(orientation: Orientation, media_type: &str) -> String {
    format!(
        "{}/{}.{}",
        orientation,
        random_object_id(),
        extension_for(media_type)
    )
}
