//! Room identifiers, invite links and export filenames.
//!
//! A room only namespaces the invite link and the export filename. It never
//! changes what is drawn or where the tile is stored.

use crate::persistence::TileStore;
use crate::storage::Storage;
use std::fmt;
use url::Url;
use uuid::Uuid;

/// Length of a generated room id.
pub const ROOM_ID_LEN: usize = 8;

/// Prefix of exported image filenames.
pub const EXPORT_PREFIX: &str = "cocreate";

/// Query parameter carrying the room id.
pub const ROOM_PARAM: &str = "room";

/// A non-empty, trimmed room identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomId(String);

impl RoomId {
    /// Random 8-character id.
    pub fn generate() -> Self {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(ROOM_ID_LEN);
        RoomId(id)
    }

    /// Accept a user-supplied id; blank input is rejected.
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| RoomId(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Room id from a URL query or fragment string such as `?room=abc&x=1`.
pub fn room_from_query(query: &str) -> Option<RoomId> {
    let query = query.trim_start_matches(['?', '#']);
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == ROOM_PARAM)
        .and_then(|(_, value)| RoomId::parse(&value))
}

/// Room id from a full invite URL.
pub fn room_from_invite(invite: &str) -> Option<RoomId> {
    match Url::parse(invite) {
        Ok(url) => url.query().and_then(room_from_query),
        Err(e) => {
            log::warn!("Ignoring invalid invite URL {:?}: {}", invite, e);
            None
        }
    }
}

/// Pick the session's room.
///
/// An explicitly requested room wins and is stored; otherwise the stored
/// room is reused; otherwise a new one is generated and stored.
pub fn resolve_room<S: Storage>(requested: Option<RoomId>, store: &TileStore<S>) -> RoomId {
    if let Some(room) = requested {
        store.save_room(room.as_str());
        return room;
    }
    if let Some(room) = store.load_room().as_deref().and_then(RoomId::parse) {
        return room;
    }
    let room = RoomId::generate();
    log::info!("Generated room {}", room);
    store.save_room(room.as_str());
    room
}

/// Invite link for `room`, e.g. `https://host/tile?room=abc`.
///
/// Any existing `room` parameter on `base` is replaced. A base that is not a
/// valid URL gets the parameter appended verbatim.
pub fn invite_url(base: &str, room: &RoomId) -> String {
    let Ok(mut url) = Url::parse(base) else {
        return format!("{}?{}={}", base, ROOM_PARAM, room);
    };
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != ROOM_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(ROOM_PARAM, room.as_str());
    url.into()
}

/// Export filename: `cocreate_{room}_{unix_millis}.png`.
pub fn export_filename(room: &RoomId, unix_millis: i64) -> String {
    format!("{}_{}_{}.png", EXPORT_PREFIX, room, unix_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn store() -> TileStore<MemoryStorage> {
        TileStore::new(Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn test_generate() {
        let a = RoomId::generate();
        let b = RoomId::generate();
        assert_eq!(a.as_str().len(), ROOM_ID_LEN);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_trims() {
        assert_eq!(RoomId::parse("  team-1 ").unwrap().as_str(), "team-1");
        assert!(RoomId::parse("   ").is_none());
    }

    #[test]
    fn test_room_from_query() {
        assert_eq!(room_from_query("?room=abc&x=1").unwrap().as_str(), "abc");
        assert_eq!(room_from_query("#x=1&room=my%20room").unwrap().as_str(), "my room");
        assert!(room_from_query("?room=").is_none());
        assert!(room_from_query("x=1").is_none());
    }

    #[test]
    fn test_room_from_invite() {
        let room = room_from_invite("https://tiles.example/?room=r42").unwrap();
        assert_eq!(room.as_str(), "r42");
        assert!(room_from_invite("not a url").is_none());
        assert!(room_from_invite("https://tiles.example/").is_none());
    }

    #[test]
    fn test_resolve_requested_wins() {
        let store = store();
        store.save_room("old");
        let room = resolve_room(RoomId::parse("new"), &store);
        assert_eq!(room.as_str(), "new");
        assert_eq!(store.load_room().as_deref(), Some("new"));
    }

    #[test]
    fn test_resolve_stored_then_generated() {
        let store = store();
        let generated = resolve_room(None, &store);
        assert_eq!(store.load_room().as_deref(), Some(generated.as_str()));

        let again = resolve_room(None, &store);
        assert_eq!(again, generated);
    }

    #[test]
    fn test_invite_url() {
        let room = RoomId::parse("abc").unwrap();
        assert_eq!(invite_url("https://tiles.example/", &room), "https://tiles.example/?room=abc");
        assert_eq!(
            invite_url("https://tiles.example/?room=old&theme=dark", &room),
            "https://tiles.example/?theme=dark&room=abc"
        );
        assert_eq!(invite_url("cocreate", &room), "cocreate?room=abc");
    }

    #[test]
    fn test_export_filename() {
        let room = RoomId::parse("abc").unwrap();
        assert_eq!(export_filename(&room, 1_700_000_000_123), "cocreate_abc_1700000000123.png");
    }
}
