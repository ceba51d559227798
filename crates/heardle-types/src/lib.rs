use serde::{Deserialize, Serialize};

/// Cover image attached to a playlist.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlaylistImage {
    /// Absolute URL of the image.
    pub url: String,
}

/// Track-count metadata nested inside a playlist.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TracksInfo {
    /// Total number of tracks in the playlist.
    pub total: u32,
}

/// A selectable playlist as returned by `GET /api/playlists`.
///
/// Playlists are rendered in the order the backend returns them; the client
/// does not sort.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Playlist {
    /// Opaque playlist id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Cover images, largest first. May be empty.
    #[serde(default)]
    pub images: Vec<PlaylistImage>,
    /// Track-count metadata.
    #[serde(default)]
    pub tracks: TracksInfo,
}

/// One search result row from `GET /api/search?q=`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackHit {
    /// Opaque track id, submitted back with a guess.
    pub id: String,
    /// Track title.
    pub name: String,
    /// Artist display names.
    #[serde(default)]
    pub artists: Vec<String>,
}

/// Revealed answer included in terminal guess/skip responses.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CorrectSong {
    /// Track id, when the server includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Track title.
    pub name: String,
    /// Artist display names, joined with ", " for display.
    #[serde(default)]
    pub artists: Vec<String>,
    /// Preview URL, when the server includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

/// Body of `POST /api/game/start`. Exactly one of the two fields is set,
/// depending on whether the session spans one playlist or several.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StartGameRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlist_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlist_ids: Option<Vec<String>>,
}

/// Response of `POST /api/game/start`.
///
/// The clip source is either `preview_url` (preview backend) or `track_uri`
/// (device backend); servers send one of the two. Skip-budget fields are
/// only present on servers that track a budget.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StartGameResponse {
    /// Opaque session id, echoed back with every guess/skip.
    pub session_id: String,
    /// Seconds of audio the client may play before pausing.
    pub audio_duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skips_used: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_skip: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playlist_id: Option<String>,
}

/// Body of `POST /api/game/guess`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GuessRequest {
    pub session_id: String,
    pub track_id: String,
    pub track_name: String,
}

/// Response of `POST /api/game/guess`. A pure mirror of server-held session
/// state; the client never derives any of these fields itself.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GuessResponse {
    /// Whether this guess named the hidden track.
    pub is_correct: bool,
    /// Whether the session is over (win or out of guesses).
    pub is_complete: bool,
    /// Whether the player won. Absent on servers that only report it at
    /// completion; falls back to `is_correct`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub won: Option<bool>,
    /// Guesses consumed so far.
    pub guesses_used: u32,
    /// Clip length unlocked for the next listen, in seconds.
    pub audio_duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skips_used: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_skip: Option<bool>,
    /// Revealed answer; present once `is_complete` is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_song: Option<CorrectSong>,
}

/// Body of `POST /api/game/skip`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SkipRequest {
    pub session_id: String,
}

/// Response of `POST /api/game/skip`.
///
/// Budget-variant servers return updated budget fields and may keep the
/// session running; the confirm-variant server returns only the answer, so
/// `is_complete` defaults to true when absent.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SkipResponse {
    #[serde(default = "default_true")]
    pub is_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skips_used: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_skip: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_song: Option<CorrectSong>,
}

fn default_true() -> bool {
    true
}

/// Response of `GET /api/token`: short-lived bearer token for the partner
/// playback API.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
}

/// One playback device known to the partner API. Partner payloads are
/// snake_case, unlike the game backend.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Device {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub is_active: bool,
}

/// Response of the partner device-list endpoint.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceList {
    #[serde(default)]
    pub devices: Vec<Device>,
}

/// Body of the partner play-from-uri call.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayFromUriRequest {
    pub uris: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playlist_decodes_backend_shape() {
        let json = r#"{
            "id": "pl1",
            "name": "Road Trip",
            "images": [{"url": "https://img.example/cover.jpg"}],
            "tracks": {"total": 42}
        }"#;
        let p: Playlist = serde_json::from_str(json).unwrap();
        assert_eq!(p.id, "pl1");
        assert_eq!(p.tracks.total, 42);
        assert_eq!(p.images[0].url, "https://img.example/cover.jpg");
    }

    #[test]
    fn playlist_tolerates_missing_images() {
        let json = r#"{"id": "pl2", "name": "No Art", "tracks": {"total": 3}}"#;
        let p: Playlist = serde_json::from_str(json).unwrap();
        assert!(p.images.is_empty());
    }

    #[test]
    fn start_request_serializes_single_scope_only() {
        let req = StartGameRequest {
            playlist_id: Some("pl1".into()),
            playlist_ids: None,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"playlistId":"pl1"}"#);
    }

    #[test]
    fn guess_response_decodes_completion_payload() {
        let json = r#"{
            "isCorrect": true,
            "isComplete": true,
            "won": true,
            "guessesUsed": 2,
            "audioDuration": 4,
            "correctSong": {"name": "Song A", "artists": ["Artist X"]}
        }"#;
        let resp: GuessResponse = serde_json::from_str(json).unwrap();
        assert!(resp.is_complete);
        assert_eq!(resp.won, Some(true));
        assert_eq!(resp.correct_song.unwrap().artists, vec!["Artist X"]);
    }

    #[test]
    fn skip_response_defaults_to_complete() {
        // The confirm-variant server sends only the revealed answer.
        let json = r#"{"correctSong": {"name": "Song B", "artists": ["Artist Y"]}}"#;
        let resp: SkipResponse = serde_json::from_str(json).unwrap();
        assert!(resp.is_complete);
        assert!(resp.can_skip.is_none());
    }

    #[test]
    fn device_list_uses_partner_field_names() {
        let json = r#"{"devices": [{"id": "d1", "name": "Kitchen", "is_active": true}]}"#;
        let list: DeviceList = serde_json::from_str(json).unwrap();
        assert!(list.devices[0].is_active);
    }
}
