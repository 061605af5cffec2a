//! Now-playing state from whichever of the two supported players responds
//! first. Queries run on a dedicated worker thread so a slow or hung
//! `osascript` call never touches the UI thread; results come back tagged
//! with the generation of the request that produced them, and the shell
//! drops any result older than the newest one issued.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use crate::schedule::Generation;
use crate::script::ScriptRunner;

/// Field separator for the scripted status response. Chosen to never occur
/// in track metadata.
pub const FIELD_DELIMITER: &str = "|||";

/// Fixed re-query cadence while the app runs.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerKind {
    Spotify,
    Music,
}

impl PlayerKind {
    /// Query order; the first player that yields data wins.
    pub const FALLBACK_ORDER: [PlayerKind; 2] = [PlayerKind::Spotify, PlayerKind::Music];

    pub fn app_name(self) -> &'static str {
        match self {
            PlayerKind::Spotify => "Spotify",
            PlayerKind::Music => "Music",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub playing: bool,
    pub player: PlayerKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCommand {
    PlayPause,
    NextTrack,
    PreviousTrack,
}

impl MediaCommand {
    /// How long after sending the command the UI waits before re-querying to
    /// reconcile. There is no synchronous confirmation.
    pub fn requery_delay(self) -> Duration {
        match self {
            MediaCommand::PlayPause => Duration::from_millis(300),
            MediaCommand::NextTrack | MediaCommand::PreviousTrack => Duration::from_millis(500),
        }
    }
}

/// Status query for one player. A player that is not running or has nothing
/// loaded answers with an empty string.
pub fn status_script(player: PlayerKind) -> String {
    let app = player.app_name();
    format!(
        r#"tell application "{app}"
    if it is running then
        if player state is playing or player state is paused then
            set trackName to name of current track
            set artistName to artist of current track
            set albumName to album of current track
            set stateFlag to (player state is playing)
            return trackName & "{FIELD_DELIMITER}" & artistName & "{FIELD_DELIMITER}" & albumName & "{FIELD_DELIMITER}" & stateFlag
        end if
    end if
end tell
return """#
    )
}

pub fn command_script(player: PlayerKind, command: MediaCommand) -> String {
    let app = player.app_name();
    let verb = match command {
        MediaCommand::PlayPause => "playpause",
        MediaCommand::NextTrack => "next track",
        MediaCommand::PreviousTrack => "previous track",
    };
    format!(r#"tell application "{app}" to {verb}"#)
}

/// Positional parse of the delimited status response. Anything short or
/// empty is "no data", never an error; extra fields are ignored.
pub fn parse_status_response(response: &str, player: PlayerKind) -> Option<TrackInfo> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parts: Vec<&str> = trimmed.split(FIELD_DELIMITER).collect();
    if parts.len() < 4 {
        return None;
    }
    let album = parts[2].trim();
    Some(TrackInfo {
        title: parts[0].trim().to_string(),
        artist: parts[1].trim().to_string(),
        album: (!album.is_empty()).then(|| album.to_string()),
        playing: parts[3].trim() == "true",
        player,
    })
}

/// Asks each player in fallback order; first parsed answer wins. Script
/// failures count as "no data" for that player.
pub fn query_any(runner: &dyn ScriptRunner) -> Option<TrackInfo> {
    for player in PlayerKind::FALLBACK_ORDER {
        match runner.run(&status_script(player)) {
            Ok(response) => {
                if let Some(track) = parse_status_response(&response, player) {
                    return Some(track);
                }
            }
            Err(err) => log::debug!("media: {} query failed: {err}", player.app_name()),
        }
    }
    None
}

#[derive(Debug)]
pub enum BridgeCommand {
    Fetch(Generation),
    Player(MediaCommand),
    Shutdown,
}

#[derive(Debug)]
pub struct FetchResult {
    pub generation: Generation,
    pub track: Option<TrackInfo>,
}

/// Handle to the worker thread. Dropping it tells the worker to shut down.
pub struct MediaBridge {
    command_tx: Option<Sender<BridgeCommand>>,
    result_rx: Receiver<FetchResult>,
}

impl MediaBridge {
    pub fn spawn(runner: Box<dyn ScriptRunner>) -> Self {
        let (command_tx, command_rx) = mpsc::channel();
        let (result_tx, result_rx) = mpsc::channel();
        thread::spawn(move || worker_loop(runner, command_rx, result_tx));
        Self {
            command_tx: Some(command_tx),
            result_rx,
        }
    }

    /// Queues a status fetch. Returns false when the worker is gone.
    pub fn request_fetch(&self, generation: Generation) -> bool {
        match &self.command_tx {
            Some(tx) => tx.send(BridgeCommand::Fetch(generation)).is_ok(),
            None => false,
        }
    }

    /// Fire-and-forget playback command to the last-detected player.
    pub fn send_command(&self, command: MediaCommand) {
        if let Some(tx) = &self.command_tx {
            let _ = tx.send(BridgeCommand::Player(command));
        }
    }

    pub fn try_recv(&self) -> Option<FetchResult> {
        self.result_rx.try_recv().ok()
    }
}

impl Drop for MediaBridge {
    fn drop(&mut self) {
        if let Some(tx) = self.command_tx.take() {
            let _ = tx.send(BridgeCommand::Shutdown);
        }
    }
}

fn worker_loop(
    runner: Box<dyn ScriptRunner>,
    command_rx: Receiver<BridgeCommand>,
    result_tx: Sender<FetchResult>,
) {
    // Commands go to whichever player most recently answered a fetch; until
    // one has, they are dropped.
    let mut last_player: Option<PlayerKind> = None;

    while let Ok(command) = command_rx.recv() {
        match command {
            BridgeCommand::Fetch(generation) => {
                let track = query_any(runner.as_ref());
                if let Some(info) = &track {
                    last_player = Some(info.player);
                }
                if result_tx.send(FetchResult { generation, track }).is_err() {
                    break;
                }
            }
            BridgeCommand::Player(media_command) => match last_player {
                Some(player) => {
                    if let Err(err) = runner.run(&command_script(player, media_command)) {
                        log::debug!(
                            "media: {:?} to {} failed: {err}",
                            media_command,
                            player.app_name()
                        );
                    }
                }
                None => log::debug!("media: no player detected, dropping {media_command:?}"),
            },
            BridgeCommand::Shutdown => break,
        }
    }
}
