//! Wire-format parsing, the player fallback chain, and the worker thread.

use std::io;
use std::thread;
use std::time::{Duration, Instant};

use notchbar::media::{parse_status_response, query_any, FetchResult, MediaBridge, PlayerKind};
use notchbar::schedule::Scheduler;
use notchbar::script::{ScriptError, ScriptRunner};

struct StaticRunner(&'static str);

impl ScriptRunner for StaticRunner {
    fn run(&self, _source: &str) -> Result<String, ScriptError> {
        Ok(self.0.to_string())
    }
}

struct SilentRunner;

impl ScriptRunner for SilentRunner {
    fn run(&self, _source: &str) -> Result<String, ScriptError> {
        Ok(String::new())
    }
}

/// Spotify errors out, Music answers.
struct SpotifyDownRunner;

impl ScriptRunner for SpotifyDownRunner {
    fn run(&self, source: &str) -> Result<String, ScriptError> {
        if source.contains(r#""Spotify""#) {
            Err(ScriptError::Spawn(io::Error::new(
                io::ErrorKind::NotFound,
                "player not installed",
            )))
        } else {
            Ok("Mystery Track|||Some Band|||Some Album|||false".to_string())
        }
    }
}

struct BothPlayingRunner;

impl ScriptRunner for BothPlayingRunner {
    fn run(&self, source: &str) -> Result<String, ScriptError> {
        if source.contains(r#""Spotify""#) {
            Ok("From Spotify|||A|||B|||true".to_string())
        } else {
            Ok("From Music|||A|||B|||true".to_string())
        }
    }
}

// === Response Parsing Tests ===

#[test]
fn empty_response_means_no_media() {
    assert_eq!(parse_status_response("", PlayerKind::Spotify), None);
}

#[test]
fn whitespace_response_means_no_media() {
    assert_eq!(parse_status_response("  \n", PlayerKind::Music), None);
}

#[test]
fn short_response_is_rejected() {
    assert_eq!(
        parse_status_response("Title|||Artist|||Album", PlayerKind::Spotify),
        None
    );
}

#[test]
fn full_response_parses() {
    let response = "Take Five|||Dave Brubeck|||Time Out|||true";
    let track = parse_status_response(response, PlayerKind::Spotify).expect("track");
    assert_eq!(track.title, "Take Five");
    assert_eq!(track.artist, "Dave Brubeck");
    assert_eq!(track.album.as_deref(), Some("Time Out"));
    assert!(track.playing);
    assert_eq!(track.player, PlayerKind::Spotify);
}

#[test]
fn empty_album_field_is_none() {
    let response = ["Take Five", "Dave Brubeck", "", "false"].join("|||");
    let track = parse_status_response(&response, PlayerKind::Music).expect("track");
    assert_eq!(track.album, None);
    assert!(!track.playing);
}

#[test]
fn only_exact_true_counts_as_playing() {
    for flag in ["false", "True", "paused", "1"] {
        let response = ["T", "A", "B", flag].join("|||");
        let track = parse_status_response(&response, PlayerKind::Spotify).expect("track");
        assert!(!track.playing, "{flag:?} must not read as playing");
    }
}

// === Fallback Chain Tests ===

#[test]
fn spotify_wins_when_both_answer() {
    let track = query_any(&BothPlayingRunner).expect("track");
    assert_eq!(track.player, PlayerKind::Spotify);
    assert_eq!(track.title, "From Spotify");
}

#[test]
fn music_answers_when_spotify_errors() {
    let track = query_any(&SpotifyDownRunner).expect("track");
    assert_eq!(track.player, PlayerKind::Music);
    assert_eq!(track.title, "Mystery Track");
}

#[test]
fn silence_from_both_players_is_no_media() {
    assert_eq!(query_any(&SilentRunner), None);
}

// === Worker Tests ===

fn wait_for_result(bridge: &MediaBridge) -> FetchResult {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        if let Some(result) = bridge.try_recv() {
            return result;
        }
        assert!(Instant::now() < deadline, "worker never answered");
        thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn fetch_result_echoes_its_generation() {
    let bridge = MediaBridge::spawn(Box::new(StaticRunner("Song|||Artist|||Album|||true")));
    let mut scheduler = Scheduler::new();

    let generation = scheduler.next_generation();
    assert!(bridge.request_fetch(generation));

    let result = wait_for_result(&bridge);
    assert_eq!(result.generation, generation);
    let track = result.track.expect("track");
    assert_eq!(track.title, "Song");
    assert!(track.playing);
}

#[test]
fn consecutive_fetches_answer_in_order() {
    let bridge = MediaBridge::spawn(Box::new(StaticRunner("Song|||Artist|||Album|||true")));
    let mut scheduler = Scheduler::new();

    let first = scheduler.next_generation();
    let second = scheduler.next_generation();
    bridge.request_fetch(first);
    bridge.request_fetch(second);

    assert_eq!(wait_for_result(&bridge).generation, first);
    assert_eq!(wait_for_result(&bridge).generation, second);
}

#[test]
fn worker_reports_no_media_as_none() {
    let bridge = MediaBridge::spawn(Box::new(SilentRunner));
    let mut scheduler = Scheduler::new();

    bridge.request_fetch(scheduler.next_generation());
    assert_eq!(wait_for_result(&bridge).track, None);
}
