// Integration tests for the recording store and transcript files:
// filesystem listing, filename-suffix source inference, and the
// header-stripping round trip.

use anyhow::Result;
use meetrec::recording::store::{read_transcript_body, transcript_path_for};
use meetrec::transcribe::write_transcript;
use meetrec::{RecordingSource, RecordingStore};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_wav(dir: &Path, filename: &str, num_samples: usize) -> Result<PathBuf> {
    let path = dir.join(filename);
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec)?;
    for i in 0..num_samples {
        writer.write_sample((i % 128) as i16)?;
    }
    writer.finalize()?;
    Ok(path)
}

#[test]
fn test_transcript_path_swaps_extension() {
    let audio = PathBuf::from("/data/meeting_20250101_120000_system.wav");
    assert_eq!(
        transcript_path_for(&audio),
        PathBuf::from("/data/meeting_20250101_120000_system_transcript.txt")
    );
}

#[test]
fn test_transcript_round_trip() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let audio = temp_dir.path().join("meeting_20250101_120000.wav");
    let transcript = transcript_path_for(&audio);

    let text = "Hello from the meeting.\nSecond line, with ünïcode.";
    write_transcript(&transcript, &audio, text)?;

    // Header present in the raw file
    let raw = fs::read_to_string(&transcript)?;
    assert!(raw.starts_with("Transcript for: meeting_20250101_120000.wav\n"));
    assert!(raw.contains(&"-".repeat(50)));

    // Body comes back exactly, header stripped
    assert_eq!(read_transcript_body(&transcript)?, text);

    Ok(())
}

#[test]
fn test_transcript_keeps_replacement_characters() -> Result<()> {
    // Lossy segment decoding upstream can leave U+FFFD in the text;
    // it must survive the write/read round trip untouched
    let temp_dir = TempDir::new()?;
    let audio = temp_dir.path().join("meeting_20250101_120000.wav");
    let transcript = transcript_path_for(&audio);

    let text = "caf\u{FFFD} discussion notes";
    write_transcript(&transcript, &audio, text)?;
    assert_eq!(read_transcript_body(&transcript)?, text);

    Ok(())
}

#[test]
fn test_transcript_body_without_header_is_whole_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("notes.txt");
    fs::write(&path, "plain text, no header")?;

    assert_eq!(read_transcript_body(&path)?, "plain text, no header");

    Ok(())
}

#[test]
fn test_missing_transcript_is_an_error() {
    let result = read_transcript_body(Path::new("/nonexistent/transcript.txt"));
    assert!(result.is_err());
}

#[test]
fn test_store_lists_newest_first_with_metadata() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let dir = temp_dir.path();

    write_wav(dir, "meeting_20250101_090000.wav", 44100)?;
    write_wav(dir, "meeting_20250102_090000_system.wav", 22050)?;
    let app_audio = write_wav(dir, "meeting_20250103_090000_app.wav", 88200)?;
    // Non-recordings are ignored
    fs::write(dir.join("notes.txt"), "not audio")?;

    // One recording has a transcript sibling
    write_transcript(&transcript_path_for(&app_audio), &app_audio, "text")?;

    let store = RecordingStore::new(dir);
    let recordings = store.list()?;
    assert_eq!(recordings.len(), 3);

    // Newest (lexicographically greatest timestamp) first
    assert_eq!(recordings[0].filename, "meeting_20250103_090000_app.wav");
    assert_eq!(recordings[1].filename, "meeting_20250102_090000_system.wav");
    assert_eq!(recordings[2].filename, "meeting_20250101_090000.wav");

    assert_eq!(recordings[0].source, RecordingSource::AppAudio);
    assert_eq!(recordings[1].source, RecordingSource::SystemAudio);
    assert_eq!(recordings[2].source, RecordingSource::Microphone);

    assert!((recordings[0].duration_secs - 2.0).abs() < 1e-6);
    assert!((recordings[1].duration_secs - 0.5).abs() < 1e-6);
    assert!((recordings[2].duration_secs - 1.0).abs() < 1e-6);

    assert!(recordings[0].has_transcript);
    assert!(recordings[0].transcript_path.is_some());
    assert!(!recordings[1].has_transcript);
    assert!(recordings[1].transcript_path.is_none());

    Ok(())
}

#[test]
fn test_store_with_missing_directory_is_empty() -> Result<()> {
    let store = RecordingStore::new("/nonexistent/recordings");
    assert!(store.list()?.is_empty());
    Ok(())
}

#[test]
fn test_unreadable_wav_gets_zero_duration() -> Result<()> {
    let temp_dir = TempDir::new()?;
    fs::write(temp_dir.path().join("meeting_20250101_090000.wav"), b"junk")?;

    let store = RecordingStore::new(temp_dir.path());
    let recordings = store.list()?;
    assert_eq!(recordings.len(), 1);
    assert_eq!(recordings[0].duration_secs, 0.0);

    Ok(())
}
