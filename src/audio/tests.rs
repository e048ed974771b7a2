use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rodio::buffer::SamplesBuffer;

use crate::equalizer::GainTarget;
use crate::error::{PlaybackError, PlayerError};

use super::testing::{DEFAULT_DURATION, LOAD_TIMEOUT, fake_chain};
use super::filter::{BandGains, EqualizerSource};
use super::{AudioFormat, ChainEvent};

fn sine(freq: f32, sample_rate: u32, len: usize) -> Vec<f32> {
    (0..len)
        .map(|n| (2.0 * std::f32::consts::PI * freq * n as f32 / sample_rate as f32).sin() * 0.1)
        .collect()
}

fn rms(samples: &[f32]) -> f32 {
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

#[test]
fn recognizes_formats_by_trailing_extension() {
    assert_eq!(AudioFormat::from_locator("a/b/Song.MP3"), Some(AudioFormat::Mp3));
    assert_eq!(AudioFormat::from_locator("x.flac"), Some(AudioFormat::Flac));
    assert_eq!(AudioFormat::from_locator("clip.m4a"), Some(AudioFormat::M4a));
    assert_eq!(AudioFormat::from_locator("notes.txt"), None);
    assert_eq!(AudioFormat::from_locator("live.v2/track"), None);
    assert_eq!(AudioFormat::from_locator("noext"), None);
}

#[test]
fn flat_equalizer_passes_samples_through() {
    let input = sine(440.0, 44_100, 2_048);
    let gains = Arc::new(BandGains::new(1.0));
    let source = SamplesBuffer::new(1, 44_100, input.clone());
    let out: Vec<f32> = EqualizerSource::new(source, gains).collect();
    assert_eq!(out, input);
}

#[test]
fn boosted_band_raises_level_at_its_center() {
    let input = sine(1_000.0, 44_100, 44_100);
    let gains = Arc::new(BandGains::new(1.0));
    gains.set(5, 12.0);
    let source = SamplesBuffer::new(1, 44_100, input.clone());
    let out: Vec<f32> = EqualizerSource::new(source, gains).collect();

    // Skip the filter's settling time.
    let ratio = rms(&out[4_410..]) / rms(&input[4_410..]);
    assert!(ratio > 3.0, "ratio was {ratio}");
}

#[test]
fn gain_changes_reach_a_running_cascade() {
    let input = sine(1_000.0, 44_100, 44_100);
    let gains = Arc::new(BandGains::new(1.0));
    let source = SamplesBuffer::new(1, 44_100, input.clone());
    let mut eq = EqualizerSource::new(source, Arc::clone(&gains));

    let head: Vec<f32> = eq.by_ref().take(4_410).collect();
    assert_eq!(head, input[..4_410]);

    gains.set(5, -12.0);
    let tail: Vec<f32> = eq.collect();
    let ratio = rms(&tail[4_410..]) / rms(&input[8_820..]);
    assert!(ratio < 0.5, "ratio was {ratio}");
}

#[test]
fn bands_at_or_above_nyquist_are_bypassed() {
    let input = sine(440.0, 22_050, 2_048);
    let gains = Arc::new(BandGains::new(1.0));
    gains.set(9, 12.0);
    let source = SamplesBuffer::new(1, 22_050, input.clone());
    let out: Vec<f32> = EqualizerSource::new(source, gains).collect();
    assert_eq!(out, input);
}

#[test]
fn out_of_range_band_writes_are_ignored() {
    let gains = BandGains::new(1.0);
    let generation = gains.generation();
    gains.set(10, 6.0);
    assert_eq!(gains.generation(), generation);
    assert_eq!(gains.snapshot(), [0.0; 10]);
}

#[test]
fn unsupported_locator_leaves_current_source_bound() {
    let (mut chain, _decoder, output) = fake_chain();
    let token = chain.load("one.mp3").unwrap();
    chain.wait_for_load(LOAD_TIMEOUT);
    chain.play().unwrap();

    let err = chain.load("cover.png").unwrap_err();
    assert!(matches!(err, PlayerError::UnsupportedFormat { .. }));
    assert_eq!(chain.bound_token(), Some(token));
    assert!(output.is_playing());
    assert_eq!(output.disconnects(), 0);
}

#[test]
fn route_is_built_once_per_source() {
    let (mut chain, _decoder, output) = fake_chain();
    let token = chain.load("one.mp3").unwrap();
    let events = chain.wait_for_load(LOAD_TIMEOUT);
    assert!(matches!(
        events.as_slice(),
        [ChainEvent::Loaded { token: t, duration: Some(d) }] if *t == token && *d == DEFAULT_DURATION
    ));
    assert!(output.connects().is_empty());

    chain.connect_for_output().unwrap();
    chain.connect_for_output().unwrap();
    chain.play().unwrap();
    chain.pause();
    chain.play().unwrap();

    assert_eq!(output.connects(), vec!["one.mp3".to_string()]);
    assert_eq!(chain.connected_for(), Some(token));
}

#[test]
fn binding_a_new_source_tears_down_the_old_route() {
    let (mut chain, _decoder, output) = fake_chain();
    chain.load("one.mp3").unwrap();
    chain.play().unwrap();
    chain.wait_for_load(LOAD_TIMEOUT);
    assert!(output.is_playing());

    let second = chain.load("two.ogg").unwrap();
    assert_eq!(output.disconnects(), 1);
    assert!(output.active().is_none());
    assert_eq!(chain.connected_for(), None);

    chain.wait_for_load(LOAD_TIMEOUT);
    // Output was requested earlier, so the new source is routed on bind.
    assert_eq!(output.connects(), vec!["one.mp3".to_string(), "two.ogg".to_string()]);
    assert_eq!(chain.connected_for(), Some(second));
    assert!(!output.is_playing());
}

#[test]
fn superseded_load_never_binds() {
    let (mut chain, decoder, output) = fake_chain();
    let release_first = decoder.gate("slow.mp3");
    chain.load("slow.mp3").unwrap();
    let second = chain.load("fast.mp3").unwrap();
    chain.wait_for_load(LOAD_TIMEOUT);
    assert_eq!(chain.bound_token(), Some(second));

    release_first.send(()).unwrap();
    thread::sleep(Duration::from_millis(100));
    let events = chain.poll();
    assert!(events.iter().all(|e| !matches!(e, ChainEvent::Loaded { .. })));
    assert_eq!(chain.bound_locator(), Some("fast.mp3"));
    assert!(!output.connects().contains(&"slow.mp3".to_string()));
}

#[test]
fn play_during_load_starts_once_bound() {
    let (mut chain, decoder, output) = fake_chain();
    let release = decoder.gate("one.mp3");
    chain.load("one.mp3").unwrap();
    chain.play().unwrap();
    assert!(chain.is_loading());
    assert!(output.connects().is_empty());

    release.send(()).unwrap();
    chain.wait_for_load(LOAD_TIMEOUT);
    assert!(output.is_playing());
}

#[test]
fn pause_during_load_cancels_the_deferred_start() {
    let (mut chain, decoder, output) = fake_chain();
    let release = decoder.gate("one.mp3");
    chain.load("one.mp3").unwrap();
    chain.play().unwrap();
    chain.pause();

    release.send(()).unwrap();
    chain.wait_for_load(LOAD_TIMEOUT);
    assert!(!output.is_playing());
}

#[test]
fn deferred_start_failure_is_reported() {
    let (mut chain, _decoder, output) = fake_chain();
    output.fail_play(true);
    let token = chain.load("one.mp3").unwrap();
    chain.play().unwrap();

    let events = chain.wait_for_load(LOAD_TIMEOUT);
    assert!(events.iter().any(|e| matches!(
        e,
        ChainEvent::PlaybackFailed { token: t, error: PlaybackError::Output(_) } if *t == token
    )));
    assert!(!output.is_playing());
}

#[test]
fn failed_load_is_reported_and_leaves_nothing_bound() {
    let (mut chain, decoder, _output) = fake_chain();
    decoder.fail("broken.wav");
    let token = chain.load("broken.wav").unwrap();
    let events = chain.wait_for_load(LOAD_TIMEOUT);
    assert!(matches!(
        events.as_slice(),
        [ChainEvent::LoadFailed { token: t, .. }] if *t == token
    ));
    assert_eq!(chain.bound_token(), None);
    assert!(matches!(chain.play(), Err(PlaybackError::NoSource)));
}

#[test]
fn seek_clamps_to_duration_and_needs_a_known_duration() {
    let (mut chain, decoder, output) = fake_chain();
    let release = decoder.gate("one.mp3");
    chain.load("one.mp3").unwrap();
    assert!(matches!(
        chain.seek(Duration::from_secs(1)),
        Err(PlaybackError::DurationUnknown)
    ));
    release.send(()).unwrap();
    chain.wait_for_load(LOAD_TIMEOUT);

    assert_eq!(chain.seek(Duration::from_secs(900)).unwrap(), DEFAULT_DURATION);
    assert_eq!(output.active().unwrap().position, DEFAULT_DURATION);
    assert_eq!(chain.seek(Duration::from_secs(30)).unwrap(), Duration::from_secs(30));

    decoder.set_duration("live.ogg", None);
    chain.load("live.ogg").unwrap();
    chain.wait_for_load(LOAD_TIMEOUT);
    assert!(matches!(
        chain.seek(Duration::from_secs(1)),
        Err(PlaybackError::DurationUnknown)
    ));
}

#[test]
fn end_of_source_is_reported_once() {
    let (mut chain, _decoder, output) = fake_chain();
    let token = chain.load("one.mp3").unwrap();
    chain.wait_for_load(LOAD_TIMEOUT);
    chain.play().unwrap();

    output.advance(Duration::from_secs(12));
    let events = chain.poll();
    assert!(matches!(
        events.as_slice(),
        [ChainEvent::TimeUpdate { position, .. }] if *position == Duration::from_secs(12)
    ));

    output.finish();
    let events = chain.poll();
    assert!(matches!(events.as_slice(), [ChainEvent::Ended { token: t }] if *t == token));
    assert!(chain.has_ended());
    assert!(chain.poll().is_empty());
}

#[test]
fn gains_and_volume_reach_the_route() {
    let (mut chain, _decoder, output) = fake_chain();
    chain.set_gain(3, -4.5);
    assert_eq!(chain.gains().gain(3), -4.5);

    chain.set_volume(0.4);
    chain.load("one.mp3").unwrap();
    chain.play().unwrap();
    chain.wait_for_load(LOAD_TIMEOUT);
    assert_eq!(output.active().unwrap().volume, 0.4);

    chain.set_volume(3.0);
    assert_eq!(output.active().unwrap().volume, 1.0);
}

#[test]
fn stop_disconnects_and_forgets_the_source() {
    let (mut chain, _decoder, output) = fake_chain();
    chain.load("one.mp3").unwrap();
    chain.play().unwrap();
    chain.wait_for_load(LOAD_TIMEOUT);

    chain.stop();
    assert_eq!(output.disconnects(), 1);
    assert_eq!(chain.bound_token(), None);
    assert_eq!(chain.position(), Duration::ZERO);
}
