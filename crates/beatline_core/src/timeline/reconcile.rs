//! Duration reconciliation.
//!
//! Decides, beat by beat, the final beat length and how much generated
//! silence the beat needs on the audio track.
//!
//! # Rules
//!
//! - **Voice-over group**: beats share the first beat's movie. A `remaining`
//!   budget starts at the movie duration; each beat takes its own audio
//!   length, or stretches up to the next beat's explicit `startAt`. The last
//!   beat absorbs whatever is left.
//! - **Spill-over group**: the first beat's clip covers the whole group.
//!   Targets are declared durations, with the rest of the clip split evenly
//!   among undeclared beats (at least 1s each). When targets overshoot the
//!   clip by more than [`SPILL_TOLERANCE`], front beats keep their targets
//!   and later beats fall back to silence. When the clip is longer, the last
//!   beat absorbs the surplus.
//! - **Movie only**: the beat lasts as long as the movie, all of it silence.
//! - **Own audio**: audio plus padding (per-beat override, 0 for the last
//!   beat, closing padding for the second-to-last, standard padding
//!   otherwise), stretched to the movie or declared duration if longer.
//! - **Nothing**: declared duration, or [`DEFAULT_BEAT_DURATION`], as silence.
//!
//! `start_at` is the running sum of durations, computed last.

use super::classify::classify;
use super::error::{TimelineError, TimelineResult};
use super::grouping::{Group, GroupKind};
use crate::models::{AudioParams, Beat, MediaProbe, ReconciledBeat};

/// Overshoot allowed before a spill-over group is considered truncated.
pub const SPILL_TOLERANCE: f64 = 0.01;

/// Length of a beat with no media and no declared duration.
pub const DEFAULT_BEAT_DURATION: f64 = 1.0;

/// Minimum share of each undeclared beat in a spill-over group.
pub const MIN_SPILL_BEAT_DURATION: f64 = 1.0;

/// Duration and silence decided for one beat.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Resolved {
    duration: f64,
    silence: f64,
}

impl Resolved {
    fn silent(duration: f64) -> Self {
        Self {
            duration,
            silence: duration,
        }
    }
}

/// Reconcile every beat's duration and silence.
///
/// `groups` must be the contiguous partition produced by
/// [`resolve_groups`](super::resolve_groups). Returns one entry per beat in
/// script order, or the first invariant violation.
pub fn reconcile(
    beats: &[Beat],
    probes: &[MediaProbe],
    groups: &[Group],
    params: &AudioParams,
) -> TimelineResult<Vec<ReconciledBeat>> {
    if beats.len() != probes.len() {
        return Err(TimelineError::invalid_beat(
            beats.len().min(probes.len()),
            format!("{} beats but {} probes", beats.len(), probes.len()),
        ));
    }

    let mut resolved: Vec<Resolved> = Vec::with_capacity(beats.len());

    for group in groups {
        if group.first() != resolved.len() || group.range.end > beats.len() {
            return Err(TimelineError::invalid_beat(
                resolved.len(),
                format!("group {:?} does not continue the timeline", group.range),
            ));
        }

        match group.kind {
            GroupKind::VoiceOver => resolved.extend(resolve_voice_over(beats, probes, group)?),
            GroupKind::SpillOver => resolved.extend(resolve_spill_over(beats, probes, group)),
            GroupKind::Single => resolved.push(resolve_single(beats, probes, group.first(), params)),
        }
    }

    if resolved.len() != beats.len() {
        return Err(TimelineError::invalid_beat(
            resolved.len(),
            "beat is not covered by any group",
        ));
    }

    let mut start_at = 0.0;
    let table = resolved
        .into_iter()
        .zip(probes)
        .map(|(r, probe)| {
            let beat = ReconciledBeat {
                duration: r.duration,
                audio_duration: probe.audio_duration,
                movie_duration: probe.movie_duration,
                silence_duration: r.silence,
                has_movie_audio: probe.has_movie_audio,
                start_at,
            };
            start_at += r.duration;
            beat
        })
        .collect();

    Ok(table)
}

/// Beats riding one movie's timeline.
fn resolve_voice_over(
    beats: &[Beat],
    probes: &[MediaProbe],
    group: &Group,
) -> TimelineResult<Vec<Resolved>> {
    let movie = probes[group.first()].movie_duration;
    let mut remaining = movie;
    let mut out = Vec::with_capacity(group.len());

    tracing::debug!(
        "Voice-over group {:?} on {:.3}s movie",
        group.range,
        movie
    );

    for index in group.range.clone() {
        let audio = probes[index].audio_duration;
        if audio > remaining {
            return Err(TimelineError::DurationOverflow {
                beat: index,
                audio,
                remaining,
            });
        }

        if index == group.last() {
            out.push(Resolved {
                duration: remaining,
                silence: remaining - audio,
            });
            break;
        }

        match classify(&beats[index + 1]).explicit_start() {
            Some(next_start) => {
                let rest = movie - next_start;
                let duration = remaining - rest;
                if duration < 0.0 {
                    return Err(TimelineError::InvalidStartAt {
                        beat: index,
                        duration,
                    });
                }
                let silence = duration - audio;
                if silence < 0.0 {
                    return Err(TimelineError::DurationOverwrap {
                        beat: index,
                        duration,
                        audio,
                    });
                }
                out.push(Resolved { duration, silence });
                remaining = rest;
            }
            None => {
                out.push(Resolved {
                    duration: audio,
                    silence: 0.0,
                });
                remaining -= audio;
            }
        }
    }

    Ok(out)
}

/// Silent beats sharing the group's first audio clip.
fn resolve_spill_over(beats: &[Beat], probes: &[MediaProbe], group: &Group) -> Vec<Resolved> {
    let audio = probes[group.first()].audio_duration;
    let mut targets = spill_targets(&beats[group.range.clone()], audio);
    let mut silences = vec![0.0; targets.len()];
    let total: f64 = targets.iter().sum();

    if total > audio + SPILL_TOLERANCE {
        tracing::warn!(
            "Beats {:?} need {:.3}s but their audio is {:.3}s; later beats fall back to silence",
            group.range,
            total,
            audio
        );
        let mut budget = audio;
        for (target, silence) in targets.iter().zip(silences.iter_mut()) {
            if budget >= *target {
                budget -= target;
            } else {
                *silence = target - budget;
                budget = 0.0;
            }
        }
    } else if audio > total {
        if let Some(last) = targets.last_mut() {
            *last += audio - total;
        }
    }

    targets
        .into_iter()
        .zip(silences)
        .map(|(duration, silence)| Resolved { duration, silence })
        .collect()
}

/// Per-beat targets of a spill-over group.
fn spill_targets(beats: &[Beat], audio: f64) -> Vec<f64> {
    let declared: f64 = beats.iter().filter_map(|b| b.duration).sum();
    let undeclared = beats.iter().filter(|b| b.duration.is_none()).count();
    let rest = (audio - declared).max(MIN_SPILL_BEAT_DURATION * undeclared as f64);
    let share = rest / undeclared.max(1) as f64;

    beats.iter().map(|b| b.duration.unwrap_or(share)).collect()
}

/// A beat timed on its own.
fn resolve_single(
    beats: &[Beat],
    probes: &[MediaProbe],
    index: usize,
    params: &AudioParams,
) -> Resolved {
    let beat = &beats[index];
    let probe = probes[index];

    if probe.audio_duration > 0.0 {
        let padding = padding_for(beat, index, beats.len(), params);
        let total_padding = if probe.movie_duration > 0.0 {
            padding + (probe.movie_duration - probe.audio_duration).max(0.0)
        } else if let Some(declared) = beat.duration {
            padding + (declared - probe.audio_duration).max(0.0)
        } else {
            padding
        };

        return Resolved {
            duration: round2(probe.audio_duration + total_padding),
            silence: total_padding.max(0.0),
        };
    }

    if probe.movie_duration > 0.0 {
        return Resolved::silent(probe.movie_duration);
    }

    Resolved::silent(beat.duration.unwrap_or(DEFAULT_BEAT_DURATION))
}

/// Padding after a beat with its own audio.
fn padding_for(beat: &Beat, index: usize, beat_count: usize, params: &AudioParams) -> f64 {
    if let Some(padding) = beat.padding_override() {
        return padding;
    }
    if index + 1 == beat_count {
        0.0
    } else if index + 2 == beat_count {
        params.closing_padding
    } else {
        params.padding
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaSource;
    use crate::timeline::resolve_groups;

    const EPS: f64 = 1e-6;

    fn params(padding: f64, closing_padding: f64) -> AudioParams {
        AudioParams {
            padding,
            closing_padding,
        }
    }

    fn audio_beat() -> Beat {
        Beat::new().with_audio(MediaSource::path("narration.mp3"))
    }

    fn movie_beat() -> Beat {
        Beat::new().with_movie(MediaSource::path("movie.mp4"))
    }

    fn run(beats: &[Beat], probes: &[MediaProbe], p: AudioParams) -> TimelineResult<Vec<ReconciledBeat>> {
        let groups = resolve_groups(beats, probes);
        reconcile(beats, probes, &groups, &p)
    }

    fn durations(table: &[ReconciledBeat]) -> Vec<f64> {
        table.iter().map(|b| b.duration).collect()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPS,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    fn assert_invariants(table: &[ReconciledBeat]) {
        let mut start = 0.0;
        for beat in table {
            assert!(beat.duration >= 0.0, "negative duration: {:?}", beat);
            assert!(beat.silence_duration >= 0.0, "negative silence: {:?}", beat);
            assert_close(beat.start_at, start);
            start += beat.duration;
        }
    }

    #[test]
    fn padding_scenario_matches_start_offsets() {
        let beats = vec![audio_beat(), audio_beat(), audio_beat()];
        let probes = vec![
            MediaProbe::audio(5.0),
            MediaProbe::audio(3.0),
            MediaProbe::audio(2.0),
        ];

        let table = run(&beats, &probes, params(0.5, 1.0)).unwrap();
        assert_eq!(durations(&table), vec![5.5, 4.0, 2.0]);
        assert_eq!(
            table.iter().map(|b| b.start_at).collect::<Vec<_>>(),
            vec![0.0, 5.5, 9.5]
        );
        assert_close(table[0].silence_duration, 0.5);
        assert_close(table[1].silence_duration, 1.0);
        assert_eq!(table[2].silence_duration, 0.0);
    }

    #[test]
    fn padding_override_wins() {
        let beats = vec![audio_beat().with_padding(2.0), audio_beat()];
        let probes = vec![MediaProbe::audio(1.0), MediaProbe::audio(1.0)];

        let table = run(&beats, &probes, params(0.3, 0.8)).unwrap();
        assert_eq!(durations(&table), vec![3.0, 1.0]);
    }

    #[test]
    fn audio_is_stretched_to_declared_duration() {
        let beats = vec![audio_beat().with_duration(6.0)];
        let probes = vec![MediaProbe::audio(4.0)];

        let table = run(&beats, &probes, params(0.3, 0.8)).unwrap();
        assert_eq!(table[0].duration, 6.0);
        assert_close(table[0].silence_duration, 2.0);
    }

    #[test]
    fn audio_is_stretched_to_movie() {
        let beats = vec![
            movie_beat().with_audio(MediaSource::path("a.mp3")),
            audio_beat(),
            audio_beat(),
        ];
        let probes = vec![
            MediaProbe {
                movie_duration: 7.0,
                audio_duration: 3.0,
                has_movie_audio: true,
            },
            MediaProbe::audio(1.0),
            MediaProbe::audio(1.0),
        ];

        let table = run(&beats, &probes, params(0.3, 0.8)).unwrap();
        assert_eq!(table[0].duration, 7.3);
        assert_close(table[0].silence_duration, 4.3);
        assert!(table[0].has_movie_audio);
    }

    #[test]
    fn audio_longer_than_movie_keeps_plain_padding() {
        let beats = vec![movie_beat().with_audio(MediaSource::path("a.mp3")), audio_beat()];
        let probes = vec![
            MediaProbe {
                movie_duration: 2.0,
                audio_duration: 5.0,
                has_movie_audio: false,
            },
            MediaProbe::audio(1.0),
        ];

        let table = run(&beats, &probes, params(0.3, 0.8)).unwrap();
        assert_eq!(table[0].duration, 5.8);
    }

    #[test]
    fn duration_is_rounded_to_centiseconds() {
        let beats = vec![audio_beat(), audio_beat()];
        let probes = vec![MediaProbe::audio(1.23456), MediaProbe::audio(1.0)];

        let table = run(&beats, &probes, params(0.3, 0.8)).unwrap();
        assert_eq!(table[0].duration, 2.03);
    }

    #[test]
    fn movie_only_beat_is_all_silence() {
        let beats = vec![movie_beat()];
        let probes = vec![MediaProbe::movie(12.5, true)];

        let table = run(&beats, &probes, params(0.3, 0.8)).unwrap();
        assert_eq!(table[0].duration, 12.5);
        assert_eq!(table[0].silence_duration, 12.5);
        assert_eq!(table[0].movie_duration, 12.5);
    }

    #[test]
    fn empty_beat_defaults_to_one_second() {
        let beats = vec![Beat::new()];
        let probes = vec![MediaProbe::empty()];

        let table = run(&beats, &probes, params(0.3, 0.8)).unwrap();
        assert_eq!(table[0].duration, 1.0);
        assert_eq!(table[0].silence_duration, 1.0);
    }

    #[test]
    fn empty_beat_uses_declared_duration() {
        let beats = vec![Beat::new().with_duration(2.5)];
        let probes = vec![MediaProbe::empty()];

        let table = run(&beats, &probes, params(0.3, 0.8)).unwrap();
        assert_eq!(table[0].duration, 2.5);
        assert_eq!(table[0].silence_duration, 2.5);
    }

    #[test]
    fn voice_over_last_beat_absorbs_remaining() {
        let beats = vec![
            movie_beat(),
            Beat::new().with_voice_over(None).with_audio(MediaSource::path("v1.mp3")),
            Beat::new().with_voice_over(None).with_audio(MediaSource::path("v2.mp3")),
        ];
        let probes = vec![
            MediaProbe::movie(10.0, true),
            MediaProbe::audio(4.0),
            MediaProbe::audio(5.0),
        ];

        let table = run(&beats, &probes, params(0.3, 0.8)).unwrap();
        assert_eq!(durations(&table), vec![0.0, 4.0, 6.0]);
        assert_close(table[2].silence_duration, 1.0);
        assert_close(durations(&table).iter().sum::<f64>(), 10.0);
        assert_invariants(&table);
    }

    #[test]
    fn voice_over_two_beat_scenario() {
        // A movie beat carrying its own 4s narration, then one voice-over.
        let beats = vec![
            movie_beat().with_audio(MediaSource::path("v0.mp3")),
            Beat::new().with_voice_over(None).with_audio(MediaSource::path("v1.mp3")),
        ];
        let probes = vec![
            MediaProbe {
                movie_duration: 10.0,
                audio_duration: 4.0,
                has_movie_audio: true,
            },
            MediaProbe::audio(3.0),
        ];

        let table = run(&beats, &probes, params(0.3, 0.8)).unwrap();
        assert_eq!(durations(&table), vec![4.0, 6.0]);
        assert_eq!(table[0].silence_duration, 0.0);
        assert_close(table[1].silence_duration, 3.0);
    }

    #[test]
    fn voice_over_explicit_start_stretches_previous_beat() {
        let beats = vec![
            movie_beat(),
            Beat::new().with_voice_over(Some(2.0)).with_audio(MediaSource::path("v1.mp3")),
            Beat::new().with_voice_over(Some(7.0)).with_audio(MediaSource::path("v2.mp3")),
        ];
        let probes = vec![
            MediaProbe::movie(10.0, false),
            MediaProbe::audio(3.0),
            MediaProbe::audio(2.0),
        ];

        let table = run(&beats, &probes, params(0.3, 0.8)).unwrap();
        assert_eq!(durations(&table), vec![2.0, 5.0, 3.0]);
        assert_close(table[0].silence_duration, 2.0);
        assert_close(table[1].silence_duration, 2.0);
        assert_close(table[2].silence_duration, 1.0);
        assert_close(table[2].start_at, 7.0);
        assert_invariants(&table);
    }

    #[test]
    fn voice_over_overflow_is_fatal() {
        let beats = vec![
            movie_beat(),
            Beat::new().with_voice_over(None).with_audio(MediaSource::path("v1.mp3")),
        ];
        let probes = vec![MediaProbe::movie(5.0, true), MediaProbe::audio(6.0)];

        let err = run(&beats, &probes, params(0.3, 0.8)).unwrap_err();
        assert!(matches!(
            err,
            TimelineError::DurationOverflow { beat: 1, .. }
        ));
    }

    #[test]
    fn voice_over_start_before_current_position_is_invalid() {
        let beats = vec![
            movie_beat(),
            Beat::new().with_voice_over(None).with_audio(MediaSource::path("v1.mp3")),
            Beat::new().with_voice_over(Some(2.0)).with_audio(MediaSource::path("v2.mp3")),
        ];
        // Beat 1 starts at 0 with 4s of audio; remaining is 10 - 0 = 10.
        // Beat 2 anchored at 2.0 leaves beat 1 with 10 - 8 = 2s < 4s audio.
        let probes = vec![
            MediaProbe::movie(10.0, true),
            MediaProbe::audio(4.0),
            MediaProbe::audio(1.0),
        ];

        let err = run(&beats, &probes, params(0.3, 0.8)).unwrap_err();
        assert!(matches!(
            err,
            TimelineError::DurationOverwrap { beat: 1, .. }
        ));
    }

    #[test]
    fn voice_over_start_behind_consumed_time_is_invalid_start() {
        let beats = vec![
            movie_beat().with_audio(MediaSource::path("v0.mp3")),
            Beat::new().with_voice_over(None).with_audio(MediaSource::path("v1.mp3")),
            Beat::new().with_voice_over(Some(1.0)),
        ];
        // Beats 0 and 1 consume 5s; beat 2 claims to start at 1s.
        let probes = vec![
            MediaProbe {
                movie_duration: 10.0,
                audio_duration: 2.0,
                has_movie_audio: true,
            },
            MediaProbe::audio(3.0),
            MediaProbe::empty(),
        ];

        let err = run(&beats, &probes, params(0.3, 0.8)).unwrap_err();
        assert!(matches!(err, TimelineError::InvalidStartAt { beat: 1, .. }));
    }

    #[test]
    fn spill_over_splits_audio_evenly() {
        let beats = vec![audio_beat(), Beat::new()];
        let probes = vec![MediaProbe::audio(8.0), MediaProbe::empty()];

        let table = run(&beats, &probes, params(0.3, 0.8)).unwrap();
        assert_eq!(durations(&table), vec![4.0, 4.0]);
        assert_eq!(table[0].silence_duration, 0.0);
        assert_eq!(table[1].silence_duration, 0.0);
        assert_close(durations(&table).iter().sum::<f64>(), 8.0);
    }

    #[test]
    fn spill_over_surplus_goes_to_last_beat() {
        let beats = vec![
            audio_beat().with_duration(2.0),
            Beat::new().with_duration(3.0),
            audio_beat(),
        ];
        let probes = vec![
            MediaProbe::audio(7.0),
            MediaProbe::empty(),
            MediaProbe::audio(1.0),
        ];

        let table = run(&beats, &probes, params(0.3, 0.8)).unwrap();
        assert_eq!(table[0].duration, 2.0);
        assert_eq!(table[1].duration, 5.0);
        assert_eq!(table[1].silence_duration, 0.0);
    }

    #[test]
    fn spill_over_shortfall_falls_on_later_beats() {
        let beats = vec![
            audio_beat(),
            Beat::new().with_duration(2.0),
            Beat::new().with_duration(2.0),
        ];
        // Undeclared share is floored at 1s: targets are [1, 2, 2] = 5s > 2.5s.
        let probes = vec![
            MediaProbe::audio(2.5),
            MediaProbe::empty(),
            MediaProbe::empty(),
        ];

        let table = run(&beats, &probes, params(0.3, 0.8)).unwrap();
        assert_eq!(durations(&table), vec![1.0, 2.0, 2.0]);
        assert_eq!(table[0].silence_duration, 0.0);
        assert_close(table[1].silence_duration, 0.5);
        assert_close(table[2].silence_duration, 2.0);
        assert_invariants(&table);
    }

    #[test]
    fn spill_over_within_tolerance_is_untouched() {
        let beats = vec![audio_beat().with_duration(2.5), Beat::new().with_duration(2.5)];
        let probes = vec![MediaProbe::audio(4.995), MediaProbe::empty()];

        let table = run(&beats, &probes, params(0.3, 0.8)).unwrap();
        assert_eq!(durations(&table), vec![2.5, 2.5]);
        assert_eq!(table[0].silence_duration, 0.0);
        assert_eq!(table[1].silence_duration, 0.0);
    }

    #[test]
    fn mixed_script_keeps_invariants_and_is_idempotent() {
        let beats = vec![
            Beat::new(),
            audio_beat(),
            Beat::new().with_duration(1.5),
            movie_beat(),
            Beat::new().with_voice_over(None).with_audio(MediaSource::path("v.mp3")),
            Beat::new().with_voice_over(Some(8.0)).with_audio(MediaSource::path("w.mp3")),
            movie_beat(),
            audio_beat().with_padding(0.0),
            audio_beat(),
        ];
        let probes = vec![
            MediaProbe::empty(),
            MediaProbe::audio(3.0),
            MediaProbe::empty(),
            MediaProbe::movie(12.0, true),
            MediaProbe::audio(2.0),
            MediaProbe::audio(4.0),
            MediaProbe::movie(3.0, false),
            MediaProbe::audio(2.2),
            MediaProbe::audio(1.1),
        ];

        let first = run(&beats, &probes, params(0.3, 0.8)).unwrap();
        let second = run(&beats, &probes, params(0.3, 0.8)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), beats.len());
        assert_invariants(&first);

        // Voice-over group 3..6 spans the whole 12s movie.
        let voice_over: f64 = first[3..6].iter().map(|b| b.duration).sum();
        assert_close(voice_over, 12.0);
    }

    #[test]
    fn rejects_groups_that_skip_beats() {
        let beats = vec![Beat::new(), Beat::new()];
        let probes = vec![MediaProbe::empty(), MediaProbe::empty()];
        let groups = vec![Group {
            kind: GroupKind::Single,
            range: 1..2,
        }];

        let result = reconcile(&beats, &probes, &groups, &params(0.3, 0.8));
        assert!(matches!(result, Err(TimelineError::InvalidBeat { beat: 0, .. })));
    }
}
