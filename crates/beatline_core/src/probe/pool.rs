//! Concurrent probing of every beat on a bounded worker pool.

use rayon::prelude::*;

use super::types::{DurationProbe, ProbeResult};
use crate::models::{Beat, MediaProbe};
use crate::timeline::{TimelineError, TimelineResult};

/// Resolve the worker count: `0` means twice the available cores.
///
/// Probing spawns processes and waits on them, so it is not CPU bound.
pub fn resolve_workers(requested: usize) -> usize {
    if requested > 0 {
        return requested;
    }
    std::thread::available_parallelism()
        .map(|n| n.get() * 2)
        .unwrap_or(4)
}

/// Probe every beat's media concurrently.
///
/// Results are ordered by beat index. The first failure fails the whole
/// pass; nothing defaults to zero.
pub fn probe_all(
    beats: &[Beat],
    prober: &dyn DurationProbe,
    workers: usize,
) -> TimelineResult<Vec<MediaProbe>> {
    if beats.is_empty() {
        return Ok(Vec::new());
    }

    let threads = resolve_workers(workers).min(beats.len());
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("beat-probe-{}", i))
        .build()
        .map_err(|e| TimelineError::WorkerPool(e.to_string()))?;

    tracing::debug!("Probing {} beats on {} workers", beats.len(), threads);

    pool.install(|| {
        beats
            .par_iter()
            .enumerate()
            .map(|(index, beat)| {
                probe_beat(beat, prober).map_err(|source| TimelineError::ProbeFailed {
                    beat: index,
                    source,
                })
            })
            .collect()
    })
}

/// Probe a single beat's own audio and movie.
fn probe_beat(beat: &Beat, prober: &dyn DurationProbe) -> ProbeResult<MediaProbe> {
    let mut probe = MediaProbe::empty();

    if let Some(source) = beat.movie_source() {
        let info = prober.probe(source)?;
        probe.movie_duration = info.duration / beat.movie_speed();
        probe.has_movie_audio = info.has_audio;
    }

    if let Some(ref audio) = beat.audio_file {
        probe.audio_duration = prober.probe(audio)?.duration;
    }

    Ok(probe)
}
