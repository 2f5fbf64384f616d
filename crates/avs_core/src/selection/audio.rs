//! Background music playlist construction.

use rand::Rng;

use super::history::RecentHistory;
use super::pool::{DrawOrder, ShufflePool};
use super::SelectionError;
use crate::media::DurationProbe;
use crate::models::{Clip, ClipOffsetTable};

/// Inputs for [`plan_audio_playlist`].
#[derive(Debug, Clone)]
pub struct AudioRequest<'a> {
    /// Candidate tracks.
    pub pool: &'a [Clip],
    /// Track placed first regardless of the pool.
    pub first: Option<&'a Clip>,
    /// Requested output length in whole milliseconds (after tempo).
    pub target_ms: u64,
    /// Tempo multiplier applied to the concatenated track.
    pub tempo: f64,
    /// Walk the pool in name order with no repeat avoidance.
    pub sequential: bool,
}

/// A planned music track, before export.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioPlaylist {
    /// Tracks in playback order.
    pub clips: Vec<Clip>,
    /// Probed source durations in playback order.
    pub offsets: ClipOffsetTable,
    /// Source seconds the playlist had to reach.
    pub effective_target_secs: f64,
    pub tempo: f64,
}

impl AudioPlaylist {
    /// Sum of source durations.
    pub fn total_source_secs(&self) -> f64 {
        self.offsets.total_secs()
    }

    /// Length of the track once the tempo is applied.
    pub fn expected_output_secs(&self) -> f64 {
        self.total_source_secs() / self.tempo
    }

    /// Offsets on the output timeline.
    pub fn scaled_offsets(&self) -> ClipOffsetTable {
        self.offsets.scaled(self.tempo)
    }
}

/// Source seconds needed so that, after the tempo, the track lasts
/// `target_ms`.
pub fn effective_target_secs(target_ms: u64, tempo: f64) -> f64 {
    let ms = (target_ms as f64 * tempo).round().max(1.0);
    ms / 1000.0
}

fn probe_nonzero(prober: &dyn DurationProbe, clip: &Clip) -> Result<f64, SelectionError> {
    let secs = prober.probe(clip);
    if secs > 0.0 {
        Ok(secs)
    } else {
        Err(SelectionError::ZeroDuration {
            path: clip.path.clone(),
        })
    }
}

/// Pick tracks until their summed source duration reaches the effective
/// target. The last track is never trimmed.
pub fn plan_audio_playlist<R: Rng + ?Sized>(
    request: &AudioRequest<'_>,
    prober: &dyn DurationProbe,
    rng: &mut R,
) -> Result<AudioPlaylist, SelectionError> {
    if !(request.tempo > 0.0 && request.tempo.is_finite()) {
        return Err(SelectionError::InvalidMultiplier {
            name: "audio speed multiplier",
            value: request.tempo,
        });
    }
    if request.target_ms == 0 {
        return Err(SelectionError::InvalidTarget);
    }

    let order = if request.sequential {
        DrawOrder::Sequential
    } else {
        DrawOrder::Shuffled
    };
    let mut pool = ShufflePool::new("music", request.pool.to_vec(), order, rng)?;

    let effective = effective_target_secs(request.target_ms, request.tempo);
    let mut history = RecentHistory::default();
    let mut playlist = AudioPlaylist {
        clips: Vec::new(),
        offsets: ClipOffsetTable::new(),
        effective_target_secs: effective,
        tempo: request.tempo,
    };

    tracing::debug!(
        "Audio target {:.3}s at tempo {:.3} -> {:.3} source seconds",
        request.target_ms as f64 / 1000.0,
        request.tempo,
        effective
    );

    if let Some(first) = request.first {
        if !request.pool.contains(first) {
            tracing::info!("First music {} is not in the music folder; using it anyway", first);
        }
        let secs = probe_nonzero(prober, first)?;
        playlist.clips.push(first.clone());
        playlist.offsets.push(first.clone(), secs);
        if !request.sequential {
            history.push(first.path.clone());
        }
    }

    while playlist.total_source_secs() < effective {
        let clip = if request.sequential {
            pool.next_clip(rng)
        } else {
            pool.next_avoiding(&mut history, rng)
        };
        let secs = probe_nonzero(prober, &clip)?;
        tracing::debug!("Music: {} ({:.2}s)", clip.file_name(), secs);
        playlist.clips.push(clip.clone());
        playlist.offsets.push(clip, secs);
    }

    Ok(playlist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::FixedDurations;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn music() -> (Vec<Clip>, FixedDurations) {
        let names = [("a.mp3", 60.0), ("b.mp3", 90.0), ("c.mp3", 45.0), ("d.mp3", 120.0)];
        let pool = names.iter().map(|(n, _)| Clip::audio(format!("/m/{}", n))).collect();
        (pool, FixedDurations::new(&names))
    }

    fn request(pool: &[Clip], target_ms: u64, tempo: f64) -> AudioRequest<'_> {
        AudioRequest {
            pool,
            first: None,
            target_ms,
            tempo,
            sequential: false,
        }
    }

    #[test]
    fn effective_target_scales_with_tempo() {
        assert_eq!(effective_target_secs(300_000, 1.0), 300.0);
        assert_eq!(effective_target_secs(300_000, 1.5), 450.0);
        assert_eq!(effective_target_secs(0, 1.0), 0.001);
    }

    #[test]
    fn reaches_target_with_bounded_overshoot() {
        let (pool, prober) = music();
        for seed in 0..30 {
            for tempo in [0.5, 1.0, 1.25, 2.0] {
                let mut rng = StdRng::seed_from_u64(seed);
                let playlist = plan_audio_playlist(&request(&pool, 400_000, tempo), &prober, &mut rng).unwrap();

                let total = playlist.total_source_secs();
                assert!(total >= playlist.effective_target_secs);
                assert!(total - playlist.effective_target_secs < 120.0);
                assert!(playlist.expected_output_secs() >= 400.0 - 1e-6);
                assert_eq!(playlist.clips.len(), playlist.offsets.len());
            }
        }
    }

    #[test]
    fn no_back_to_back_repeats() {
        let (pool, prober) = music();
        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let playlist = plan_audio_playlist(&request(&pool, 3_600_000, 1.0), &prober, &mut rng).unwrap();
            for pair in playlist.clips.windows(2) {
                assert_ne!(pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn first_track_is_pinned_and_can_finish_alone() {
        let (pool, prober) = music();
        let first = Clip::audio("/m/d.mp3");
        let mut rng = StdRng::seed_from_u64(1);
        let mut req = request(&pool, 100_000, 1.0);
        req.first = Some(&first);

        let playlist = plan_audio_playlist(&req, &prober, &mut rng).unwrap();
        assert_eq!(playlist.clips, vec![first.clone()]);

        req.target_ms = 500_000;
        let playlist = plan_audio_playlist(&req, &prober, &mut rng).unwrap();
        assert_eq!(playlist.clips[0], first);
        assert_ne!(playlist.clips[1], first);
    }

    #[test]
    fn sequential_walks_names_and_wraps() {
        let (pool, prober) = music();
        let mut rng = StdRng::seed_from_u64(9);
        let mut req = request(&pool, 350_000, 1.0);
        req.sequential = true;

        let playlist = plan_audio_playlist(&req, &prober, &mut rng).unwrap();
        let names: Vec<String> = playlist.clips.iter().map(|c| c.file_name()).collect();
        assert_eq!(names, ["a.mp3", "b.mp3", "c.mp3", "d.mp3", "a.mp3"]);
    }

    #[test]
    fn double_tempo_doubles_source_target() {
        let names = [("x.mp3", 60.0), ("y.mp3", 60.0), ("z.mp3", 60.0)];
        let pool: Vec<Clip> = names.iter().map(|(n, _)| Clip::audio(format!("/m/{}", n))).collect();
        let prober = FixedDurations::new(&names);
        let mut rng = StdRng::seed_from_u64(0);
        let mut req = request(&pool, 100_000, 2.0);
        req.sequential = true;

        let playlist = plan_audio_playlist(&req, &prober, &mut rng).unwrap();
        // 100s at 2x needs 200 source seconds
        assert_eq!(playlist.effective_target_secs, 200.0);
        assert_eq!(playlist.clips.len(), 4);
        assert_eq!(playlist.total_source_secs(), 240.0);
        assert!(playlist.total_source_secs() < 200.0 + 60.0);
        assert_eq!(playlist.expected_output_secs(), 120.0);
    }

    #[test]
    fn sequential_pair_overshoots_without_trimming() {
        let names = [("A.mp3", 180.0), ("B.mp3", 120.0)];
        let pool: Vec<Clip> = names.iter().map(|(n, _)| Clip::audio(format!("/m/{}", n))).collect();
        let prober = FixedDurations::new(&names);
        let mut rng = StdRng::seed_from_u64(0);
        let mut req = request(&pool, 240_000, 1.0);
        req.sequential = true;

        let playlist = plan_audio_playlist(&req, &prober, &mut rng).unwrap();
        let names: Vec<String> = playlist.clips.iter().map(|c| c.file_name()).collect();
        assert_eq!(names, ["A.mp3", "B.mp3"]);
        assert_eq!(playlist.total_source_secs(), 300.0);
        assert_eq!(playlist.offsets.offsets(), vec![0.0, 180.0]);
    }

    #[test]
    fn scaled_offsets_use_tempo() {
        let (pool, prober) = music();
        let mut rng = StdRng::seed_from_u64(2);
        let mut req = request(&pool, 90_000, 2.0);
        req.sequential = true;

        let playlist = plan_audio_playlist(&req, &prober, &mut rng).unwrap();
        let scaled = playlist.scaled_offsets();
        assert_eq!(scaled.offsets(), vec![0.0, 30.0, 75.0]);
        assert!((scaled.total_secs() - 97.5).abs() < 1e-9);
        assert_eq!(scaled.time_scale(), 2.0);
    }

    #[test]
    fn validation_failures() {
        let (pool, prober) = music();
        let mut rng = StdRng::seed_from_u64(0);

        let err = plan_audio_playlist(&request(&[], 60_000, 1.0), &prober, &mut rng).unwrap_err();
        assert_eq!(err, SelectionError::EmptyPool { pool: "music" });

        let err = plan_audio_playlist(&request(&pool, 60_000, 0.0), &prober, &mut rng).unwrap_err();
        assert!(matches!(err, SelectionError::InvalidMultiplier { .. }));

        let broken = vec![Clip::audio("/m/broken.mp3")];
        let err = plan_audio_playlist(&request(&broken, 60_000, 1.0), &prober, &mut rng).unwrap_err();
        assert!(matches!(err, SelectionError::ZeroDuration { .. }));
    }
}
