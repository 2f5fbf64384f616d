//! Video clip selection against a fixed target duration.

use rand::Rng;

use super::history::RecentHistory;
use super::pool::{DrawOrder, ShufflePool};
use super::SelectionError;
use crate::media::DurationProbe;
use crate::models::{Clip, PlaylistEntry, Timeline};

/// Slack when deciding whether a whole clip still fits (1 ms).
pub const FIT_EPSILON_SECS: f64 = 1e-3;

/// Inputs for [`select_video_timeline`].
#[derive(Debug, Clone)]
pub struct VideoRequest<'a> {
    /// Main clip pool.
    pub pool: &'a [Clip],
    /// Clip placed first regardless of the pools.
    pub first: Option<&'a Clip>,
    /// Opening clips drawn before the main pool.
    pub opening_pool: &'a [Clip],
    /// How many opening clips to draw.
    pub opening_count: usize,
    /// Output length to fill, in seconds.
    pub target_secs: f64,
    /// Playback speed multiplier.
    pub speed: f64,
}

/// Outcome of appending one candidate.
enum Fit {
    Continue,
    Done,
}

struct Builder {
    timeline: Timeline,
    remaining: f64,
    speed: f64,
}

impl Builder {
    fn append(&mut self, clip: Clip, probed: f64, from_opening: bool) -> Fit {
        let adjusted = probed / self.speed;
        if adjusted <= self.remaining + FIT_EPSILON_SECS {
            self.timeline
                .push(PlaylistEntry::whole(clip, probed, self.speed).with_opening(from_opening));
            self.remaining = (self.remaining - adjusted).max(0.0);
        } else {
            let needed = probed.min(self.remaining * self.speed);
            self.timeline.push(
                PlaylistEntry::trimmed(clip, probed, needed, self.speed).with_opening(from_opening),
            );
            self.remaining = 0.0;
        }
        if self.remaining <= 0.0 {
            Fit::Done
        } else {
            Fit::Continue
        }
    }
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

/// Fill `target_secs` of output with video clips, trimming the last one.
///
/// The resulting timeline's total adjusted duration equals the target
/// within [`FIT_EPSILON_SECS`].
pub fn select_video_timeline<R: Rng + ?Sized>(
    request: &VideoRequest<'_>,
    prober: &dyn DurationProbe,
    rng: &mut R,
) -> Result<Timeline, SelectionError> {
    if !(request.speed > 0.0 && request.speed.is_finite()) {
        return Err(SelectionError::InvalidMultiplier {
            name: "video speed multiplier",
            value: request.speed,
        });
    }
    if !(request.target_secs > 0.0) {
        return Err(SelectionError::InvalidTarget);
    }

    let mut main = ShufflePool::new("main video", request.pool.to_vec(), DrawOrder::Shuffled, rng)?;
    let mut opening = if request.opening_count > 0 && !request.opening_pool.is_empty() {
        Some(ShufflePool::new(
            "opening video",
            request.opening_pool.to_vec(),
            DrawOrder::Shuffled,
            rng,
        )?)
    } else {
        None
    };

    let mut history = RecentHistory::default();
    let mut opening_history = RecentHistory::default();
    let mut builder = Builder {
        timeline: Timeline::new(),
        remaining: request.target_secs,
        speed: request.speed,
    };

    if let Some(first) = request.first {
        if !request.pool.contains(first) {
            tracing::info!("First video {} is not in the main folder; using it anyway", first);
        }
        let probed = probe_nonzero(prober, first)?;
        history.push(first.path.clone());
        if let Fit::Done = builder.append(first.clone(), probed, false) {
            return Ok(builder.timeline);
        }
    }

    let mut opening_used = 0;
    loop {
        let (clip, from_opening) = match opening.as_mut() {
            Some(pool) if opening_used < request.opening_count => {
                opening_used += 1;
                (pool.next_avoiding(&mut opening_history, rng), true)
            }
            _ => (main.next_avoiding(&mut history, rng), false),
        };

        let probed = probe_nonzero(prober, &clip)?;
        tracing::debug!(
            "Video: {} ({:.2}s{})",
            clip.file_name(),
            probed,
            if from_opening { ", opening" } else { "" }
        );

        if let Fit::Done = builder.append(clip, probed, from_opening) {
            return Ok(builder.timeline);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::FixedDurations;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DURATIONS: [(&str, f64); 6] = [
        ("a.mp4", 12.0),
        ("b.mp4", 7.5),
        ("c.mp4", 30.0),
        ("d.mp4", 4.25),
        ("op1.mp4", 3.0),
        ("op2.mp4", 5.0),
    ];

    fn main_pool() -> Vec<Clip> {
        ["a.mp4", "b.mp4", "c.mp4", "d.mp4"]
            .iter()
            .map(|n| Clip::video(format!("/v/{}", n)))
            .collect()
    }

    fn opening_pool() -> Vec<Clip> {
        vec![Clip::video("/o/op1.mp4"), Clip::video("/o/op2.mp4")]
    }

    fn request<'a>(pool: &'a [Clip], target_secs: f64, speed: f64) -> VideoRequest<'a> {
        VideoRequest {
            pool,
            first: None,
            opening_pool: &[],
            opening_count: 0,
            target_secs,
            speed,
        }
    }

    #[test]
    fn total_matches_target() {
        let prober = FixedDurations::new(&DURATIONS);
        let pool = main_pool();
        for seed in 0..40 {
            for speed in [0.5, 1.0, 1.5, 3.0] {
                for target in [1.0, 20.0, 137.25, 600.0] {
                    let mut rng = StdRng::seed_from_u64(seed);
                    let timeline =
                        select_video_timeline(&request(&pool, target, speed), &prober, &mut rng).unwrap();
                    let total = timeline.total_adjusted_secs();
                    assert!((total - target).abs() <= FIT_EPSILON_SECS, "{total} vs {target}");

                    let entries = timeline.entries();
                    assert!(entries[..entries.len() - 1].iter().all(|e| !e.is_trimmed()));
                    for pair in entries.windows(2) {
                        assert_ne!(pair[0].clip, pair[1].clip);
                    }
                }
            }
        }
    }

    #[test]
    fn trims_within_clip_length() {
        let prober = FixedDurations::new(&DURATIONS);
        let pool = vec![Clip::video("/v/c.mp4")];
        let mut rng = StdRng::seed_from_u64(0);

        let timeline = select_video_timeline(&request(&pool, 10.0, 2.0), &prober, &mut rng).unwrap();
        assert_eq!(timeline.len(), 1);
        let entry = &timeline.entries()[0];
        assert_eq!(entry.trim_secs, Some(20.0));
        assert!((entry.output_secs - 10.0).abs() < 1e-9);
    }

    #[test]
    fn pinned_clip_covering_target_stops() {
        let prober = FixedDurations::new(&DURATIONS);
        let pool = main_pool();
        let first = Clip::video("/v/c.mp4");
        let mut req = request(&pool, 25.0, 1.0);
        req.first = Some(&first);
        let mut rng = StdRng::seed_from_u64(4);

        let timeline = select_video_timeline(&req, &prober, &mut rng).unwrap();
        assert_eq!(timeline.len(), 1);
        assert_eq!(
            timeline.used_files(),
            vec!["/v/c.mp4 (first 25.00s -> output 25.00s)".to_string()]
        );
    }

    #[test]
    fn opening_clips_come_first_and_reuse_when_exhausted() {
        let prober = FixedDurations::new(&DURATIONS);
        let pool = main_pool();
        let openings = opening_pool();
        let mut req = request(&pool, 200.0, 1.0);
        req.opening_pool = &openings;
        req.opening_count = 5;
        let mut rng = StdRng::seed_from_u64(11);

        let timeline = select_video_timeline(&req, &prober, &mut rng).unwrap();
        let entries = timeline.entries();
        assert!(entries[..5].iter().all(|e| e.from_opening));
        assert!(entries[5..].iter().all(|e| !e.from_opening));
        assert!((timeline.total_adjusted_secs() - 200.0).abs() <= FIT_EPSILON_SECS);
    }

    #[test]
    fn opening_clips_never_repeat_back_to_back() {
        let prober = FixedDurations::new(&DURATIONS);
        let pool = main_pool();
        let openings = opening_pool();
        for seed in 0..40 {
            let mut req = request(&pool, 300.0, 1.0);
            req.opening_pool = &openings;
            req.opening_count = 6;
            let mut rng = StdRng::seed_from_u64(seed);

            let timeline = select_video_timeline(&req, &prober, &mut rng).unwrap();
            for pair in timeline.entries()[..6].windows(2) {
                assert_ne!(pair[0].clip, pair[1].clip, "seed {}", seed);
            }
        }
    }

    #[test]
    fn single_long_clip_is_trimmed_to_target() {
        let prober = FixedDurations::new(&[("x.mp4", 100.0)]);
        let pool = vec![Clip::video("/v/x.mp4")];
        let mut rng = StdRng::seed_from_u64(0);

        let timeline = select_video_timeline(&request(&pool, 70.0, 1.0), &prober, &mut rng).unwrap();
        assert_eq!(timeline.len(), 1);
        let entry = &timeline.entries()[0];
        assert!(entry.is_trimmed());
        assert_eq!(entry.trim_secs, Some(70.0));
        assert!((entry.output_secs - 70.0).abs() < 1e-9);
        assert!((timeline.total_adjusted_secs() - 70.0).abs() <= FIT_EPSILON_SECS);
    }

    #[test]
    fn validation_failures() {
        let prober = FixedDurations::new(&DURATIONS);
        let pool = main_pool();
        let mut rng = StdRng::seed_from_u64(0);

        let err = select_video_timeline(&request(&[], 10.0, 1.0), &prober, &mut rng).unwrap_err();
        assert_eq!(err, SelectionError::EmptyPool { pool: "main video" });

        let err = select_video_timeline(&request(&pool, 10.0, -1.0), &prober, &mut rng).unwrap_err();
        assert!(matches!(err, SelectionError::InvalidMultiplier { .. }));

        let broken = vec![Clip::video("/v/missing.mp4")];
        let err = select_video_timeline(&request(&broken, 10.0, 1.0), &prober, &mut rng).unwrap_err();
        assert!(matches!(err, SelectionError::ZeroDuration { .. }));
    }
}
