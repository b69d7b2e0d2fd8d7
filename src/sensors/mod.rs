//! Simulated biometric sensing for the wellbeing and ergonomics views.
//!
//! There is no real hardware behind this: [`step`] perturbs the previous
//! reading with a weighted random walk. Randomness and time are passed in,
//! so a seeded [`rand::rngs::StdRng`] gives a reproducible trace.

use chrono::{ DateTime, Utc };
use log::{ debug, info };
use rand::Rng;
use serde::{ Deserialize, Serialize };
use std::time::Duration;
use tokio::sync::watch;

pub const HEART_RATE_RANGE: (u32, u32) = (50, 130);
pub const RESTING_HEART_RATE: u32 = 72;
pub const SCORE_MAX: u8 = 100;

const POOR_POSTURE_BELOW: u8 = 60;
const HIGH_STRESS_ABOVE: u8 = 75;
const ELEVATED_HEART_RATE_ABOVE: u32 = 110;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiometricReading {
    pub heart_rate: u32,
    pub stress_level: u8,
    pub posture_score: u8,
    pub recorded_at: DateTime<Utc>,
}

impl BiometricReading {
    pub fn baseline(now: DateTime<Utc>) -> Self {
        Self {
            heart_rate: RESTING_HEART_RATE,
            stress_level: 30,
            posture_score: 85,
            recorded_at: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WellnessAlert {
    PoorPosture,
    HighStress,
    ElevatedHeartRate,
}

impl WellnessAlert {
    pub fn advice(&self) -> &'static str {
        match self {
            WellnessAlert::PoorPosture => "Sit back and straighten up; your posture score is low.",
            WellnessAlert::HighStress => "Stress is running high. A short break could help.",
            WellnessAlert::ElevatedHeartRate => "Your heart rate is elevated. Take a moment to rest.",
        }
    }
}

fn clamp_score(value: i32) -> u8 {
    value.clamp(0, SCORE_MAX as i32) as u8
}

/// Advances the simulation by one tick.
pub fn step<R: Rng + ?Sized>(
    previous: &BiometricReading,
    rng: &mut R,
    now: DateTime<Utc>
) -> BiometricReading {
    // Heart rate: pull a third of the way back to resting, plus noise.
    let hr = previous.heart_rate as i32;
    let pull = ((RESTING_HEART_RATE as i32) - hr) / 3;
    let heart_rate = (hr + pull + rng.gen_range(-3..=3)).clamp(
        HEART_RATE_RANGE.0 as i32,
        HEART_RATE_RANGE.1 as i32
    ) as u32;

    let roll: f64 = rng.gen();
    let stress_delta = if roll < 0.6 {
        rng.gen_range(-2..=2)
    } else if roll < 0.9 {
        rng.gen_range(1..=6)
    } else {
        -rng.gen_range(5..=15)
    };
    let stress_level = clamp_score((previous.stress_level as i32) + stress_delta);

    let posture_delta = if rng.gen_bool(0.25) {
        rng.gen_range(5..=15)
    } else {
        -rng.gen_range(0..=3)
    };
    let posture_score = clamp_score((previous.posture_score as i32) + posture_delta);

    BiometricReading {
        heart_rate,
        stress_level,
        posture_score,
        recorded_at: now,
    }
}

pub fn assess(reading: &BiometricReading) -> Vec<WellnessAlert> {
    let mut alerts = Vec::new();
    if reading.posture_score < POOR_POSTURE_BELOW {
        alerts.push(WellnessAlert::PoorPosture);
    }
    if reading.stress_level > HIGH_STRESS_ABOVE {
        alerts.push(WellnessAlert::HighStress);
    }
    if reading.heart_rate > ELEVATED_HEART_RATE_ABOVE {
        alerts.push(WellnessAlert::ElevatedHeartRate);
    }
    alerts
}

/// Publishes a new reading every `interval` until every receiver is dropped.
pub async fn run_simulator<R: Rng + Send>(
    mut rng: R,
    interval: Duration,
    sender: watch::Sender<BiometricReading>
) {
    info!("Biometric simulator started ({} ms interval)", interval.as_millis());
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let next = step(&*sender.borrow(), &mut rng, Utc::now());
        debug!(
            "Simulated reading: hr={} stress={} posture={}",
            next.heart_rate,
            next.stress_level,
            next.posture_score
        );
        if sender.send(next).is_err() {
            info!("No biometric subscribers left, stopping simulator");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn arb_reading() -> impl Strategy<Value = BiometricReading> {
        (HEART_RATE_RANGE.0..=HEART_RATE_RANGE.1, 0..=SCORE_MAX, 0..=SCORE_MAX).prop_map(
            |(heart_rate, stress_level, posture_score)| BiometricReading {
                heart_rate,
                stress_level,
                posture_score,
                recorded_at: Utc::now(),
            }
        )
    }

    proptest! {
        #[test]
        fn readings_stay_in_range(start in arb_reading(), seed in any::<u64>(), ticks in 1usize..200) {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut reading = start;
            for _ in 0..ticks {
                reading = step(&reading, &mut rng, Utc::now());
                prop_assert!(reading.heart_rate >= HEART_RATE_RANGE.0);
                prop_assert!(reading.heart_rate <= HEART_RATE_RANGE.1);
                prop_assert!(reading.stress_level <= SCORE_MAX);
                prop_assert!(reading.posture_score <= SCORE_MAX);
            }
        }
    }

    #[test]
    fn same_seed_same_trace() {
        let now = Utc::now();
        let trace = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut reading = BiometricReading::baseline(now);
            (0..50)
                .map(|_| {
                    reading = step(&reading, &mut rng, now);
                    reading
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(trace(7), trace(7));
    }

    #[test]
    fn heart_rate_reverts_toward_resting() {
        let now = Utc::now();
        let mut rng = StdRng::seed_from_u64(1);
        let mut reading = BiometricReading {
            heart_rate: HEART_RATE_RANGE.1,
            ..BiometricReading::baseline(now)
        };
        for _ in 0..30 {
            reading = step(&reading, &mut rng, now);
        }
        assert!(reading.heart_rate < 90, "heart rate stuck at {}", reading.heart_rate);
    }

    #[test]
    fn assess_flags_each_threshold() {
        let now = Utc::now();
        assert!(assess(&BiometricReading::baseline(now)).is_empty());

        let strained = BiometricReading {
            heart_rate: 115,
            stress_level: 80,
            posture_score: 40,
            recorded_at: now,
        };
        assert_eq!(assess(&strained), vec![
            WellnessAlert::PoorPosture,
            WellnessAlert::HighStress,
            WellnessAlert::ElevatedHeartRate
        ]);
    }

    #[tokio::test(start_paused = true)]
    async fn simulator_publishes_and_stops_without_subscribers() {
        let (tx, mut rx) = watch::channel(BiometricReading::baseline(Utc::now()));
        let handle = tokio::spawn(
            run_simulator(StdRng::seed_from_u64(3), Duration::from_millis(100), tx)
        );

        rx.changed().await.unwrap();
        rx.changed().await.unwrap();
        drop(rx);

        tokio::time::timeout(Duration::from_secs(5), handle).await.unwrap().unwrap();
    }
}
