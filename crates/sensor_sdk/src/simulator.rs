//! Simulated sensor
//!
//! Generates image-space batches at a fixed rate on a background thread and
//! hands them to whatever is registered in the SDK's point slot at that moment.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use contracts::{ImagePoint, SensorHandle, SimulatedSensorConfig};
use rand::Rng;
use tracing::{debug, trace};

use crate::slots::CallbackSlots;

/// Generate one batch of points for a simulated sensor.
///
/// Returns are spread over a ±0.5 tangent window; a `zero_distance_ratio`
/// share of points carries no return.
pub fn generate_batch(config: &SimulatedSensorConfig, timestamp_us: i64) -> Vec<ImagePoint> {
    let mut rng = rand::rng();
    (0..config.points_per_batch)
        .map(|i| {
            let no_return = rng.random::<f64>() < config.zero_distance_ratio;
            ImagePoint {
                timestamp: timestamp_us + i as i64,
                image_x: rng.random_range(-0.5..0.5),
                distance: if no_return {
                    0.0
                } else {
                    rng.random_range(0.5..100.0)
                },
                image_z: rng.random_range(-0.5..0.5),
                intensity: rng.random_range(0.0..1.0),
                return_number: 0,
                valid: !no_return,
            }
        })
        .collect()
}

fn now_micros() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as i64)
        .unwrap_or_default()
}

/// Batch period for a sensor, `None` when `frequency_hz` does not give a
/// positive, representable period.
pub fn emit_interval(frequency_hz: f64) -> Option<Duration> {
    if !(frequency_hz.is_finite() && frequency_hz > 0.0) {
        return None;
    }
    Duration::try_from_secs_f64(1.0 / frequency_hz).ok()
}

/// Spawn the emitter thread for one simulated sensor.
///
/// The thread exits once `running` is cleared.
pub(crate) fn spawn_emitter(
    handle: SensorHandle,
    config: SimulatedSensorConfig,
    interval: Duration,
    slots: Arc<CallbackSlots>,
    running: Arc<AtomicBool>,
    delivered: Arc<AtomicU64>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut batch_id: u64 = 0;

        debug!(
            handle = %handle,
            serial_number = %config.serial_number,
            frequency_hz = config.frequency_hz,
            "simulated sensor started"
        );

        while running.load(Ordering::Relaxed) {
            batch_id += 1;
            let points = generate_batch(&config, now_micros());

            if let Some(on_points) = slots.points() {
                on_points(handle, &points);
                delivered.fetch_add(1, Ordering::Relaxed);
                trace!(handle = %handle, batch_id, points = points.len(), "simulated batch sent");
            }

            thread::sleep(interval);
        }

        debug!(handle = %handle, "simulated sensor stopped");
    })
}
