//! Session statistics.

use std::fmt;
use std::time::Duration;

use bridge::NodeStats;

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Signal,
    Timeout,
    MaxBatches,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Signal => "shutdown signal",
            Self::Timeout => "timeout",
            Self::MaxBatches => "batch limit",
        })
    }
}

/// Statistics from a bridge run
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// Total duration of the run
    pub duration: Duration,

    pub reason: StopReason,

    /// Output transport name
    pub transport: String,

    /// Number of simulated sensors
    pub sensors: usize,

    /// Batches handed to the callback by the SDK
    pub batches_delivered: u64,

    /// Processor and channel statistics
    pub node: NodeStats,
}

impl SessionStats {
    /// Handled batches per second
    pub fn batch_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.node.summary.total_batches as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        let summary = &self.node.summary;

        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     Bridge Statistics                        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Stopped by: {}", self.reason);
        println!("   ├─ Transport: {}", self.transport);
        println!("   ├─ Sensors: {}", self.sensors);
        println!("   ├─ Batches delivered by SDK: {}", self.batches_delivered);
        println!("   └─ Batch rate: {:.2}/s", self.batch_rate());

        println!("\n📈 Processing");
        println!("   ├─ Batches handled: {}", summary.total_batches);
        println!(
            "   ├─ Batches dropped: {} ({:.2}%)",
            summary.dropped_batches, summary.drop_rate
        );
        println!(
            "   ├─ Points: {} in, {} with return ({:.2}%)",
            summary.total_points_in, summary.total_points_out, summary.return_rate
        );
        println!(
            "   ├─ Messages: {} published, {} failed",
            summary.messages_published, summary.publish_failures
        );
        println!("   ├─ SDK events: {}", summary.sdk_events);
        println!("   └─ Callback latency (ms): {}", summary.latency_ms);

        if !self.node.channels.is_empty() {
            println!("\n📡 Channels");
            for (topic, m) in &self.node.channels {
                println!(
                    "   ├─ {}: {} published, {} failed, {} points",
                    topic, m.publish_count, m.failure_count, m.point_count
                );
            }
        }

        println!();
    }
}
