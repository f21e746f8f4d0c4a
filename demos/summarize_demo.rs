//! Demonstration of the stream summary pipeline.
//!
//! This example shows how to:
//! 1. Feed records into the pipeline from a producer thread
//! 2. Summarize fixed-size windows
//! 3. Write summary envelopes as JSON lines to stdout
//! 4. Inspect the activity log afterwards
//!
//! Run with: cargo run --example summarize_demo

use std::num::NonZeroUsize;
use std::thread;
use std::time::Duration;

use stream_summary_agent::{
    activity::create_shared_log, BinningConfig, ChannelSource, EnvelopeBuilder, PipelineConfig,
    PipelineDriver, Record, WriterSink,
};

fn main() {
    println!("Stream Summary Agent - Summarize Demo");
    println!("=====================================");
    println!();

    let binning = match BinningConfig::new(5, 0.0, 100.0) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Invalid binning: {e}");
            return;
        }
    };
    let window_size = NonZeroUsize::new(4).unwrap_or(NonZeroUsize::MIN);
    let config = PipelineConfig::new(window_size, binning);

    let (sender, source) = ChannelSource::bounded(16);

    // Simulated sensor readings, one every 50ms
    let producer = thread::spawn(move || {
        for i in 0..10u32 {
            let reading = Record::new()
                .with("temperature", 20.0 + (i % 4) as f64 * 2.5)
                .with("humidity", 40.0 + i as f64 * 3.0);
            if !sender.send(reading) {
                break;
            }
            thread::sleep(Duration::from_millis(50));
        }
        println!("Producer finished (10 readings, 2 left in the last window)");
    });

    let activity = create_shared_log();
    let sink = WriterSink::stdout(EnvelopeBuilder::new());
    let mut driver = PipelineDriver::new(config, source, sink).with_activity_log(activity.clone());

    match driver.run() {
        Ok(report) => {
            let _ = producer.join();
            println!();
            println!(
                "Emitted {} summaries, {} records left in a partial window",
                report.summaries_emitted, report.records_discarded
            );
        }
        Err(e) => eprintln!("Pipeline failed: {e}"),
    }

    println!();
    println!("{}", activity.summary());
}
