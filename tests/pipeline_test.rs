//! End-to-end tests for the summarization pipeline

use std::io::Cursor;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use stream_summary_agent::{
    BinningConfig, ChannelSource, CsvSource, EnvelopeBuilder, FileSink, FieldValue, IterSource,
    JsonLinesSource, MemorySink, OutputFormat, PipelineConfig, PipelineDriver, PipelineError,
    Record, SinkError, SourceError, Summary, SummaryEnvelope, SummarySink, Termination,
};

fn config(window_size: usize, num_bins: usize, lower: f64, upper: f64) -> PipelineConfig {
    PipelineConfig::new(
        NonZeroUsize::new(window_size).unwrap(),
        BinningConfig::new(num_bins, lower, upper).unwrap(),
    )
}

fn test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("stream-summary-it-{name}"));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

/// Sink that raises the stop flag after its first successful write.
struct StopAfterFirst {
    inner: MemorySink,
    stop: Arc<AtomicBool>,
}

impl SummarySink for StopAfterFirst {
    fn write(&mut self, summary: &Summary) -> Result<(), SinkError> {
        self.inner.write(summary)?;
        self.stop.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_two_record_window_summary() {
    let source = IterSource::from_records(vec![
        Record::new().with("x", 1.0),
        Record::new().with("x", 3.0),
    ]);
    let mut driver = PipelineDriver::new(config(2, 2, 0.0, 4.0), source, MemorySink::new());

    let report = driver.run().unwrap();
    assert_eq!(report.termination, Termination::EndOfStream);
    assert_eq!(report.summaries_emitted, 1);

    let summaries = driver.into_sink().into_summaries();
    let x = summaries[0].column("x").unwrap();
    assert!((x.mean - 2.0).abs() < 1e-9);
    assert!((x.stddev - 1.0).abs() < 1e-9);
    assert_eq!(x.max, 3.0);
    assert_eq!(x.histogram, vec![1, 1]);
}

#[test]
fn test_windows_emitted_in_order_without_overlap() {
    let records: Vec<Record> = (0..10).map(|i| Record::new().with("v", i as f64)).collect();
    let mut driver = PipelineDriver::new(
        config(3, 5, 0.0, 10.0),
        IterSource::from_records(records),
        MemorySink::new(),
    );

    let report = driver.run().unwrap();
    assert_eq!(report.windows_sealed, 3);
    assert_eq!(report.records_discarded, 1);

    let summaries = driver.into_sink().into_summaries();
    let sequences: Vec<u64> = summaries.iter().map(|s| s.sequence).collect();
    assert_eq!(sequences, vec![0, 1, 2]);

    let maxima: Vec<f64> = summaries.iter().map(|s| s.column("v").unwrap().max).collect();
    assert_eq!(maxima, vec![2.0, 5.0, 8.0]);
    assert!(summaries.iter().all(|s| s.record_count == 3));
}

#[test]
fn test_out_of_range_values_excluded_from_histogram_only() {
    let source = IterSource::from_records(vec![
        Record::new().with("x", -5.0),
        Record::new().with("x", 2.0),
        Record::new().with("x", 60.0),
    ]);
    let mut driver = PipelineDriver::new(config(3, 10, 0.0, 50.0), source, MemorySink::new());
    driver.run().unwrap();

    let x = driver.sink().summaries()[0].column("x").unwrap().clone();
    assert_eq!(x.histogram.iter().sum::<u64>(), 1);
    assert_eq!(x.histogram[0], 1);
    assert_eq!(x.max, 60.0);
    assert!((x.mean - 19.0).abs() < 1e-9);
}

#[test]
fn test_schema_mismatch_rejects_record_and_continues() {
    let source = IterSource::from_records(vec![
        Record::new().with("a", 1.0).with("b", 2.0),
        Record::new().with("a", 3.0),
        Record::new().with("b", 4.0).with("a", 5.0),
    ]);
    let mut driver = PipelineDriver::new(config(2, 2, 0.0, 10.0), source, MemorySink::new());

    let report = driver.run().unwrap();
    assert_eq!(report.records_read, 3);
    assert_eq!(report.records_rejected, 1);
    assert_eq!(report.summaries_emitted, 1);

    let a = driver.sink().summaries()[0].column("a").unwrap().clone();
    assert_eq!(a.max, 5.0);
}

#[test]
fn test_jsonl_source_into_file_sink() {
    let input = "{\"x\": 1, \"y\": null}\n\n{\"x\": 3, \"y\": \"7\"}\n{\"x\": 5, \"y\": 1}\n";
    let dir = test_dir("jsonl");
    let sink = FileSink::new(&dir, OutputFormat::Jsonl, EnvelopeBuilder::new()).unwrap();
    let lines_path = sink.lines_path();

    let mut pipeline = config(2, 2, 0.0, 10.0);
    pipeline.flush_partial = true;
    let mut driver = PipelineDriver::new(pipeline, JsonLinesSource::new(Cursor::new(input)), sink);

    let report = driver.run().unwrap();
    assert_eq!(report.records_read, 3);
    assert_eq!(report.summaries_emitted, 2);

    let content = std::fs::read_to_string(&lines_path).unwrap();
    let envelopes: Vec<SummaryEnvelope> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(envelopes.len(), 2);

    let first = &envelopes[0].summary;
    assert_eq!(first.sequence, 0);
    let y = first.column("y").unwrap();
    assert_eq!(y.null_count, 1);
    assert_eq!(y.max, 7.0);

    let trailing = &envelopes[1].summary;
    assert_eq!(trailing.record_count, 1);
    assert_eq!(trailing.first_offset, 2);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_malformed_line_is_fatal() {
    let input = "{\"x\": 1}\nnot json\n";
    let mut driver = PipelineDriver::new(
        config(1, 2, 0.0, 4.0),
        JsonLinesSource::new(Cursor::new(input)),
        MemorySink::new(),
    );

    let err = driver.run().unwrap_err();
    assert!(matches!(err, PipelineError::SourceRead(_)));
    assert_eq!(driver.sink().summaries().len(), 1);
}

#[test]
fn test_channel_source_fed_from_producer_thread() {
    let (sender, source) = ChannelSource::bounded(4);

    let producer = thread::spawn(move || {
        for i in 0..8 {
            if !sender.send(Record::new().with("t", FieldValue::Number(i as f64))) {
                break;
            }
        }
    });

    let mut driver = PipelineDriver::new(config(4, 4, 0.0, 8.0), source, MemorySink::new());
    let report = driver.run().unwrap();
    producer.join().unwrap();

    assert_eq!(report.termination, Termination::EndOfStream);
    let summaries = driver.into_sink().into_summaries();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].column("t").unwrap().histogram, vec![2, 2, 0, 0]);
    assert_eq!(summaries[1].column("t").unwrap().histogram, vec![0, 0, 2, 2]);
}

#[test]
fn test_stop_finishes_sealed_window_and_discards_partial() {
    let records: Vec<Record> = (0..7).map(|i| Record::new().with("x", i as f64)).collect();
    let stop = Arc::new(AtomicBool::new(false));
    let sink = StopAfterFirst {
        inner: MemorySink::new(),
        stop: Arc::clone(&stop),
    };

    let mut pipeline = config(3, 2, 0.0, 10.0);
    pipeline.flush_partial = true;
    let mut driver = PipelineDriver::new(pipeline, IterSource::from_records(records), sink)
        .with_stop_signal(stop);

    let report = driver.run().unwrap();
    assert_eq!(report.termination, Termination::Stopped);
    assert_eq!(report.records_read, 3);
    assert_eq!(report.summaries_emitted, 1);
    assert_eq!(report.records_discarded, 0);

    let summaries = driver.into_sink().inner.into_summaries();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].sequence, 0);
}

#[test]
fn test_stop_mid_window_discards_buffered_records() {
    let stop = Arc::new(AtomicBool::new(false));
    let trigger = Arc::clone(&stop);
    let records = (0..10).map(move |i| {
        if i == 4 {
            trigger.store(true, Ordering::SeqCst);
        }
        Ok::<_, SourceError>(Record::new().with("x", i as f64))
    });

    let mut driver = PipelineDriver::new(
        config(3, 2, 0.0, 10.0),
        IterSource::new(records),
        MemorySink::new(),
    )
    .with_stop_signal(stop);

    let report = driver.run().unwrap();
    assert_eq!(report.termination, Termination::Stopped);
    assert_eq!(report.records_read, 5);
    assert_eq!(report.summaries_emitted, 1);
    assert_eq!(report.records_discarded, 2);
}

#[test]
fn test_turbine_csv_summarized() {
    let input = "\
timestamp,wind_speed,power,status
2023-01-01T00:00:00,4.0,,ok
2023-01-01T00:10:00,6.0,1500,ok
2023-01-01T00:20:00,inf,2500,ok
2023-01-01T00:30:00,12.0,4000,ok
2023-01-01T00:40:00,9.0,3000,ok
";
    let mut driver = PipelineDriver::new(
        config(2, 5, 0.0, 25.0),
        CsvSource::new(Cursor::new(input)),
        MemorySink::new(),
    );

    let report = driver.run().unwrap();
    assert_eq!(report.records_read, 5);
    assert_eq!(report.windows_sealed, 2);
    // Timestamps and status labels are text, so every window is dropped
    assert_eq!(report.windows_failed, 2);
    assert_eq!(report.summaries_emitted, 0);

    let numeric = "\
wind_speed,power
4.0,
6.0,1500
inf,2500
12.0,4000
";
    let mut driver = PipelineDriver::new(
        config(2, 5, 0.0, 25.0),
        CsvSource::new(Cursor::new(numeric)),
        MemorySink::new(),
    );
    driver.run().unwrap();

    let summaries = driver.into_sink().into_summaries();
    assert_eq!(summaries.len(), 2);

    let wind = summaries[0].column("wind_speed").unwrap();
    assert!((wind.mean - 5.0).abs() < 1e-9);
    assert_eq!(wind.histogram, vec![1, 1, 0, 0, 0]);

    let power = summaries[0].column("power").unwrap();
    assert_eq!(power.null_count, 1);
    assert_eq!(power.max, 1500.0);

    let wind = summaries[1].column("wind_speed").unwrap();
    assert_eq!(wind.count, 1);
    assert_eq!(wind.null_count, 1);
    assert_eq!(wind.max, 12.0);

    let envelope = EnvelopeBuilder::new().build(&summaries[1]);
    let json = serde_json::to_string(&envelope).unwrap();
    assert!(serde_json::from_str::<SummaryEnvelope>(&json).is_ok());
}
