//! Camera-style frame chain: test pattern in, grayscale mirrored half-size
//! frames out.
//!
//! Run with: cargo run --example frame_chain

use framechain::error::Result;
use framechain::io::{LogSink, StopAfter, TestPattern, TestPatternSource};
use framechain::pipeline::{Driver, Pipeline};
use framechain::stages::{Grayscale, Mirror, Resize};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("framechain=info")
        .init();

    println!("Frame Chain Example");
    println!("===================\n");

    let source = TestPatternSource::new()
        .with_pattern(TestPattern::ColorBars)
        .with_resolution(640, 480)
        .with_framerate(30, 1);

    let mut pipeline = Pipeline::builder()
        .stage(Grayscale::new())
        .stage(Mirror::new())
        .stage(Resize::half())
        .name("camera")
        .build()?;
    let mut events = pipeline.subscribe();

    println!("Stages: {}", pipeline.stage_names().join(" -> "));

    // Stop after 60 frames, two seconds of stream at 30 fps.
    let mut driver = Driver::new(source, LogSink::with_name("display"), StopAfter::new(60));
    let report = driver.run(&mut pipeline)?;

    println!("\nStopped: {:?}", report.stop_reason);
    println!("Submitted: {}", report.frames_submitted);
    println!("Rendered: {}", report.frames_rendered);
    println!("Stage failures: {}", report.stage_failures);
    for worker in &report.pipeline.workers {
        println!(
            "  [{}] {}: {} processed, {} failed ({})",
            worker.index, worker.stage, worker.frames_processed, worker.failures, worker.state
        );
    }

    println!("\nEvents:");
    for event in events.drain() {
        println!("  {:?}", event);
    }

    Ok(())
}
