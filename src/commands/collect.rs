//! Collect command implementation.
//!
//! Runs collection passes against this host and prints the gauges.

use std::time::Instant;

use herakles_disk_check::{detect_source, GaugeSample, RecordingSink};

use crate::cli::OutputFormat;
use crate::config::Config;

/// Runs `iterations` passes and prints the gauges of each.
pub fn command_collect(
    iterations: usize,
    format: OutputFormat,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let check = config.disk_check()?;
    let source = detect_source(config.source);
    let mut sink = RecordingSink::new();

    for iteration in 1..=iterations {
        let start = Instant::now();
        let summary = check.run(source.as_ref(), &mut sink)?;
        let duration = start.elapsed();

        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&sink.samples)?);
            }
            OutputFormat::Text => {
                println!("\n🔄 Pass {}/{} ({} source):", iteration, iterations, source.name());
                print_samples(&sink.samples);
                println!(
                    "   📊 {} gauges for {} devices in {:.2}ms",
                    summary.gauges,
                    summary.devices,
                    duration.as_secs_f64() * 1000.0
                );
            }
        }
    }

    Ok(())
}

fn print_samples(samples: &[GaugeSample]) {
    let mut current: Option<&str> = None;
    for s in samples {
        if current != Some(s.device_name.as_str()) {
            if s.tags.is_empty() {
                println!("   ├─ {}", s.device_name);
            } else {
                println!("   ├─ {} [{}]", s.device_name, s.tags.join(","));
            }
            current = Some(s.device_name.as_str());
        }
        println!("   │  {:<28} {}", s.name, s.value);
    }
}
