//! Telemetry Logger - stream FlightCtrl telemetry as JSON lines.
//!
//! This example demonstrates:
//! - Opening a connection with the builder pattern
//! - Registering typed callbacks for all three record types
//! - Driving `poll()` from a timer and renewing the output subscription
//!
//! # Running
//!
//! ```text
//! cargo run --example telemetry -- /dev/ttyUSB0 57600          # debug output every 10 units
//! cargo run --example telemetry -- /dev/ttyUSB0 57600 0        # continuous high-speed output
//! cargo run --example telemetry -- port.json 0                 # port settings from JSON
//! cargo run --example telemetry -- --list                      # list serial ports
//! ```

use std::time::Duration;

use mk_link::codec::{AnalogLabel, DebugOutput, HighSpeedOutput};
use mk_link::transport::{list_ports, SerialConfig, DEFAULT_BAUD_RATE};
use mk_link::Connection;
use serde::Serialize;

/// One output line.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Line<'a> {
    Label(&'a AnalogLabel),
    Debug(&'a DebugOutput),
    HighSpeed(&'a HighSpeedOutput),
}

fn emit(line: Line<'_>) {
    match serde_json::to_string(&line) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::warn!("Failed to serialize record: {}", e),
    }
}

/// Parse `<port|config.json> [baud] [interval]`.
fn parse_args(args: &[String]) -> Result<(SerialConfig, u8), Box<dyn std::error::Error>> {
    let target = args.first().ok_or("usage: telemetry <port|config.json> [baud] [interval]")?;
    let mut rest = args[1..].iter();

    let config = if target.ends_with(".json") {
        SerialConfig::from_json(&std::fs::read_to_string(target)?)?
    } else {
        let baud = match rest.next() {
            Some(baud) => baud.parse()?,
            None => DEFAULT_BAUD_RATE,
        };
        SerialConfig::new(target.as_str(), baud)
    };

    let interval = match rest.next() {
        Some(interval) => interval.parse()?,
        None => 10,
    };

    Ok((config, interval))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) == Some("--list") {
        for port in list_ports()? {
            println!("{}", serde_json::to_string(&port)?);
        }
        return Ok(());
    }

    let (config, interval) = parse_args(&args)?;
    let high_speed = interval == 0;

    let mut conn: Connection = Connection::builder()
        .on_header(|label: &AnalogLabel| emit(Line::Label(label)))
        .on_debug_output(|out: &DebugOutput| emit(Line::Debug(out)))
        .on_high_speed_output(|out: &HighSpeedOutput| emit(Line::HighSpeed(out)))
        .open_with_config(&config)?;

    tracing::info!(
        "Streaming from {} @ {} baud ({})",
        config.port,
        config.baud_rate,
        if high_speed { "high-speed" } else { "debug" }
    );

    // The FlightCtrl stops sending unless the subscription is renewed.
    let mut poll_timer = tokio::time::interval(Duration::from_millis(10));
    let mut renew_timer = tokio::time::interval(Duration::from_secs(2));

    loop {
        tokio::select! {
            _ = poll_timer.tick() => {
                conn.poll()?;
            }
            _ = renew_timer.tick() => {
                conn.send_output_request(interval)?;
                conn.send_header_request(high_speed)?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    let stats = conn.stats();
    eprintln!("{}", serde_json::to_string(&stats)?);
    conn.close();
    Ok(())
}
