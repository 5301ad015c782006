//! Integration tests of the launched bridge.

mod common;

use arduino_bridge::config::{Config, Timing};
use arduino_bridge::error::Error;
use clap::Parser;
use mock::serial::TestPort;
use serialport::SerialPort;
use tokio::time;

use std::time::Duration;

use common::{Method, MockRemote};

/// Waits until `condition` holds, polling every few milliseconds.
async fn wait_until<F: Fn() -> bool>(condition: F) {
    time::timeout(Duration::from_secs(5), async {
        while !condition() {
            time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("timed out waiting for condition");
}

#[tokio::test]
async fn test_bridge_end_to_end() {
    let test_port = TestPort::new().unwrap();
    let test_port_handle = test_port.clone();

    let remote = MockRemote::new();
    remote.reply("/rough_movements/last_time.txt", 200, "1364412300");
    remote.reply("/rough_movements/last_time.txt?really_rough=1", 200, "1364412301");
    remote.reply("/light_power/last.txt", 200, "0");
    remote.reply("/light_power", 200, "");

    let timing = Timing {
        startup_delay: Duration::from_millis(50),
        rough_interval: Duration::from_millis(200),
        really_rough_interval: Duration::from_millis(20),
        light_interval: Duration::from_millis(20),
    };

    // Launch the bridge
    let bridge_handle = tokio::spawn(arduino_bridge::launch_with_port(
        timing,
        test_port.try_clone().unwrap(),
        remote.clone(),
    ));

    // The time is sent first, followed by the polls
    wait_until(|| {
        let output = test_port_handle.output_string();
        output.contains("Data11364412300a")
            && output.contains("Data31364412301a")
            && output.contains("Data20")
    })
    .await;
    let output = test_port_handle.output_string();
    assert!(output.starts_with("Time"));
    let time_end = output.find('a').unwrap();
    assert!(output[4..time_end].parse::<u64>().unwrap() > 0);

    // A light switch press on the device reaches the remote service
    test_port_handle.send_line("DATA 1");
    wait_until(|| !remote.requests_to(Method::Post, "/light_power").is_empty()).await;
    let posts = remote.requests_to(Method::Post, "/light_power");
    assert_eq!(Some("1"), posts[0].param("light_power[on]"));

    // Unplugging the device stops the bridge
    test_port_handle.set_has_error(true);
    let result = time::timeout(Duration::from_secs(5), bridge_handle)
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(result, Err(Error::SerialReadFatal(_))));
}

#[tokio::test]
async fn test_launch_missing_device() {
    let config = Config::parse_from(["arduino-bridge", "--device", "./nonexistent"]);

    let result = arduino_bridge::launch(config).await;
    assert!(matches!(result, Err(Error::DeviceUnavailable(_))));
}

#[tokio::test]
async fn test_launch_no_device_found() {
    let pattern = std::env::temp_dir()
        .join(format!("arduino-bridge-none-{}", std::process::id()))
        .join("ttyUSB*")
        .to_string_lossy()
        .into_owned();
    let config = Config::parse_from(["arduino-bridge", "--device-pattern", pattern.as_str()]);

    let result = arduino_bridge::launch(config).await;
    assert!(matches!(result, Err(Error::DeviceUnavailable(_))));
}

#[tokio::test]
async fn test_launch_rejects_zero_interval() {
    let config = Config::parse_from(["arduino-bridge", "--rough-interval", "0"]);

    let result = arduino_bridge::launch(config).await;
    assert!(matches!(result, Err(Error::Config(_))));
}
