//! Drive the bridge against an in-memory Sengled cloud.
//!
//! This example demonstrates:
//! - Poll cycles adding, updating and removing accessories
//! - A device going offline
//! - Push updates from a Wi-Fi color light
//! - Host writes, including a paired hue/saturation write
//!
//! Run with: cargo run --example bridge_sim -- --help

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use clap::{Parser, Subcommand};
use sengled_bridge::push::PushHandler;
use sengled_bridge::runtime::ShutdownToken;
use sengled_bridge::{
    AccessoryIdentity, Bridge, BridgeConfig, Characteristic, CharacteristicValue, ClientError,
    CloudClient, ControlSurface, DeviceCommand, DeviceList, DeviceSnapshot, UpdateValue,
};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "bridge-sim")]
#[command(about = "Simulate a Sengled account bridged to an accessory host", long_about = None)]
struct Cli {
    /// Throttle window in milliseconds
    #[arg(long, default_value = "1000")]
    throttle_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted sequence of poll cycles
    Cycles,

    /// Write a color to the simulated color light
    Color {
        /// Hue (0-360)
        hue: f64,
        /// Saturation (0-100)
        saturation: f64,
    },

    /// Run the bridge loop for a while and feed it push updates
    Run {
        /// Seconds to run
        #[arg(short, long, default_value = "3")]
        seconds: u64,
    },
}

/// Sengled cloud kept in memory.
#[derive(Default)]
struct SimCloud {
    devices: Mutex<Vec<DeviceSnapshot>>,
    clock: AtomicU64,
    topics: Mutex<HashMap<String, PushHandler>>,
}

impl SimCloud {
    fn set(&self, devices: Vec<DeviceSnapshot>) {
        *self.devices.lock().unwrap() = devices;
    }

    fn publish(&self, topic: &str, payload: &str) -> bool {
        match self.topics.lock().unwrap().get(topic) {
            Some(handler) => {
                handler(payload);
                true
            }
            None => false,
        }
    }
}

impl CloudClient for SimCloud {
    fn fetch_all_devices(&self) -> impl Future<Output = Result<DeviceList, ClientError>> + Send {
        let ts = self.clock.fetch_add(30_000, Ordering::SeqCst);
        let list = DeviceList::new(ts, self.devices.lock().unwrap().clone());
        std::future::ready(Ok(list))
    }

    fn subscribe(
        &self,
        topic: &str,
        handler: PushHandler,
    ) -> impl Future<Output = Result<(), ClientError>> + Send {
        println!("  cloud: subscribe {topic}");
        self.topics.lock().unwrap().insert(topic.to_string(), handler);
        std::future::ready(Ok(()))
    }

    fn unsubscribe(&self, topic: &str) -> impl Future<Output = Result<(), ClientError>> + Send {
        println!("  cloud: unsubscribe {topic}");
        self.topics.lock().unwrap().remove(topic);
        std::future::ready(Ok(()))
    }

    fn send_command(
        &self,
        command: &DeviceCommand,
    ) -> impl Future<Output = Result<(), ClientError>> + Send {
        let result = serde_json::to_string(command)
            .map(|json| println!("  cloud: command {json}"))
            .map_err(ClientError::from);
        std::future::ready(result)
    }
}

/// Accessory host that prints what it is told.
struct PrintSurface;

impl ControlSurface for PrintSurface {
    fn register_accessory(&self, identity: &AccessoryIdentity, characteristics: &[Characteristic]) {
        println!(
            "  host: + {} \"{}\" {} {} {:?}",
            identity.device_id(),
            identity.name(),
            AccessoryIdentity::MANUFACTURER,
            identity.product_code(),
            characteristics
        );
    }

    fn unregister_accessory(&self, identity: &AccessoryIdentity) {
        println!("  host: - {} \"{}\"", identity.device_id(), identity.name());
    }

    fn update_characteristic(&self, accessory: Uuid, characteristic: Characteristic, value: UpdateValue) {
        match value {
            UpdateValue::Value(v) => println!("  host: {accessory} {characteristic} = {v:?}"),
            UpdateValue::NoResponse => println!("  host: {accessory} {characteristic} not responding"),
        }
    }
}

const DESK: &str = "B0:CE:18:00:00:01";
const HALL: &str = "B0:CE:18:00:00:02";
const PLUG: &str = "B0:CE:18:00:00:03";

fn desk() -> DeviceSnapshot {
    DeviceSnapshot::new(DESK, "Desk", "wifielement", "W21-N13").with_power(true)
}

fn hall() -> DeviceSnapshot {
    DeviceSnapshot::new(HALL, "Hall", "light", "Z01-A19NAE26")
        .with_power(true)
        .with_brightness(128.0)
        .with_color_temperature(4000.0)
}

fn plug() -> DeviceSnapshot {
    DeviceSnapshot::new(PLUG, "Fan", "plug", "E1C-NB6").with_power(false)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = BridgeConfig::new()
        .throttle_window(Duration::from_millis(cli.throttle_ms))
        .refresh_interval(Duration::from_millis(500));

    let cloud = SimCloud::default();
    cloud.set(vec![desk(), hall(), plug()]);
    let bridge = Bridge::new(cloud, PrintSurface, config);

    match cli.command {
        Commands::Cycles => {
            println!("Cycle 1: three devices");
            println!("{:?}", bridge.refresh_devices().await?);

            println!("\nCycle 2: hall goes offline, plug is renamed");
            bridge.client().set(vec![
                desk(),
                hall().with_online(false),
                DeviceSnapshot::new(PLUG, "Heater", "plug", "E1C-NB6"),
            ]);
            println!("{:?}", bridge.refresh_devices().await?);

            println!("\nCycle 3: desk removed, an unsupported gateway shows up");
            bridge.client().set(vec![
                hall(),
                plug(),
                DeviceSnapshot::new("B0:CE:18:00:00:FF", "Hub", "S1Gateway", "E39-G8"),
            ]);
            println!("{:?}", bridge.refresh_devices().await?);
        }
        Commands::Color { hue, saturation } => {
            bridge.refresh_devices().await?;
            println!("\nWriting hue {hue}");
            bridge
                .write(DESK, Characteristic::Hue, Some(CharacteristicValue::Float(hue)))
                .await?;
            println!("Writing saturation {saturation}");
            bridge
                .write(
                    DESK,
                    Characteristic::Saturation,
                    Some(CharacteristicValue::Float(saturation)),
                )
                .await?;
        }
        Commands::Run { seconds } => {
            let shutdown = ShutdownToken::new();
            let task = bridge.spawn(shutdown.clone());

            tokio::time::sleep(Duration::from_millis(100)).await;
            let topic = format!("wifielement/{DESK}/status");
            let payload = format!(
                r#"[{{"dn": "{DESK}", "type": "brightness", "value": "35"}},
                    {{"dn": "{DESK}", "type": "color", "value": "ff8000"}}]"#
            );
            if !bridge.client().publish(&topic, &payload) {
                eprintln!("desk light is not subscribed yet");
            }

            tokio::time::sleep(Duration::from_secs(seconds)).await;
            shutdown.cancel();
            task.await;
            println!("{:#}", bridge.diagnostics().await);
        }
    }

    Ok(())
}
