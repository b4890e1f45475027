use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use trigger_bridge::actions::Action;
use trigger_bridge::actions::Event;
use trigger_bridge::clock::{Clock, SystemClock};
use trigger_bridge::config::{BridgeConfig, ButtonType, load_dotenv};
use trigger_bridge::control::{ActionTrigger, Button, ButtonKind, VirtualRelay};
use trigger_bridge::device::Device;
use trigger_bridge::input::{GestureScript, SimulatedPin};
use trigger_bridge::protocol::MqttPublisher;
use trigger_bridge::storage::JsonConfigStore;

#[derive(Parser, Debug)]
#[command(name = "trigger-bridge", about = "Button gesture to action trigger bridge")]
struct Args {
    /// Path to a JSON configuration file; environment variables are used
    /// when omitted.
    #[arg(short, long, env = "TRIGGER_BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Drive the simulated buttons with a scripted click sequence.
    #[arg(long)]
    demo: bool,
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

#[tokio::main]
async fn main() {
    init_logger();
    load_dotenv();
    let args = Args::parse();
    info!("Starting Trigger Bridge");

    let config = match &args.config {
        Some(path) => match BridgeConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load configuration: {}", e);
                std::process::exit(1);
            }
        },
        None => BridgeConfig::from_env(),
    };
    info!("Configuration loaded:");
    info!("  Device Name: {}", config.device.name);
    info!("  MQTT Broker: {}:{}", config.mqtt.broker_host, config.mqtt.broker_port);
    info!("  Buttons: {}", config.buttons.len());

    let store = match JsonConfigStore::open(JsonConfigStore::default_path()) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open state store: {}", e);
            std::process::exit(1);
        }
    };

    let mut device = Device::new();
    let mut pins = Vec::new();
    for button_cfg in &config.buttons {
        let kind = match button_cfg.button_type {
            ButtonType::Monostable => ButtonKind::Monostable,
            ButtonType::Bistable => ButtonKind::Bistable,
            ButtonType::MotionSensor => ButtonKind::MotionSensor,
        };
        let pin = SimulatedPin::new(false);
        let button = Arc::new(Button::new(
            device.registry().clone(),
            pin.clone(),
            button_cfg.number,
            kind,
        ));
        button.set_invert_logic(button_cfg.invert_logic);
        button.set_hold_time(button_cfg.hold_time_ms);
        button.set_multiclick_time(button_cfg.multiclick_time_ms);
        if button_cfg.repeat_on_hold_ms > 0 {
            button.repeat_on_hold_every(button_cfg.repeat_on_hold_ms);
        }

        // one virtual relay per button as the local consumer
        let relay = VirtualRelay::new(
            device.registry().clone(),
            format!("relay-{}", button_cfg.number),
        );
        let relay_id = device.registry().register_handler(relay.clone());
        let local_event = match kind {
            ButtonKind::Monostable => Event::Press,
            ButtonKind::Bistable | ButtonKind::MotionSensor => Event::Change,
        };
        button.trigger().add_action(Action::Toggle, relay_id, local_event);

        let at = ActionTrigger::new(button.clone(), button_cfg.number);
        if let Some(related) = button_cfg.related_channel {
            at.set_related_channel(related);
        }
        at.enable_state_storage();

        device.add_element(button);
        device.add_element(relay);
        device.add_element(at);
        pins.push(pin);
    }

    let (publisher, event_loop) = MqttPublisher::new(&config.mqtt);
    tokio::spawn(MqttPublisher::run(event_loop, publisher.connected_flag()));

    let clock = SystemClock::new();
    device.begin(&store, clock.millis());

    let mut scripts: Vec<GestureScript> = if args.demo {
        info!("Demo mode: scripted clicks on every button");
        pins.iter()
            .map(|pin| GestureScript::clicks(pin.clone(), 3, 120, 150))
            .collect()
    } else {
        Vec::new()
    };

    let mut interval = tokio::time::interval(tokio::time::Duration::from_millis(10));
    let mut was_connected = false;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = clock.millis();
                for script in &mut scripts {
                    script.advance(now);
                }
                device.on_timer(now);

                let connected = publisher.is_connected();
                if connected && !was_connected {
                    device.on_registered();
                }
                was_connected = connected;
                if connected {
                    device.iterate_connected(&publisher);
                }

                if let Err(e) = store.flush_due(chrono::Utc::now()) {
                    error!("State flush failed: {}", e);
                }
            }
            _ = signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    device.save_state(&store);
    if let Err(e) = store.save() {
        error!("Final state save failed: {}", e);
    }
    info!("Trigger Bridge stopped");
}
