#![cfg(feature = "virtual")]

use gameinput_joystick::backends::virtual_input::{VirtualDevice, VirtualGameInput};
use gameinput_joystick::platform::{
    capability, gamepad_button, rumble_motor, status, DeviceHandle, GameInput, GamepadState,
};
use gameinput_joystick::{
    DriverConfig, Error, EventFilter, EventLog, GameInputDriver, InstanceId, JoystickEvent,
    JoystickSink, SinkBus,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn driver(platform: &Arc<VirtualGameInput>) -> GameInputDriver {
    let platform: Arc<dyn GameInput> = platform.clone();
    GameInputDriver::init(platform, DriverConfig::default()).unwrap()
}

#[test]
fn connect_announce_disconnect() {
    init_logger();
    let platform = VirtualGameInput::new();
    let pad = platform.plug(VirtualDevice::new(0x045E, 0x02FF));

    let mut driver = driver(&platform);
    assert_eq!(driver.count(), 1);
    let id = driver.device_instance_id(0).unwrap();

    let mut sink = EventLog::new();
    driver.detect(&mut sink);
    assert_eq!(sink.drain(), vec![JoystickEvent::DeviceAdded { instance_id: id }]);
    assert!(driver.registry().find_by_index(0).unwrap().is_announced());

    // Nothing changes on a quiet pass.
    driver.detect(&mut sink);
    assert!(sink.is_empty());

    platform.unplug(&pad);
    driver.detect(&mut sink);
    assert_eq!(
        sink.drain(),
        vec![JoystickEvent::DeviceRemoved { instance_id: id }]
    );
    assert_eq!(driver.count(), 0);
    assert_eq!(driver.registry().capacity(), 0);
    assert_eq!(Arc::strong_count(&pad), 1);
}

#[test]
fn hotplug_after_init() {
    let platform = VirtualGameInput::new();
    let mut driver = driver(&platform);
    assert_eq!(driver.count(), 0);

    let pad = platform.plug(VirtualDevice::new(0x045E, 0x0B12));
    // Queued, not yet applied.
    assert_eq!(driver.count(), 0);

    let mut sink = EventLog::new();
    driver.detect(&mut sink);
    assert_eq!(driver.count(), 1);
    assert_eq!(sink.added().len(), 1);
    assert_eq!(Arc::strong_count(&pad), 3);
}

#[test]
fn connect_and_disconnect_within_one_pass() {
    let platform = VirtualGameInput::new();
    let mut driver = driver(&platform);

    let pad = platform.plug(VirtualDevice::new(1, 2));
    platform.unplug(&pad);

    let mut sink = EventLog::new();
    driver.detect(&mut sink);
    let added = sink.added();
    assert_eq!(added.len(), 1);
    assert_eq!(sink.removed(), added);
    assert!(matches!(sink.events()[0], JoystickEvent::DeviceAdded { .. }));
    assert!(matches!(sink.events()[1], JoystickEvent::DeviceRemoved { .. }));
    assert_eq!(driver.count(), 0);
}

#[test]
fn status_loss_without_notification_removes() {
    let platform = VirtualGameInput::new();
    let a = platform.plug(VirtualDevice::new(1, 1));
    let b = platform.plug(VirtualDevice::new(1, 2));
    let c = platform.plug(VirtualDevice::new(1, 3));
    let mut driver = driver(&platform);

    let mut sink = EventLog::new();
    driver.detect(&mut sink);
    let ids = sink.added();
    assert_eq!(ids.len(), 3);

    // Two adjacent entries vanish; the shifted-in one must not be skipped.
    a.set_status(status::NONE);
    b.set_status(status::NONE);
    sink.drain();
    driver.detect(&mut sink);
    assert_eq!(sink.removed(), vec![ids[0], ids[1]]);
    assert_eq!(driver.count(), 1);
    assert_eq!(driver.device_instance_id(0), Some(ids[2]));
    drop(c);
}

#[test]
fn removed_is_never_emitted_before_added() {
    let platform = VirtualGameInput::new();
    let mut driver = driver(&platform);
    let mut sink = EventLog::new();

    let mut pads = Vec::new();
    for round in 0..5u16 {
        pads.push(platform.plug(VirtualDevice::new(0x045E, round)));
        if round % 2 == 1 {
            let gone = pads.remove(0);
            platform.unplug(&gone);
        }
        driver.detect(&mut sink);
    }
    for pad in &pads {
        platform.unplug(pad);
    }
    driver.detect(&mut sink);

    let mut added = HashSet::new();
    for event in sink.events() {
        match event {
            JoystickEvent::DeviceAdded { instance_id } => {
                assert!(added.insert(*instance_id));
            }
            JoystickEvent::DeviceRemoved { instance_id } => {
                assert!(added.contains(instance_id), "removed {} before added", instance_id);
            }
            _ => {}
        }
    }
    assert_eq!(sink.added().len(), 5);
    assert_eq!(sink.removed().len(), 5);
    assert_eq!(driver.count(), 0);
}

#[test]
fn identity_accessors() {
    let platform = VirtualGameInput::new();
    let mut device_id = [0u8; 32];
    device_id[0] = 0xDE;
    device_id[1] = 0xAD;
    platform.plug(
        VirtualDevice::new(0x045E, 0x0B13)
            .with_device_id(device_id)
            .with_capabilities(capability::WIRELESS)
            .with_firmware(5, 9),
    );
    let mut driver = driver(&platform);

    assert_eq!(driver.device_name(0), Some("GameInput Gamepad"));
    let path = driver.device_path(0).unwrap();
    assert_eq!(path.len(), 64);
    assert!(path.starts_with("DEAD00"));
    assert_eq!(driver.steam_virtual_gamepad_slot(0), -1);

    let guid = driver.device_guid(0).unwrap();
    assert_eq!(guid.bus(), gameinput_joystick::guid::HARDWARE_BUS_BLUETOOTH);
    assert_eq!(guid.vendor(), 0x045E);
    assert_eq!(guid.product(), 0x0B13);
    assert_eq!(guid.version(), 0x0509);
    assert_eq!(guid.0[14], b'g');

    assert_eq!(driver.player_index(0), None);
    driver.set_player_index(0, Some(2));
    assert_eq!(driver.player_index(0), Some(2));
    driver.set_player_index(0, None);
    assert_eq!(driver.player_index(0), None);

    assert_eq!(driver.device_name(1), None);
    assert_eq!(driver.device_path(1), None);
    assert_eq!(driver.device_guid(1), None);
    assert_eq!(driver.device_instance_id(1), None);
    driver.set_player_index(7, Some(1));

    let json = driver.devices_json().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed[0]["vid"], 0x045E);
    assert_eq!(parsed[0]["bus"], "bluetooth");
    assert_eq!(parsed[0]["guid"].as_str().unwrap().len(), 32);
}

#[test]
fn presence_check() {
    let platform = VirtualGameInput::new();
    platform.plug(VirtualDevice::new(0x045E, 0x0B13));
    let driver = driver(&platform);

    assert!(driver.is_device_present(0x045E, 0x0B13));
    // Xbox One GIP controller: always claimed.
    assert!(driver.is_device_present(0x045E, 0x02FF));
    assert!(!driver.is_device_present(0x054C, 0x0CE6));
}

#[test]
fn device_without_info_is_not_tracked() {
    init_logger();
    let platform = VirtualGameInput::new();
    platform.plug(VirtualDevice::new(1, 1).without_info());
    platform.plug(VirtualDevice::new(1, 2));
    let driver = driver(&platform);
    assert_eq!(driver.count(), 1);
    assert_eq!(driver.registry().find_by_index(0).unwrap().product(), 2);
}

#[test]
fn null_notification_is_ignored() {
    let platform = VirtualGameInput::new();
    let mut driver = driver(&platform);
    platform.notify_null(status::CONNECTED);
    let mut sink = EventLog::new();
    driver.detect(&mut sink);
    assert!(sink.is_empty());
    assert_eq!(driver.count(), 0);
}

#[test]
fn registration_failure_carries_hresult() {
    let platform = VirtualGameInput::new();
    platform.fail_registration(0x8000_4005_u32 as i32);
    let dyn_platform: Arc<dyn GameInput> = platform.clone();
    match GameInputDriver::init(dyn_platform, DriverConfig::default()) {
        Err(Error::Platform { code, .. }) => assert_eq!(code, 0x8000_4005),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("init should fail"),
    }
}

#[test]
fn creation_failure_carries_hresult() {
    let result = GameInputDriver::create(|| Err(0x8007_007E_u32 as i32), DriverConfig::default());
    match result {
        Err(e @ Error::Platform { .. }) => {
            assert_eq!(e.to_string(), "GameInputCreate failure with HRESULT of 8007007E");
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("create should fail"),
    }
}

#[test]
fn create_with_factory() {
    let platform = VirtualGameInput::new();
    platform.plug(VirtualDevice::new(1, 1));
    let p = platform.clone();
    let driver = GameInputDriver::create(
        move || Ok(p as Arc<dyn GameInput>),
        DriverConfig::default(),
    )
    .unwrap();
    assert_eq!(driver.count(), 1);
}

#[test]
fn open_reports_shape_and_rumble_caps() {
    let platform = VirtualGameInput::new();
    platform.plug(
        VirtualDevice::new(1, 1)
            .with_rumble_motors(rumble_motor::LOW_FREQUENCY | rumble_motor::HIGH_FREQUENCY),
    );
    platform.plug(VirtualDevice::new(1, 2).with_rumble_motors(rumble_motor::RIGHT_TRIGGER));
    let driver = driver(&platform);

    let a = driver.open(0).unwrap();
    let caps = a.capabilities();
    assert_eq!((caps.axes, caps.buttons, caps.hats), (6, 11, 1));
    assert!(caps.rumble);
    assert!(!caps.trigger_rumble);

    let b = driver.open(1).unwrap();
    assert!(!b.capabilities().rumble);
    assert!(b.capabilities().trigger_rumble);

    assert!(matches!(
        driver.open(2),
        Err(Error::IndexOutOfRange { index: 2, count: 2 })
    ));
    assert!(matches!(driver.gamepad_mapping(0), Err(Error::Unsupported(_))));
}

#[test]
fn update_translates_and_dedups() {
    let platform = VirtualGameInput::new();
    let pad = platform.plug(VirtualDevice::new(0x045E, 0x0B13));
    let mut driver = driver(&platform);
    let mut sink = EventLog::new();
    driver.detect(&mut sink);
    sink.drain();

    let mut session = driver.open(0).unwrap();

    // No reading yet.
    assert_eq!(driver.update(&mut session, &mut sink), 0);
    assert!(sink.is_empty());

    pad.feed(
        250,
        GamepadState {
            buttons: gamepad_button::B | gamepad_button::DPAD_UP | gamepad_button::DPAD_RIGHT,
            left_thumbstick_x: 1.0,
            ..Default::default()
        },
    );
    assert_eq!(driver.update(&mut session, &mut sink), 19);
    assert_eq!(session.last_timestamp(), 250_000);
    let events = sink.drain();
    assert_eq!(
        events[0],
        JoystickEvent::AxisMoved {
            timestamp: 250_000,
            instance_id: session.instance_id(),
            axis: 0,
            value: 32767,
        }
    );
    assert!(events.contains(&JoystickEvent::HatChanged {
        timestamp: 250_000,
        instance_id: session.instance_id(),
        hat: 0,
        value: gameinput_joystick::hat::UP | gameinput_joystick::hat::RIGHT,
    }));

    // Same reading again: nothing.
    assert_eq!(driver.update(&mut session, &mut sink), 0);
    assert!(sink.is_empty());

    // Undecodable payload: nothing, timestamp untouched.
    pad.feed_undecodable(300);
    assert_eq!(driver.update(&mut session, &mut sink), 0);
    assert_eq!(session.last_timestamp(), 250_000);

    pad.feed(301, GamepadState::default());
    assert_eq!(driver.update(&mut session, &mut sink), 19);

    session.close();
}

#[test]
fn rumble_calls_do_not_clobber_each_other() {
    let platform = VirtualGameInput::new();
    let pad = platform.plug(VirtualDevice::new(1, 1).with_rumble_motors(0x0F));
    let driver = driver(&platform);
    let mut session = driver.open(0).unwrap();

    session.rumble(32768, 0).unwrap();
    session.rumble_triggers(65535, 0).unwrap();

    let history = pad.rumble_history();
    assert_eq!(history.len(), 2);
    let last = pad.last_rumble().unwrap();
    assert!((last.low_frequency - 0.5).abs() < 1e-4);
    assert_eq!(last.high_frequency, 0.0);
    assert_eq!(last.left_trigger, 1.0);
    assert_eq!(last.right_trigger, 0.0);
}

#[test]
fn rumble_is_submitted_without_capability() {
    let platform = VirtualGameInput::new();
    let pad = platform.plug(VirtualDevice::new(1, 1));
    let driver = driver(&platform);
    let mut session = driver.open(0).unwrap();
    assert!(!session.capabilities().rumble);
    session.rumble(65535, 65535).unwrap();
    assert_eq!(pad.rumble_history().len(), 1);
}

#[test]
fn session_outlives_registry_entry_reference() {
    let platform = VirtualGameInput::new();
    let pad = platform.plug(VirtualDevice::new(1, 1));
    let mut driver = driver(&platform);
    let mut sink = EventLog::new();
    driver.detect(&mut sink);

    let session = driver.open(0).unwrap();
    assert_eq!(Arc::strong_count(&pad), 4);

    platform.unplug(&pad);
    driver.detect(&mut sink);
    assert_eq!(driver.count(), 0);
    // Test + session.
    assert_eq!(Arc::strong_count(&pad), 2);

    session.close();
    assert_eq!(Arc::strong_count(&pad), 1);
}

#[test]
fn shutdown_proceeds_when_unregister_is_not_acknowledged() {
    init_logger();
    let platform = VirtualGameInput::new();
    let a = platform.plug(VirtualDevice::new(1, 1));
    let b = platform.plug(VirtualDevice::new(1, 2));
    let driver = driver(&platform);
    assert_eq!(Arc::strong_count(&a), 3);

    platform.fail_unregister();
    driver.shutdown();

    assert_eq!(
        platform.last_unregister_timeout(),
        Some(Duration::from_micros(10_000))
    );
    // The platform still holds the callback, but the driver let go of everything.
    assert_eq!(platform.callback_count(), 1);
    assert_eq!(Arc::strong_count(&a), 2);
    assert_eq!(Arc::strong_count(&b), 2);
    assert_eq!(Arc::strong_count(&platform), 1);

    // Late notifications land nowhere.
    let c = platform.plug(VirtualDevice::new(1, 3));
    assert_eq!(Arc::strong_count(&c), 2);
}

#[test]
fn shutdown_releases_everything() {
    let platform = VirtualGameInput::new();
    let a = platform.plug(VirtualDevice::new(1, 1));
    let b = platform.plug(VirtualDevice::new(1, 2));
    let driver = driver(&platform);
    assert_eq!(platform.callback_count(), 1);
    assert_eq!(Arc::strong_count(&a), 3);

    driver.shutdown();
    assert_eq!(platform.callback_count(), 0);
    assert_eq!(Arc::strong_count(&a), 2);
    assert_eq!(Arc::strong_count(&b), 2);
    // Driver's platform reference is gone too.
    assert_eq!(Arc::strong_count(&platform), 1);
}

#[test]
fn drop_unregisters() {
    let platform = VirtualGameInput::new();
    {
        let _driver = driver(&platform);
        assert_eq!(platform.callback_count(), 1);
    }
    assert_eq!(platform.callback_count(), 0);
}

#[test]
fn config_drives_name_and_presence() {
    let platform = VirtualGameInput::new();
    platform.plug(VirtualDevice::new(1, 1));
    let config = DriverConfig::from_toml_str(
        r#"
        device_name = "Test Pad"

        [[always_present]]
        vendor = 0x046D
        product = 0xC21D
        "#,
    )
    .unwrap();
    let dyn_platform: Arc<dyn GameInput> = platform.clone();
    let driver = GameInputDriver::init(dyn_platform, config).unwrap();
    assert_eq!(driver.device_name(0), Some("Test Pad"));
    assert!(driver.is_device_present(0x046D, 0xC21D));
    assert!(driver.is_device_present(0x045E, 0x02FF));
}

#[test]
fn gip_controller_present_with_empty_list() {
    let platform = VirtualGameInput::new();
    let config = DriverConfig::from_toml_str("always_present = []").unwrap();
    let dyn_platform: Arc<dyn GameInput> = platform.clone();
    let driver = GameInputDriver::init(dyn_platform, config).unwrap();
    assert_eq!(driver.count(), 0);
    assert!(driver.is_device_present(0x045E, 0x02FF));
    assert!(!driver.is_device_present(0x045E, 0x02FE));
}

#[test]
fn sink_bus_fans_out_driver_events() {
    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<JoystickEvent>>>);
    impl JoystickSink for Shared {
        fn on_event(&mut self, event: &JoystickEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    let platform = VirtualGameInput::new();
    let pad = platform.plug(VirtualDevice::new(1, 1));
    let mut driver = driver(&platform);

    let lifecycle = Shared::default();
    let buttons = Shared::default();
    let mut bus = SinkBus::new();
    bus.add_sink(lifecycle.clone(), EventFilter::Lifecycle, None);
    bus.add_sink(buttons.clone(), EventFilter::ButtonsOnly, None);

    driver.detect(&mut bus);
    let mut session = driver.open(0).unwrap();
    pad.feed(1, GamepadState::default());
    driver.update(&mut session, &mut bus);

    assert_eq!(lifecycle.0.lock().unwrap().len(), 1);
    assert_eq!(buttons.0.lock().unwrap().len(), 11);
    let id: InstanceId = session.instance_id();
    assert!(buttons.0.lock().unwrap().iter().all(|e| e.instance_id() == id));
}

#[test]
fn handle_identity_is_by_object() {
    let platform = VirtualGameInput::new();
    let pad = platform.plug(VirtualDevice::new(1, 1));
    let driver = driver(&platform);
    let handle: DeviceHandle = pad.clone();
    assert_eq!(driver.registry().position(&handle), Some(0));

    let other: DeviceHandle = Arc::new(VirtualDevice::new(1, 1));
    assert_eq!(driver.registry().position(&other), None);
}
