//! Integration tests for roomba-local
//!
//! These drive the full accessory (read path, command path, refresh modes)
//! over the mock robot transport, the way a home-automation frontend would.

use std::sync::Arc;
use std::time::Duration;

use roomba_core::{AccessoryError, BatteryLevel, BatteryStatus, ChargingState, ServiceInfo};
use roomba_local::transport::mock::{mission_state, MockRobot};
use roomba_local::{AccessoryConfig, MockConfig, RoombaAccessory, VacuumAccessory};

fn test_config() -> AccessoryConfig {
    let mut config: AccessoryConfig = toml::from_str(
        r#"
        name = "Living Room Vacuum"
        model = "980"
        blid = "0123456789"
        robotpwd = ":1:234:abc"
        ipaddress = "192.168.1.50"
        "#,
    )
    .unwrap();
    config.status_wait_interval_ms = 10;
    config
}

fn accessory_over(robot: &MockRobot, config: AccessoryConfig) -> RoombaAccessory {
    RoombaAccessory::with_transport(config, Arc::new(robot.clone()))
}

#[tokio::test]
async fn characteristic_getters_share_one_cached_fetch() {
    let robot = MockRobot::new(&MockConfig::default());
    robot.set_default_state(mission_state("charge", 55, false));
    let accessory = accessory_over(&robot, test_config());

    assert!(!accessory.get_running_status().await.unwrap());
    assert_eq!(
        accessory.get_is_charging().await.unwrap(),
        ChargingState::Charging
    );
    assert_eq!(
        accessory.get_battery_level().await.unwrap(),
        BatteryLevel::Percent(55)
    );
    assert_eq!(
        accessory.get_low_battery_status().await.unwrap(),
        BatteryStatus::Normal
    );

    // All four getters served by a single robot query.
    assert_eq!(robot.state_query_count(), 1);
    // Each ephemeral session was released.
    assert_eq!(robot.open_count(), robot.close_count());
}

#[tokio::test]
async fn unreachable_robot_surfaces_as_getter_error() {
    let robot = MockRobot::new(&MockConfig::default());
    robot.set_reachable(false);
    let accessory = accessory_over(&robot, test_config());

    let err = accessory.get_running_status().await.unwrap_err();
    assert!(matches!(err, AccessoryError::Transport(_)));
}

#[tokio::test(start_paused = true)]
async fn set_power_invalidates_the_cached_status() {
    let robot = MockRobot::new(&MockConfig::default());
    robot.set_default_state(mission_state("charge", 80, false));
    let accessory = accessory_over(&robot, test_config());

    assert!(!accessory.get_running_status().await.unwrap());
    assert_eq!(robot.state_query_count(), 1);

    accessory.set_power(true).await.unwrap();
    robot.set_default_state(mission_state("run", 80, false));

    // The cache was invalidated by the command, so the next read goes
    // back to the robot and sees the new phase.
    assert!(accessory.get_running_status().await.unwrap());
    assert_eq!(robot.state_query_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn pause_then_dock_end_to_end() {
    let robot = MockRobot::new(&MockConfig::default());
    robot.push_state(mission_state("run", 60, false));
    robot.push_state(mission_state("stop", 60, false));
    let accessory = accessory_over(&robot, test_config());

    accessory.set_power(false).await.unwrap();
    assert_eq!(robot.pause_count(), 1);

    // First poll sees the robot still running, second sees it stopped.
    tokio::task::yield_now().await;
    tokio::time::advance(Duration::from_secs(3)).await;
    tokio::task::yield_now().await;

    assert_eq!(robot.dock_count(), 1);
    assert_eq!(robot.open_count(), robot.close_count());
}

#[tokio::test]
async fn keep_alive_push_updates_reach_subscribers_and_cache() {
    let robot = MockRobot::new(&MockConfig::default());
    let mut config = test_config();
    config.keep_alive_enabled = true;
    let accessory = accessory_over(&robot, config);
    let mut updates = accessory.subscribe_updates();

    // Let the push refresher subscribe to the event stream.
    tokio::task::yield_now().await;
    robot.inject_state(mission_state("run", 42, true));

    let status = updates.recv().await.unwrap();
    assert!(status.running);
    assert!(status.bin_full);

    // The pushed status satisfies reads without any robot query.
    assert!(accessory.get_running_status().await.unwrap());
    assert_eq!(robot.state_query_count(), 0);
}

#[test]
fn services_enumerate_metadata_switch_and_battery() {
    let robot = MockRobot::new(&MockConfig::default());
    let accessory = accessory_over(&robot, test_config());
    let services = accessory.get_services();

    assert_eq!(services.len(), 3);
    match &services[0] {
        ServiceInfo::AccessoryInformation(info) => {
            assert_eq!(info.name, "Living Room Vacuum");
            assert_eq!(info.model, "980");
            assert_eq!(info.manufacturer, "iRobot");
        }
        other => panic!("expected accessory information, got {other:?}"),
    }
    assert!(matches!(services[1], ServiceInfo::PowerSwitch { .. }));
    assert!(matches!(services[2], ServiceInfo::Battery { .. }));
}
