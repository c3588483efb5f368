//! Status keys shared by every node
//!
//! These appear as the `Key` half of radio `Key:Value` messages and as the
//! key field of [`StatusMsg`](crate::messages::StatusMsg) frames.

/// Mailbox enclosure temperature, value in degrees F
pub const MAILBOX_TEMPERATURE: &str = "MailboxTemperature";

/// Mailbox door opened, no value
pub const MAILBOX_DOOR_OPENED: &str = "MailboxDoorOpened";

/// Mule (delivery) alarm raised, no value
pub const MULE_ALARM: &str = "MuleAlarm";

pub const CHARGER_CHARGE_STATUS_ON: &str = "ChargerChargeStatusOn";
pub const CHARGER_CHARGE_STATUS_OFF: &str = "ChargerChargeStatusOff";
pub const CHARGER_POWER_SOURCE_GOOD: &str = "ChargerPowerSourceGood";
pub const CHARGER_POWER_SOURCE_BAD: &str = "ChargerPowerSourceBad";

// Heartbeats, one per node main loop
pub const ROAD_MAIN_LOOP_HEARTBEAT: &str = "RoadMainLoopHeartbeat";
pub const DSP_MAIN_LOOP_HEARTBEAT: &str = "DspMainLoopHeartbeat";
pub const SOIL_MAIN_LOOP_HEARTBEAT: &str = "SoilMainLoopHeartbeat";
pub const GATEWAY_HEARTBEAT: &str = "GatewayHeartbeat";

/// Soil moisture, raw capacitive reading
pub const SOIL_MOISTURE: &str = "SoilMoisture";

/// Soil temperature, value in degrees F
pub const SOIL_TEMPERATURE: &str = "SoilTemperature";

/// Every known key, in a fixed order
pub const ALL: [&str; 13] = [
    MAILBOX_TEMPERATURE,
    MAILBOX_DOOR_OPENED,
    MULE_ALARM,
    CHARGER_CHARGE_STATUS_ON,
    CHARGER_CHARGE_STATUS_OFF,
    CHARGER_POWER_SOURCE_GOOD,
    CHARGER_POWER_SOURCE_BAD,
    ROAD_MAIN_LOOP_HEARTBEAT,
    DSP_MAIN_LOOP_HEARTBEAT,
    SOIL_MAIN_LOOP_HEARTBEAT,
    GATEWAY_HEARTBEAT,
    SOIL_MOISTURE,
    SOIL_TEMPERATURE,
];

/// Returns true if `key` is one of the shared keys
pub fn is_known(key: &str) -> bool {
    ALL.contains(&key)
}
