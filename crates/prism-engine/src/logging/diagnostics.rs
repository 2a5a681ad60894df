use crate::device::DeviceInfo;

/// Logs a `---- title ----` divider at info level.
pub fn log_section(title: &str) {
    log::info!("---- {title} ----");
}

/// Dumps driver identification and limits, one row per line.
pub fn log_device_info(info: &DeviceInfo) {
    log_section("Device Info");
    for (label, value) in info.rows() {
        log::info!("{label:<30} {value}");
    }
}
