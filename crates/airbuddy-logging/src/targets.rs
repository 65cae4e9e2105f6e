/// Wireless scan decoding and capture orchestration.
pub const T_WIFI: &str = "wifi";
/// Child process lifecycle (spawn, signal, reap).
pub const T_PROC: &str = "proc";
