//! Network service traits

/// Time and WiFi link services
pub trait NetworkServices {
    /// Local time in epoch seconds, `None` until synced
    fn local_time(&mut self) -> Option<u64>;

    /// Offset applied to network time
    fn set_utc_offset(&mut self, offset_seconds: i32);

    /// Signal strength of the current link
    fn rssi_dbm(&mut self) -> i32;
}

/// Web UI push channel (websocket)
pub trait PushChannel {
    /// Number of connected clients
    fn client_count(&self) -> usize;

    /// Send a text frame to every connected client
    fn broadcast(&mut self, text: &str);
}
