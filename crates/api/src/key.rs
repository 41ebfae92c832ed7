//! The composite identity correlating fragments with a waiter.

use std::sync::Arc;

/// Identifies one logical request/response exchange with a device.
///
/// Two keys are equal only if all three components are equal, so
/// unrelated requests can never be merged even if a device or channel
/// id contains characters used as separators elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationKey {
    /// The device the request was sent to.
    pub device_id: Arc<str>,

    /// The channel on that device.
    pub channel_id: Arc<str>,

    /// The sequence number the request was issued with.
    pub sn: u32,
}

impl CorrelationKey {
    /// Construct a new key.
    pub fn new(device_id: &str, channel_id: &str, sn: u32) -> Self {
        Self {
            device_id: device_id.into(),
            channel_id: channel_id.into(),
            sn,
        }
    }

    /// The canonical string encoding of this key.
    ///
    /// Each string component is length-prefixed:
    /// `{device_len}:{device}/{channel_len}:{channel}/{sn}`.
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}/{}:{}/{}",
            self.device_id.len(),
            self.device_id,
            self.channel_id.len(),
            self.channel_id,
            self.sn
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn encode_is_length_prefixed() {
        assert_eq!(
            "4:dev1/3:ch1/100",
            CorrelationKey::new("dev1", "ch1", 100).encode()
        );
    }

    #[test]
    fn delimiters_in_components_do_not_collide() {
        let keys = [
            CorrelationKey::new("a-b", "c", 1),
            CorrelationKey::new("a", "b-c", 1),
            CorrelationKey::new("a/3:b", "c", 1),
            CorrelationKey::new("a", "3:b/c", 1),
            CorrelationKey::new("", "a/b", 1),
        ];

        let encoded: HashSet<String> =
            keys.iter().map(CorrelationKey::encode).collect();
        assert_eq!(keys.len(), encoded.len());

        let hashed: HashSet<CorrelationKey> = keys.iter().cloned().collect();
        assert_eq!(keys.len(), hashed.len());
    }

    #[test]
    fn sequence_number_distinguishes_keys() {
        assert_ne!(
            CorrelationKey::new("dev1", "ch1", 1),
            CorrelationKey::new("dev1", "ch1", 2)
        );
    }
}
