//! Test utilities associated with fragments.

use bytes::Bytes;
use rand::Rng;
use respcache_api::Fragment;

/// Create a vector of random bytes.
pub fn random_bytes(length: u16) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let mut bytes = vec![0; length as usize];
    rng.fill(&mut bytes[..]);
    bytes
}

/// Create a list of random fragments.
pub fn random_fragments(count: usize) -> Vec<Fragment> {
    (0..count).map(|_| Bytes::from(random_bytes(32))).collect()
}

/// Create a fragment from a static label, handy for asserting order.
pub fn fragment(label: &'static str) -> Fragment {
    Bytes::from_static(label.as_bytes())
}
