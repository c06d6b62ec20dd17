//! Random names for test resources

use rand::Rng;

/// `len` random lowercase ASCII letters
pub fn rand_string(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
}
