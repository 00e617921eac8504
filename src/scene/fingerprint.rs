use std::fmt;

use xxhash_rust::xxh3::Xxh3;

use crate::foundation::core::WorldSize;

const XXH3_SEED: u64 = 0x5b7d_3c1e_a4f0_9d27;

/// Short, shareable identity of a scene: same seed, world and palette give the same value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SceneFingerprint(pub u64);

impl fmt::Display for SceneFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Hash of `"{seed}@{w}x{h}@{palette}"`, palette name lowercased.
pub fn scene_fingerprint(seed: u64, world: WorldSize, palette_name: &str) -> SceneFingerprint {
    let mut h = Xxh3::with_seed(XXH3_SEED);
    h.update(seed.to_string().as_bytes());
    h.update(b"@");
    h.update(format!("{}x{}", world.w, world.h).as_bytes());
    h.update(b"@");
    h.update(palette_name.to_lowercase().as_bytes());
    SceneFingerprint(h.digest())
}
