//! Seeded RNG streams, one per simulation domain.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use sha2::Sha256;
use std::cell::{RefCell, RefMut};

/// Deterministic bundle of RNG streams segregated by simulation domain.
///
/// Draws on one stream never shift another, so adding a mutation roll does not
/// change how a later fight plays out for the same seed.
#[derive(Debug, Clone)]
pub struct RngBundle {
    seed: u64,
    combat: RefCell<CountingRng<SmallRng>>,
    mutation: RefCell<CountingRng<SmallRng>>,
    roster: RefCell<CountingRng<SmallRng>>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            seed,
            combat: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"combat"))),
            mutation: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"mutation"))),
            roster: RefCell::new(CountingRng::new(derive_stream_seed(seed, b"roster"))),
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Access the combat RNG stream.
    #[must_use]
    pub fn combat(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.combat.borrow_mut()
    }

    /// Access the mutation RNG stream.
    #[must_use]
    pub fn mutation(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.mutation.borrow_mut()
    }

    /// Access the roster RNG stream.
    #[must_use]
    pub fn roster(&self) -> RefMut<'_, CountingRng<SmallRng>> {
        self.roster.borrow_mut()
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<SmallRng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: rand::RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: rand::RngCore> rand::RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

/// HMAC-SHA256 domain separation of the user seed.
fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    // HMAC takes keys of any length; the fallback only keeps this total.
    Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()).map_or(user_seed, |mac| {
        let digest = mac.chain_update(domain_tag).finalize().into_bytes();
        let mut seed_bytes = [0_u8; 8];
        seed_bytes.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(seed_bytes)
    })
}
