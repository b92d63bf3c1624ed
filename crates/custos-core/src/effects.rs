//! Injectable effects for deterministic testing
//!
//! This module provides abstractions for side effects (time, randomness) that
//! can be swapped between real implementations and test implementations.
//!
//! This enables:
//! - Deterministic tests (same inputs → same outputs)
//! - Reproducible grant-expiry scenarios (advance simulated time)
//! - Seed-based reproduction of nonces and identifiers

use crate::error::{CoreError, Result};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

// ========== Time Source Abstraction ==========

/// Abstract time source - can be real system time or simulated time
pub trait TimeSource: Send + Sync {
    /// Get current Unix timestamp in seconds
    fn current_timestamp(&self) -> Result<u64>;

    /// Advance time by N seconds (no-op for real time, used in tests)
    fn advance(&self, _seconds: u64) -> Result<()> {
        Ok(())
    }

    /// Check if this is a simulated time source
    fn is_simulated(&self) -> bool {
        false
    }
}

/// Real system time source (production use)
#[derive(Debug, Clone, Default)]
pub struct SystemTimeSource;

impl SystemTimeSource {
    /// Create a new system time source
    pub fn new() -> Self {
        SystemTimeSource
    }
}

impl TimeSource for SystemTimeSource {
    fn current_timestamp(&self) -> Result<u64> {
        #[allow(clippy::disallowed_methods)]
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .map_err(|e| CoreError::time(format!("System time is before UNIX epoch: {e}")))
    }
}

/// Simulated time source (for testing grant expiry deterministically)
///
/// Allows manual control of time progression.
#[derive(Debug, Clone)]
pub struct SimulatedTimeSource {
    current_time: Arc<Mutex<u64>>,
}

impl SimulatedTimeSource {
    /// Create a new simulated time source starting at the given timestamp
    pub fn new(initial_timestamp: u64) -> Self {
        SimulatedTimeSource {
            current_time: Arc::new(Mutex::new(initial_timestamp)),
        }
    }

    /// Create starting at a recent time (for more realistic tests)
    pub fn from_recent() -> Self {
        // 2025-01-01 00:00:00 UTC
        Self::new(1735689600)
    }
}

impl TimeSource for SimulatedTimeSource {
    fn current_timestamp(&self) -> Result<u64> {
        let time = self
            .current_time
            .lock()
            .map_err(|e| CoreError::time(format!("Lock poisoned: {e}")))?;
        Ok(*time)
    }

    fn advance(&self, seconds: u64) -> Result<()> {
        let mut time = self
            .current_time
            .lock()
            .map_err(|e| CoreError::time(format!("Lock poisoned: {e}")))?;
        *time = time.saturating_add(seconds);
        Ok(())
    }

    fn is_simulated(&self) -> bool {
        true
    }
}

// ========== Random Source Abstraction ==========

/// Abstract randomness source - can be OS CSPRNG or seeded deterministic RNG
pub trait RandomSource: Send + Sync {
    /// Fill a byte buffer with random data
    fn fill_bytes(&self, dest: &mut [u8]);

    /// Generate a UUID (v4 in production, seed-derived in tests)
    fn gen_uuid(&self) -> Uuid;
}

/// OS-backed CSPRNG source (production use)
#[derive(Debug, Clone, Default)]
pub struct OsRandomSource;

impl OsRandomSource {
    /// Create a new OS randomness source
    pub fn new() -> Self {
        OsRandomSource
    }
}

impl RandomSource for OsRandomSource {
    fn fill_bytes(&self, dest: &mut [u8]) {
        #[allow(clippy::disallowed_types)]
        rand::rngs::OsRng.fill_bytes(dest);
    }

    fn gen_uuid(&self) -> Uuid {
        let mut bytes = [0u8; 16];
        self.fill_bytes(&mut bytes);
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }
}

/// Seeded deterministic randomness source (testing use)
#[derive(Debug, Clone)]
pub struct SeededRandomSource {
    rng: Arc<Mutex<StdRng>>,
}

impl SeededRandomSource {
    /// Create a new seeded randomness source
    pub fn new(seed: u64) -> Self {
        SeededRandomSource {
            rng: Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }
}

impl RandomSource for SeededRandomSource {
    fn fill_bytes(&self, dest: &mut [u8]) {
        // A poisoned lock degrades to zeroes instead of panicking
        if let Ok(mut rng) = self.rng.lock() {
            rng.fill_bytes(dest);
        } else {
            dest.fill(0);
        }
    }

    fn gen_uuid(&self) -> Uuid {
        let mut bytes = [0u8; 16];
        self.fill_bytes(&mut bytes);
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }
}

// ========== Effects Container ==========

/// Injectable effects bundle used by all higher layers.
///
/// Production code constructs [`Effects::system`] once at startup; tests use
/// [`Effects::test`] or [`Effects::deterministic`] for reproducible runs.
#[derive(Clone)]
pub struct Effects {
    time: Arc<dyn TimeSource>,
    random: Arc<dyn RandomSource>,
}

impl Effects {
    /// Production effects: system clock and OS CSPRNG
    pub fn system() -> Self {
        Effects {
            time: Arc::new(SystemTimeSource::new()),
            random: Arc::new(OsRandomSource::new()),
        }
    }

    /// Test effects: fixed seed, simulated clock starting at a recent time
    pub fn test() -> Self {
        Self::deterministic(42, 1735689600)
    }

    /// Deterministic effects with an explicit seed and start time
    pub fn deterministic(seed: u64, start_time: u64) -> Self {
        Effects {
            time: Arc::new(SimulatedTimeSource::new(start_time)),
            random: Arc::new(SeededRandomSource::new(seed)),
        }
    }

    /// Build effects from explicit sources
    pub fn with_sources(time: Arc<dyn TimeSource>, random: Arc<dyn RandomSource>) -> Self {
        Effects { time, random }
    }

    /// Current Unix timestamp in seconds
    pub fn now(&self) -> Result<u64> {
        self.time.current_timestamp()
    }

    /// Advance simulated time (no-op on the system clock)
    pub fn advance_time(&self, seconds: u64) -> Result<()> {
        self.time.advance(seconds)
    }

    /// Whether the time source is simulated
    pub fn is_simulated(&self) -> bool {
        self.time.is_simulated()
    }

    /// Fill a buffer with random bytes
    pub fn fill_bytes(&self, dest: &mut [u8]) {
        self.random.fill_bytes(dest);
    }

    /// Produce a fixed-width random byte array
    pub fn random_bytes<const N: usize>(&self) -> [u8; N] {
        let mut bytes = [0u8; N];
        self.random.fill_bytes(&mut bytes);
        bytes
    }

    /// Generate a UUID
    pub fn gen_uuid(&self) -> Uuid {
        self.random.gen_uuid()
    }
}

impl std::fmt::Debug for Effects {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effects")
            .field("simulated_time", &self.time.is_simulated())
            .finish()
    }
}
