//! Gradual rollout helper for premium-endpoint canarying (§4.1 step 2).

use rand::Rng;

/// Deterministic core of the rollout decision: given a random draw in
/// `[0, 1)` and a `premium_percentage` in `0..=100`, should this request
/// keep premium candidates? Factored out from [`should_use_premium`] so the
/// probability math is covered by tests without stubbing the RNG.
pub fn fraction_to_premium(draw: f64, premium_percentage: u8) -> bool {
    draw < (premium_percentage as f64 / 100.0)
}

/// True if this request should be allowed to try premium endpoints, given
/// gradual rollout is enabled at `premium_percentage` percent.
pub fn should_use_premium(premium_enabled: bool, premium_percentage: u8) -> bool {
    if !premium_enabled {
        return false;
    }
    let draw: f64 = rand::thread_rng().gen_range(0.0..1.0);
    fraction_to_premium(draw, premium_percentage)
}
