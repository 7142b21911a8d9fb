use std::time::{Duration, Instant};

pub use std::thread::sleep;

/// Busy-wait for `micros` microseconds
///
/// [sleep] cannot hold the sub-millisecond timing that RF pulses need, so the thread spins instead.
pub fn delay_us(micros: u64) {
    let deadline = Instant::now() + Duration::from_micros(micros);
    while Instant::now() < deadline {
        std::hint::spin_loop();
    }
}
