use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Flow sensor pulse counter
///
/// Incremented from the GPIO interrupt thread, read by the control loop.
#[derive(Clone, Debug, Default)]
pub struct FlowCounter(Arc<AtomicU64>);

impl FlowCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one pulse (falling edge)
    pub fn pulse(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    /// Total pulses since startup
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::FlowCounter;

    #[test]
    fn pulses_from_another_thread() {
        let counter = FlowCounter::new();
        let isr = counter.clone();

        thread::spawn(move || {
            for _ in 0..50 {
                isr.pulse();
            }
        })
        .join()
        .unwrap();

        assert_eq!(counter.get(), 50, "Testing 50 pulses");
    }
}
