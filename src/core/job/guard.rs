use std::sync::atomic::{AtomicBool, Ordering};

/// Single-flight flag shared by every trigger of the article job.
#[derive(Debug, Default)]
pub struct RunGuard {
    running: AtomicBool,
}

/// Held for the duration of one run. Dropping it clears the flag, whatever the exit path.
#[derive(Debug)]
pub struct RunPermit<'a> {
    guard: &'a RunGuard,
}

impl RunGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claims the flag. `None` means another run is in flight.
    pub fn try_acquire(&self) -> Option<RunPermit<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunPermit { guard: self })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn release(&self) {
        self.running.store(false, Ordering::Release);
    }
}

impl Drop for RunPermit<'_> {
    fn drop(&mut self) {
        self.guard.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn second_acquire_fails_while_first_permit_is_alive() {
        let guard = RunGuard::new();
        let permit = guard.try_acquire();
        assert!(permit.is_some());
        assert!(guard.is_running());
        assert!(guard.try_acquire().is_none());

        drop(permit);
        assert!(!guard.is_running());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn permit_is_released_when_the_holder_panics() {
        let guard = Arc::new(RunGuard::new());
        let g = guard.clone();
        let result = std::thread::spawn::<_, ()>(move || {
            let _permit = g.try_acquire().expect("free");
            panic!("cycle blew up");
        })
        .join();

        assert!(result.is_err());
        assert!(!guard.is_running());
    }

    #[test]
    fn only_one_thread_wins_a_race() {
        let guard = Arc::new(RunGuard::new());
        let barrier = Arc::new(std::sync::Barrier::new(8));
        let winners: Vec<_> = (0..8)
            .map(|_| {
                let guard = guard.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    // Leak the permit so late threads cannot win after an early release.
                    guard.try_acquire().map(std::mem::forget).is_some()
                })
            })
            .collect();

        let won = winners
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|w| *w)
            .count();
        assert_eq!(won, 1);
    }
}
