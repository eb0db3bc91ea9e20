//! embassy-time driver symbols for the device build.
//!
//! `async_io_mini::Timer` (and so [`EdgeSignal::wait`](crate::signal::EdgeSignal::wait))
//! reads the clock and arms wakeups through the embassy-time driver
//! interface.  On ESP-IDF both are backed by `esp_timer`; host builds
//! link embassy-time's `std` driver instead.

#[cfg(target_os = "espidf")]
use core::time::Duration;

/// Stack for the one-shot wake threads; they only sleep and wake.
#[cfg(target_os = "espidf")]
const WAKE_STACK: usize = 2048;

/// Monotonic microseconds since boot.
#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _embassy_time_now() -> u64 {
    // SAFETY: plain getter with no preconditions.
    let us = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
    us.max(0) as u64
}

/// Wake `waker` once the clock reaches `at`.
#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _embassy_time_schedule_wake(at: u64, waker: *mut core::ffi::c_void) {
    if waker.is_null() {
        return;
    }

    // SAFETY: embassy-time passes a pointer to a live `Waker` for the
    // duration of this call; it is cloned before returning.
    let waker = unsafe { (*waker.cast::<core::task::Waker>()).clone() };
    let deadline = at;
    let spawned = std::thread::Builder::new()
        .name("tmr-wake".into())
        .stack_size(WAKE_STACK)
        .spawn({
            let waker = waker.clone();
            move || {
                let now = _embassy_time_now();
                if deadline > now {
                    std::thread::sleep(Duration::from_micros(deadline - now));
                }
                waker.wake();
            }
        });
    if spawned.is_err() {
        // Out of threads: wake now and let the timer re-arm on its next poll.
        log::warn!("time: wake thread spawn failed, waking early");
        waker.wake();
    }
}
