//! Timer scheduling and trailing-edge debouncing.
//!
//! A [`Debounced`] owns a single pending-timer slot. Each call clears the
//! pending timer (if any) and schedules a new one carrying the latest
//! argument, so only the last call of a burst reaches the target.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::Closure;

/// One-shot timers plus a wall clock.
pub trait Scheduler: Clone + 'static {
	type Handle;

	/// Run `task` once after `delay`.
	fn set_timeout(&self, delay: Duration, task: Box<dyn FnOnce()>) -> Self::Handle;

	/// Cancel a timer that has not fired yet.
	fn clear_timeout(&self, handle: Self::Handle);

	/// Milliseconds since the Unix epoch.
	fn now_ms(&self) -> u64;
}

struct Slot<T, S: Scheduler> {
	scheduler: S,
	delay: Duration,
	pending: RefCell<Option<S::Handle>>,
	target: Box<dyn Fn(T)>,
}

/// Trailing-edge debounce around a callback.
pub struct Debounced<T, S: Scheduler> {
	slot: Rc<Slot<T, S>>,
}

impl<T, S: Scheduler> Clone for Debounced<T, S> {
	fn clone(&self) -> Self {
		Self {
			slot: self.slot.clone(),
		}
	}
}

impl<T: 'static, S: Scheduler> Debounced<T, S> {
	/// Wrap `target` so it only sees the last call of each `delay` window.
	pub fn new(scheduler: S, delay: Duration, target: impl Fn(T) + 'static) -> Self {
		Self {
			slot: Rc::new(Slot {
				scheduler,
				delay,
				pending: RefCell::new(None),
				target: Box::new(target),
			}),
		}
	}

	/// Schedule `arg` for delivery, superseding any call still pending.
	pub fn call(&self, arg: T) {
		if let Some(handle) = self.slot.pending.borrow_mut().take() {
			self.slot.scheduler.clear_timeout(handle);
		}
		let weak = Rc::downgrade(&self.slot);
		let handle = self.slot.scheduler.set_timeout(
			self.slot.delay,
			Box::new(move || {
				if let Some(slot) = weak.upgrade() {
					slot.pending.borrow_mut().take();
					(slot.target)(arg);
				}
			}),
		);
		*self.slot.pending.borrow_mut() = Some(handle);
	}

	/// Whether a call is waiting for its window to close.
	pub fn is_pending(&self) -> bool {
		self.slot.pending.borrow().is_some()
	}
}

/// Timers backed by `window.setTimeout`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserScheduler;

impl Scheduler for BrowserScheduler {
	type Handle = i32;

	fn set_timeout(&self, delay: Duration, task: Box<dyn FnOnce()>) -> i32 {
		let Some(window) = web_sys::window() else {
			log::warn!("link-graph: no window, dropping timer");
			return 0;
		};
		let callback = Closure::once_into_js(move || task());
		let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
		match window.set_timeout_with_callback_and_timeout_and_arguments_0(
			callback.unchecked_ref(),
			millis,
		) {
			Ok(handle) => handle,
			Err(e) => {
				log::warn!("link-graph: setTimeout failed: {:?}", e);
				0
			}
		}
	}

	fn clear_timeout(&self, handle: i32) {
		if let Some(window) = web_sys::window() {
			window.clear_timeout_with_handle(handle);
		}
	}

	fn now_ms(&self) -> u64 {
		js_sys::Date::now() as u64
	}
}

/// Identifies a timer on a [`ManualScheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimerId {
	deadline: Duration,
	seq: u64,
}

#[derive(Default)]
struct ManualClock {
	now: Duration,
	epoch_ms: u64,
	seq: u64,
	timers: BTreeMap<TimerId, Box<dyn FnOnce()>>,
}

/// A virtual clock for headless hosts and tests. Time only moves when
/// [`advance`](Self::advance) is called; due timers then run in deadline order.
#[derive(Clone, Default)]
pub struct ManualScheduler {
	clock: Rc<RefCell<ManualClock>>,
}

impl ManualScheduler {
	/// A clock whose wall time starts at `epoch_ms`.
	pub fn starting_at(epoch_ms: u64) -> Self {
		let scheduler = Self::default();
		scheduler.clock.borrow_mut().epoch_ms = epoch_ms;
		scheduler
	}

	/// Time elapsed since the scheduler was created.
	pub fn elapsed(&self) -> Duration {
		self.clock.borrow().now
	}

	/// Number of timers not yet fired.
	pub fn pending(&self) -> usize {
		self.clock.borrow().timers.len()
	}

	/// Move time forward by `by`, running every timer that comes due. Timers
	/// scheduled by a running task fire in the same call if they fall inside
	/// the window.
	pub fn advance(&self, by: Duration) {
		let until = self.clock.borrow().now + by;
		loop {
			let due = {
				let mut clock = self.clock.borrow_mut();
				let next = clock
					.timers
					.first_key_value()
					.map(|(id, _)| *id)
					.filter(|id| id.deadline <= until);
				next.and_then(|id| {
					clock.now = clock.now.max(id.deadline);
					clock.timers.remove(&id)
				})
			};
			match due {
				Some(task) => task(),
				None => break,
			}
		}
		self.clock.borrow_mut().now = until;
	}
}

impl Scheduler for ManualScheduler {
	type Handle = TimerId;

	fn set_timeout(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerId {
		let mut clock = self.clock.borrow_mut();
		let seq = clock.seq;
		clock.seq += 1;
		let id = TimerId {
			deadline: clock.now + delay,
			seq,
		};
		clock.timers.insert(id, task);
		id
	}

	fn clear_timeout(&self, handle: TimerId) {
		self.clock.borrow_mut().timers.remove(&handle);
	}

	fn now_ms(&self) -> u64 {
		let clock = self.clock.borrow();
		clock.epoch_ms + clock.now.as_millis() as u64
	}
}
