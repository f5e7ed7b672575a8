//! Re-entrant lock shared by every registry in one tree.
//!
//! A root registry creates the lock; each child clones the handle instead of
//! allocating its own, so a child write and the forwarded parent write are
//! serialized as a single critical section.

use std::fmt;
use std::sync::Arc;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

/// Guard returned by [`TreeLock::lock`]. Releases the lock on drop.
pub type TreeGuard<'a> = ReentrantMutexGuard<'a, ()>;

/// Handle to the re-entrant mutex guarding a registry tree.
///
/// Cloning yields another handle to the *same* mutex. The owning thread may
/// acquire it any number of times; other threads block until every guard is
/// dropped. No fairness between waiters is guaranteed.
#[derive(Clone, Default)]
pub struct TreeLock {
	inner: Arc<ReentrantMutex<()>>,
}

impl TreeLock {
	/// Creates a lock for a new tree.
	pub fn new() -> Self {
		Self::default()
	}

	/// Acquires the lock, blocking until it is available.
	#[inline]
	pub fn lock(&self) -> TreeGuard<'_> {
		self.inner.lock()
	}

	/// Runs `f` while holding the lock and returns its result.
	///
	/// Registry calls made inside `f` re-enter the lock, so a sequence of
	/// operations on one tree can be made atomic with respect to other threads.
	pub fn perform<R>(&self, f: impl FnOnce() -> R) -> R {
		let _guard = self.lock();
		f()
	}

	/// Returns true if the lock is currently held by any thread.
	pub fn is_locked(&self) -> bool {
		self.inner.is_locked()
	}

	/// Returns true if both handles refer to the same mutex.
	pub fn same_tree(&self, other: &TreeLock) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}
}

impl fmt::Debug for TreeLock {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("TreeLock")
			.field("locked", &self.is_locked())
			.field("handles", &Arc::strong_count(&self.inner))
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use super::*;

	#[test]
	fn test_clone_shares_mutex() {
		let lock = TreeLock::new();
		let handle = lock.clone();
		assert!(lock.same_tree(&handle));
		assert!(!lock.same_tree(&TreeLock::new()));
	}

	#[test]
	fn test_perform_is_reentrant() {
		let lock = TreeLock::new();
		let depth = lock.perform(|| lock.perform(|| lock.perform(|| 3)));
		assert_eq!(depth, 3);
		assert!(!lock.is_locked());
	}

	#[test]
	fn test_perform_excludes_other_threads() {
		let lock = TreeLock::new();
		let inside = AtomicUsize::new(0);

		std::thread::scope(|scope| {
			for _ in 0..4 {
				scope.spawn(|| {
					for _ in 0..200 {
						lock.perform(|| {
							assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
							inside.fetch_sub(1, Ordering::SeqCst);
						});
					}
				});
			}
		});
	}
}
