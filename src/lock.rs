//! Per-entity reader/writer locking with a fail-fast self-deadlock check.
//!
//! Mutable entities ([`crate::model::News`], [`crate::model::Feed`]) are
//! shared between the fetch/merge workers and the UI thread. Each entity is
//! wrapped in an [`EntityLock`] that allows many concurrent readers or one
//! exclusive writer.
//!
//! # The resolving read lock
//!
//! Code that resolves lazily-loaded sub-entities while iterating takes the
//! *resolving* read variant, which records the holder's thread identity. If
//! that same thread then asks for the write lock on the same entity, the
//! acquisition fails immediately with [`LockError::ResolvingReadHeld`]
//! instead of blocking forever. The failure is a programming error to fix,
//! not a condition to retry.
//!
//! Ordinary [`EntityLock::read`] acquisition carries no such check.
//!
//! # Lock Ordering Convention
//!
//! A merge that reads a source entity and writes a target entity must acquire
//! the source read lock first, then the target write lock, and release in
//! reverse order. Two cross-merges acquiring in opposite orders can deadlock;
//! the engine in [`crate::merge`] follows this convention throughout.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

/// Process-wide counter backing the per-thread tokens. Token 0 means
/// "no holder" in the resolving-reader slot.
static NEXT_THREAD_TOKEN: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_TOKEN: u64 = NEXT_THREAD_TOKEN.fetch_add(1, Ordering::Relaxed);
}

fn current_thread_token() -> u64 {
    THREAD_TOKEN.with(|t| *t)
}

/// Errors raised by lock acquisition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LockError {
    /// The calling thread already holds this entity's resolving read lock.
    /// Blocking here would deadlock the thread against itself.
    #[error("write lock requested by the thread holding this entity's resolving read lock")]
    ResolvingReadHeld,
}

/// Reader/writer lock bound to one mutable entity.
///
/// Never serialized; the lock lives and dies with the in-memory entity.
#[derive(Debug, Default)]
pub struct EntityLock<T> {
    inner: RwLock<T>,
    /// Thread token of the current resolving reader, 0 if none. Single
    /// holder: a second thread's resolving read degrades to an ordinary
    /// (unrecorded) shared read.
    resolving_reader: AtomicU64,
}

impl<T> EntityLock<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: RwLock::new(value),
            resolving_reader: AtomicU64::new(0),
        }
    }

    /// Acquires a shared read lock, blocking while a writer is active.
    pub fn read(&self) -> ReadGuard<'_, T> {
        ReadGuard {
            guard: self.inner.read(),
        }
    }

    /// Acquires a shared read lock and records this thread as the resolving
    /// reader.
    ///
    /// Use this variant while resolving sub-entities mid-iteration, where an
    /// accidental write-lock request on the same entity is a real hazard.
    /// The recording is best-effort single-slot: if another thread already
    /// holds the slot, the returned guard still provides shared access but
    /// does not participate in the deadlock check.
    pub fn read_resolving(&self) -> ResolvingReadGuard<'_, T> {
        let guard = self.inner.read();
        let token = current_thread_token();
        let owns_slot = self
            .resolving_reader
            .compare_exchange(0, token, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        ResolvingReadGuard {
            lock: self,
            guard,
            owns_slot,
        }
    }

    /// Acquires the exclusive write lock.
    ///
    /// Fails fast with [`LockError::ResolvingReadHeld`] when the calling
    /// thread is the recorded resolving reader of this entity; blocking in
    /// that situation could never make progress.
    pub fn write(&self) -> Result<WriteGuard<'_, T>, LockError> {
        if self.resolving_reader.load(Ordering::Acquire) == current_thread_token() {
            tracing::error!("write lock requested while holding the resolving read lock");
            return Err(LockError::ResolvingReadHeld);
        }
        Ok(WriteGuard {
            guard: self.inner.write(),
        })
    }

    /// Consumes the lock, returning the entity.
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

/// RAII guard for ordinary shared access.
pub struct ReadGuard<'a, T> {
    guard: RwLockReadGuard<'a, T>,
}

impl<T> std::ops::Deref for ReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

/// RAII guard for shared access with resolving-reader bookkeeping.
///
/// Dropping the guard clears the resolving-reader slot, but only if this
/// guard was the one that set it (nested same-thread guards leave the
/// outermost recording in place).
pub struct ResolvingReadGuard<'a, T> {
    lock: &'a EntityLock<T>,
    guard: RwLockReadGuard<'a, T>,
    owns_slot: bool,
}

impl<T> std::ops::Deref for ResolvingReadGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> Drop for ResolvingReadGuard<'_, T> {
    fn drop(&mut self) {
        if self.owns_slot {
            self.lock.resolving_reader.store(0, Ordering::Release);
        }
    }
}

/// RAII guard for exclusive access.
#[derive(Debug)]
pub struct WriteGuard<'a, T> {
    guard: RwLockWriteGuard<'a, T>,
}

impl<T> std::ops::Deref for WriteGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> std::ops::DerefMut for WriteGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}
