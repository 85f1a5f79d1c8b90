//! Ambient "who is acting" for code paths that cannot take it as a
//! parameter, such as a generic save hook.
//!
//! Values are thread-local. Every activation returns or runs under a
//! guard that restores the previous value on drop, so nesting shadows the
//! outer value and a panic inside the scope still clears it.

use std::cell::{Cell, RefCell};
use std::marker::PhantomData;
use std::thread::LocalKey;

use crate::core::models::reference::Party;

thread_local! {
    static ACTOR: RefCell<Option<Party>> = const { RefCell::new(None) };
    static TENANT: RefCell<Option<Party>> = const { RefCell::new(None) };
    static SUPPRESSED: Cell<bool> = const { Cell::new(false) };
}

type Slot = &'static LocalKey<RefCell<Option<Party>>>;

/// Restores the previous ambient party when dropped.
///
/// Not `Send`: the guard must be dropped on the thread that created it.
#[must_use = "the ambient value is cleared as soon as the guard is dropped"]
pub struct ScopeGuard {
    slot: Slot,
    previous: Option<Party>,
    _thread_bound: PhantomData<*const ()>,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        self.slot.with(|cell| *cell.borrow_mut() = previous);
    }
}

fn enter(slot: Slot, party: Party) -> ScopeGuard {
    let previous = slot.with(|cell| cell.replace(Some(party)));
    ScopeGuard {
        slot,
        previous,
        _thread_bound: PhantomData,
    }
}

/// Activate `actor` until the returned guard is dropped.
pub fn enter_actor(actor: Party) -> ScopeGuard {
    enter(&ACTOR, actor)
}

/// Activate `tenant` until the returned guard is dropped.
pub fn enter_tenant(tenant: Party) -> ScopeGuard {
    enter(&TENANT, tenant)
}

/// Run `f` with `actor` as the ambient actor on this thread.
pub fn with_actor<R>(actor: Party, f: impl FnOnce() -> R) -> R {
    let _guard = enter_actor(actor);
    f()
}

/// Run `f` with `tenant` as the ambient tenant on this thread.
pub fn with_tenant<R>(tenant: Party, f: impl FnOnce() -> R) -> R {
    let _guard = enter_tenant(tenant);
    f()
}

pub fn current_actor() -> Option<Party> {
    ACTOR.with(|cell| cell.borrow().clone())
}

pub fn current_tenant() -> Option<Party> {
    TENANT.with(|cell| cell.borrow().clone())
}

struct SuppressGuard {
    previous: bool,
}

impl Drop for SuppressGuard {
    fn drop(&mut self) {
        SUPPRESSED.with(|flag| flag.set(self.previous));
    }
}

/// Run `f` with auditing switched off on this thread.
pub fn without_auditing<R>(f: impl FnOnce() -> R) -> R {
    let _guard = SuppressGuard {
        previous: SUPPRESSED.with(|flag| flag.replace(true)),
    };
    f()
}

pub fn auditing_suppressed() -> bool {
    SUPPRESSED.with(Cell::get)
}
