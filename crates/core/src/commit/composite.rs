//! Composite hook state (`spec.md` §4.5, §9).
//!
//! Hook storage is type-erased (`Box<dyn Any>`) the way the source
//! language's dynamically-typed hook slots are, downcast back to a concrete
//! type at each call site — the arena-of-`Any` pattern is the idiomatic
//! Rust analogue of "hook state (state, ref, effect, memo, callback) plus
//! generation numbers map to a per-instance hook-slot vector" from §9.

use std::any::Any;
use std::cell::{Cell, RefCell};

use crate::instance::InstanceId;
use crate::vnode::Key;

pub struct HookSlot {
    value: Box<dyn Any>,
}

/// An effect registered during one render. Its cleanup (if any) must run
/// strictly before the next turn's effects for this instance (`spec.md`
/// §9).
pub struct PendingEffect {
    pub deps_hash: u64,
    pub run: Box<dyn FnOnce() -> Option<Box<dyn FnOnce()>>>,
}

/// Per-instance composite bookkeeping: hook slots, the last set of pending
/// effect cleanups, and the generation counter bumped whenever the widget
/// key changes (invalidating all stale closures/hook state).
pub struct CompositeState {
    pub widget_key: Key,
    pub generation: u64,
    hooks: RefCell<Vec<HookSlot>>,
    effect_deps: RefCell<Vec<u64>>,
    pending_cleanups: RefCell<Vec<Box<dyn FnOnce()>>>,
    pending_effects: RefCell<Vec<PendingEffect>>,
}

impl CompositeState {
    pub fn new(widget_key: Key) -> Self {
        Self {
            widget_key,
            generation: 0,
            hooks: RefCell::new(Vec::new()),
            effect_deps: RefCell::new(Vec::new()),
            pending_cleanups: RefCell::new(Vec::new()),
            pending_effects: RefCell::new(Vec::new()),
        }
    }

    /// Bumps the generation and drops all hook state, per step 1 of the
    /// composite commit algorithm: "If the instance's stored widget-key
    /// differs from the VNode's, bump the instance's generation... and drop
    /// its hook state."
    pub fn invalidate(&mut self, new_widget_key: Key) {
        self.widget_key = new_widget_key;
        self.generation += 1;
        self.hooks.get_mut().clear();
        self.effect_deps.get_mut().clear();
    }

    /// Runs any cleanup closures left over from the previous render before
    /// this render's effects execute.
    pub fn run_pending_cleanups(&self) {
        let cleanups: Vec<_> = self.pending_cleanups.borrow_mut().drain(..).collect();
        for cleanup in cleanups {
            cleanup();
        }
    }

    pub(crate) fn hooks_cell(&self) -> &RefCell<Vec<HookSlot>> {
        &self.hooks
    }

    pub(crate) fn pending_effects_cell(&self) -> &RefCell<Vec<PendingEffect>> {
        &self.pending_effects
    }

    /// Runs the effects registered by the render call just completed,
    /// skipping any whose `deps_hash` is unchanged from last time. Cleanups
    /// returned by effects that did run are queued for the next call to
    /// [`CompositeState::run_pending_cleanups`].
    ///
    /// Simplification: effects run synchronously here, right after render,
    /// rather than deferred to a post-paint phase.
    pub fn commit_effects(&self) {
        let effects: Vec<PendingEffect> = self.pending_effects.borrow_mut().drain(..).collect();
        let mut deps = self.effect_deps.borrow_mut();
        let mut cleanups = self.pending_cleanups.borrow_mut();
        for (i, effect) in effects.into_iter().enumerate() {
            let changed = deps.get(i).map(|prev| *prev != effect.deps_hash).unwrap_or(true);
            if changed {
                if let Some(cleanup) = (effect.run)() {
                    cleanups.push(cleanup);
                }
            }
            if i < deps.len() {
                deps[i] = effect.deps_hash;
            } else {
                deps.push(effect.deps_hash);
            }
        }
    }
}

/// Handed to a composite's `render(ctx)` function. `state` is a type-erased
/// view of the application's committed state; composites recover their
/// slice of it via [`CompositeCtx::select`].
pub struct CompositeCtx<'a> {
    pub instance_id: InstanceId,
    state: &'a dyn Any,
    hooks: &'a RefCell<Vec<HookSlot>>,
    cursor: Cell<usize>,
    pending_effects: &'a RefCell<Vec<PendingEffect>>,
}

impl<'a> CompositeCtx<'a> {
    pub(crate) fn new(
        instance_id: InstanceId,
        state: &'a dyn Any,
        hooks: &'a RefCell<Vec<HookSlot>>,
        pending_effects: &'a RefCell<Vec<PendingEffect>>,
    ) -> Self {
        Self {
            instance_id,
            state,
            hooks,
            cursor: Cell::new(0),
            pending_effects,
        }
    }

    /// Recovers a typed view of the committed application state.
    pub fn select<T: Clone + 'static>(&self, f: impl FnOnce(&dyn Any) -> T) -> T {
        f(self.state)
    }

    /// Hook-slot-backed local state, keyed by call order within this
    /// composite (the conventional hook-ordering discipline: call
    /// unconditionally, in the same order, every render).
    pub fn use_state<T: Clone + 'static>(&self, init: impl FnOnce() -> T) -> T {
        let idx = self.cursor.get();
        self.cursor.set(idx + 1);
        let mut hooks = self.hooks.borrow_mut();
        if idx >= hooks.len() {
            hooks.push(HookSlot {
                value: Box::new(init()),
            });
        }
        hooks[idx]
            .value
            .downcast_ref::<T>()
            .cloned()
            .expect("hook type mismatch: hooks must be called in the same order every render")
    }

    /// Registers an effect to run after commit. If `deps_hash` matches the
    /// previous render's hash for this call-site slot, the effect is
    /// skipped (its prior cleanup, if any, is left running).
    pub fn use_effect(
        &self,
        deps_hash: u64,
        effect: impl FnOnce() -> Option<Box<dyn FnOnce()>> + 'static,
    ) {
        self.pending_effects.borrow_mut().push(PendingEffect {
            deps_hash,
            run: Box::new(effect),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalidate_bumps_generation_and_clears_hooks() {
        let mut state = CompositeState::new("a".to_string());
        state.hooks.get_mut().push(HookSlot { value: Box::new(1i32) });
        state.invalidate("b".to_string());
        assert_eq!(state.generation, 1);
        assert_eq!(state.widget_key, "b");
        assert!(state.hooks.borrow().is_empty());
    }

    #[test]
    fn use_state_persists_across_calls_at_same_slot() {
        let hooks = RefCell::new(Vec::new());
        let effects = RefCell::new(Vec::new());
        let app_state: i32 = 0;
        let ctx = CompositeCtx::new(InstanceId(1), &app_state, &hooks, &effects);
        let first = ctx.use_state(|| 42i32);
        assert_eq!(first, 42);

        let ctx2 = CompositeCtx::new(InstanceId(1), &app_state, &hooks, &effects);
        let second = ctx2.use_state(|| 0i32);
        assert_eq!(second, 42, "second render reuses the first render's stored value");
    }
}
