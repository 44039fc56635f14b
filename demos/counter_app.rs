//! Counter application: three independent components share one counter.
//!
//! Run with `RUST_LOG=trace` to watch every broadcast.

use partyline::{bind, Effect, SetShared, SharedState};

#[derive(Clone, Debug)]
struct CounterState {
    count: i32,
    step: i32,
}

/// Shows the current count and re-renders whenever it changes.
struct Display {
    _state: SharedState<CounterState>,
    _render: Effect,
}

impl Display {
    fn mount() -> Self {
        let (state, _) = bind("counter", CounterState { count: 0, step: 1 })
            .expect("`counter` is always bound as CounterState");
        let render = Effect::new({
            let state = state.clone();
            move || {
                state.with(|s| println!("   [Display] count = {} (step {})", s.count, s.step));
            }
        });
        Self {
            _state: state,
            _render: render,
        }
    }
}

/// Buttons that change the counter without reading it for display.
struct Controls {
    _state: SharedState<CounterState>,
    set: SetShared<CounterState>,
}

impl Controls {
    fn mount() -> Self {
        let (state, set) = bind("counter", CounterState { count: 0, step: 1 })
            .expect("`counter` is always bound as CounterState");
        Self { _state: state, set }
    }

    fn increment(&self) {
        self.set.update(|s| CounterState {
            count: s.count + s.step,
            ..s.clone()
        });
    }

    fn decrement(&self) {
        self.set.update(|s| CounterState {
            count: s.count - s.step,
            ..s.clone()
        });
    }

    fn set_step(&self, step: i32) {
        self.set.update(|s| CounterState { step, ..s.clone() });
    }

    fn reset(&self) {
        self.set.set(CounterState { count: 0, step: 1 });
    }
}

/// Records every count it is told about.
struct History {
    state: SharedState<CounterState>,
    entries: std::sync::Arc<std::sync::Mutex<Vec<i32>>>,
    _render: Effect,
}

impl History {
    fn mount() -> Self {
        let (state, _) = bind("counter", CounterState { count: 0, step: 1 })
            .expect("`counter` is always bound as CounterState");
        let entries = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let render = Effect::new({
            let state = state.clone();
            let entries = entries.clone();
            move || {
                let count = state.with(|s| s.count);
                entries.lock().unwrap().push(count);
            }
        });
        Self {
            state,
            entries,
            _render: render,
        }
    }
}

fn main() {
    env_logger::init();

    println!("=== Counter Application ===\n");

    println!("1. Mounting components");
    let display = Display::mount();
    let controls = Controls::mount();
    let history = History::mount();

    println!("\n2. Incrementing...");
    controls.increment();
    controls.increment();

    println!("\n3. Changing step size to 5");
    controls.set_step(5);

    println!("\n4. Incrementing with new step...");
    controls.increment();

    println!("\n5. Decrementing...");
    controls.decrement();
    controls.decrement();

    println!("\n6. Unmounting the display");
    drop(display);
    controls.increment();

    println!("\n7. History: {:?}", history.entries.lock().unwrap());
    println!("   History sees count = {}", history.state.get().count);

    println!("\n8. Resetting...");
    controls.reset();
    println!("   History sees count = {}", history.state.get().count);

    println!("\n✓ Counter application complete!");
}
