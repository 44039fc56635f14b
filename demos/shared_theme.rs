//! A typed channel shared by components that mount and unmount over time.

use partyline::runtime::{Config, Reconcile, Runtime};
use partyline::{Channel, Effect};
use std::sync::LazyLock;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Theme {
    Light,
    Dark,
}

static THEME: LazyLock<Channel<Theme>> =
    LazyLock::new(|| Channel::new("theme", Theme::Light).expect("key is not empty"));

fn mount_panel(name: &'static str) -> Effect {
    let (theme, _) = THEME.bind().expect("`theme` is only bound through THEME");
    Effect::new(move || println!("   [{name}] rendered with {:?}", theme.get()))
}

fn run(label: &str) {
    println!("\n--- {label} ---");

    let (_toggle_state, set_theme) = THEME.bind().expect("`theme` is only bound through THEME");
    let sidebar = mount_panel("sidebar");
    let editor = mount_panel("editor");

    println!("Switching to dark");
    set_theme.set(Theme::Dark);

    println!("Unmounting the editor");
    drop(editor);

    println!("Remounting the editor");
    let _editor = mount_panel("editor");

    println!("Toggling back");
    set_theme.update(|t| match t {
        Theme::Light => Theme::Dark,
        Theme::Dark => Theme::Light,
    });
    drop(sidebar);
}

fn main() {
    env_logger::init();

    println!("=== Shared Theme ===");

    // A remounted editor shows its own initial value until the next write.
    Runtime::scope(|| run("keep initial value on remount"));

    // A remounted editor picks up the latest broadcast immediately.
    Runtime::scope_with(Config::new().reconcile(Reconcile::LatestBroadcast), || {
        run("adopt latest broadcast on remount")
    });
}
