use std::cell::RefCell;
use std::rc::Rc;

use volante_engine::platform::{HeadlessPlatform, NativeEvent, Platform};
use volante_engine::window::registry;
use volante_engine::{Window, WindowConfig};
use winit::keyboard::KeyCode as NativeKey;

fn open(platform: &Rc<HeadlessPlatform>, title: &str) -> Window {
    let p: Rc<dyn Platform> = platform.clone();
    Window::create(p, &WindowConfig::new(64, 48, title)).unwrap()
}

#[test]
fn registry_tracks_live_windows_across_drop_orders() {
    let orders: [[usize; 3]; 3] = [[0, 1, 2], [2, 1, 0], [1, 0, 2]];

    for order in orders {
        let p = Rc::new(HeadlessPlatform::new());
        let mut windows: Vec<Option<Window>> = (0..3).map(|i| Some(open(&p, &format!("w{i}")))).collect();
        let handles: Vec<_> = windows.iter().flatten().map(|w| w.native_handle()).collect();

        for (dropped, &i) in order.iter().enumerate() {
            windows[i] = None;

            let mut live: Vec<_> = windows.iter().flatten().map(|w| w.native_handle()).collect();
            live.sort();
            assert_eq!(registry::registered_handles(), live, "after dropping {} windows", dropped + 1);
            assert!(!registry::is_registered(handles[i]));
            assert!(!p.is_alive(handles[i]));
        }
        assert!(registry::registered_handles().is_empty());
    }
}

#[test]
fn reused_handle_routes_only_to_the_new_window() {
    let p = Rc::new(HeadlessPlatform::with_handle_reuse());
    let old = open(&p, "old");
    let keep = open(&p, "keep");
    let reused = old.native_handle();

    let old_hits = Rc::new(RefCell::new(0));
    let hits = old_hits.clone();
    old.set_key_callback(move |_, _| *hits.borrow_mut() += 1);
    drop(old);

    let new = open(&p, "new");
    assert_eq!(new.native_handle(), reused);

    let new_hits = Rc::new(RefCell::new(0));
    let hits = new_hits.clone();
    new.set_key_callback(move |_, _| *hits.borrow_mut() += 1);

    p.push_event(NativeEvent::key_press(reused, NativeKey::KeyA));
    new.poll_events();

    assert_eq!(*old_hits.borrow(), 0);
    assert_eq!(*new_hits.borrow(), 1);
    assert_eq!(
        registry::registered_handles(),
        {
            let mut v = vec![keep.native_handle(), new.native_handle()];
            v.sort();
            v
        }
    );
}

#[test]
fn events_for_a_destroyed_window_are_dropped() {
    let p = Rc::new(HeadlessPlatform::new());
    let w = open(&p, "gone");
    let other = open(&p, "other");
    let h = w.native_handle();
    drop(w);

    p.push_event(NativeEvent::key_press(h, NativeKey::KeyA));
    p.push_event(NativeEvent::Resized { handle: h, width: 1, height: 1 });
    other.poll_events();

    assert_eq!(registry::registered_handles(), vec![other.native_handle()]);
}

#[test]
fn callback_may_open_and_close_windows_while_dispatched() {
    let p = Rc::new(HeadlessPlatform::new());
    let host = open(&p, "host");
    let spawned: Rc<RefCell<Vec<Window>>> = Rc::new(RefCell::new(Vec::new()));

    let (platform, sink) = (p.clone(), spawned.clone());
    host.set_key_callback(move |_, _| {
        let mut sink = sink.borrow_mut();
        if sink.is_empty() {
            sink.push(open(&platform, "child"));
        } else {
            sink.clear();
        }
    });

    let h = host.native_handle();
    p.push_event(NativeEvent::key_press(h, NativeKey::KeyN));
    host.poll_events();
    assert_eq!(spawned.borrow().len(), 1);
    assert_eq!(registry::registered_handles().len(), 2);

    p.push_event(NativeEvent::key_release(h, NativeKey::KeyN));
    host.poll_events();
    assert!(spawned.borrow().is_empty());
    assert_eq!(registry::registered_handles(), vec![h]);
}
