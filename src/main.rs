//! Headless layout demo.
//!
//! Lays items out on a grid over an in-memory surface, then hides, reveals,
//! reflows and removes some of them while a tween backend runs the
//! transitions frame by frame.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Result, bail};
use outlay_config::{DemoConfig, OutlayConfig};
use outlay_item::{
    ElementSize, Item, ItemContext, ItemEvent, LayoutSize, Listen, SceneSurface, SharedBackend,
    SharedLayout, SharedSurface, StyleApplier, Surface, TweenBackend,
};
use tracing::{debug, info};

fn main() -> Result<()> {
    let _ = env_logger::try_init();

    let config = OutlayConfig::load();
    let options = config.layout.to_options()?;
    let demo = config.demo;
    if demo.columns == 0 {
        bail!("demo.columns must be at least 1");
    }
    info!(
        items = demo.items,
        columns = demo.columns,
        duration = ?options.transition_duration(),
        "starting layout demo"
    );

    let layout = Rc::new(SharedLayout::new(options, LayoutSize::uniform(demo.padding)));
    let surface = Rc::new(RefCell::new(SceneSurface::new()));
    let shared_surface: SharedSurface = surface.clone();
    let tweens = TweenBackend::new(shared_surface.clone());
    let shared_backend: SharedBackend = Rc::new(tweens.clone());
    let context = ItemContext::new(&layout, shared_surface, shared_backend);

    let items: Vec<Item> = (0..demo.items)
        .map(|_| {
            let element = surface
                .borrow_mut()
                .insert(ElementSize::new(demo.cell - 20.0, demo.cell - 20.0).with_margin(10.0));
            let item = Item::new(element, &context);
            watch(&item);
            item
        })
        .collect();

    arrange(&items, &demo, demo.columns);
    let completed = tweens.settle(demo.frame_ms);
    info!(completed, "initial layout settled");

    for item in items.iter().skip(1).step_by(2) {
        item.hide();
    }
    // Reveal the first hidden item before its hide finishes.
    tweens.tick(demo.frame_ms);
    if let Some(item) = items.get(1) {
        item.reveal();
    }
    tweens.settle(demo.frame_ms);

    let columns = (demo.columns - 1).max(1);
    arrange(&items, &demo, columns);
    tweens.settle(demo.frame_ms);
    info!(columns, "reflowed");

    if let Some(last) = items.last() {
        last.remove();
    }
    tweens.settle(demo.frame_ms);

    let scene = surface.borrow();
    for item in &items {
        let (x, y) = scene.rendered_translation(item.element());
        info!(
            element = item.element().0,
            position = ?item.position(),
            x,
            y,
            hidden = item.is_hidden(),
            removed = item.is_removed(),
            "final state"
        );
    }
    info!(
        attached = scene.attached_count(),
        styles_applied = scene.applied_count(),
        "demo finished"
    );
    drop(scene);

    for item in &items {
        if item.is_removed() {
            continue;
        }
        item.destroy();
        debug!(
            element = item.element().0,
            attached = surface.borrow().is_attached(item.element()),
            "destroyed"
        );
    }
    Ok(())
}

fn arrange(items: &[Item], demo: &DemoConfig, columns: usize) {
    let visible = items.iter().filter(|item| !item.is_removed());
    for (index, item) in visible.enumerate() {
        let column = (index % columns) as f64;
        let row = (index / columns) as f64;
        item.move_to(column * demo.cell, row * demo.cell);
    }
}

fn watch(item: &Item) {
    for event in [ItemEvent::Layout, ItemEvent::TransitionEnd, ItemEvent::Remove] {
        item.on(event, move |item| {
            debug!(
                element = item.element().0,
                event = event.name(),
                transition = ?item.finishing_transition(),
                "item event"
            );
            Listen::Keep
        });
    }
}
