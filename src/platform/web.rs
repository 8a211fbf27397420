//! Browser listener bookkeeping
//!
//! Every listener the host registers goes through a [`ListenerSet`] so it
//! can be unregistered later. Closures stay owned by the set after
//! detaching: a listener may be the one triggering the detach.

use glam::Vec2;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, Element, EventTarget, MouseEvent, TouchEvent};

use crate::error::RangeError;

struct Registration {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(web_sys::Event)>,
    attached: bool,
}

#[derive(Default)]
pub struct ListenerSet {
    registrations: Vec<Registration>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind` on `target`.
    /// `passive: false` lets the handler call `preventDefault` on touch events.
    pub fn add(
        &mut self,
        target: &EventTarget,
        kind: &'static str,
        passive: bool,
        handler: impl FnMut(web_sys::Event) + 'static,
    ) -> Result<(), RangeError> {
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
        let options = AddEventListenerOptions::new();
        options.set_passive(passive);
        target
            .add_event_listener_with_callback_and_add_event_listener_options(
                kind,
                closure.as_ref().unchecked_ref(),
                &options,
            )
            .map_err(|err| RangeError::Platform(format!("addEventListener({kind}) failed: {err:?}")))?;

        self.registrations.push(Registration {
            target: target.clone(),
            kind,
            closure,
            attached: true,
        });
        Ok(())
    }

    /// Unregister every listener (idempotent)
    pub fn detach_all(&mut self) {
        let mut detached = 0;
        for registration in self.registrations.iter_mut().filter(|r| r.attached) {
            if let Err(err) = registration.target.remove_event_listener_with_callback(
                registration.kind,
                registration.closure.as_ref().unchecked_ref(),
            ) {
                log::warn!("removeEventListener({}) failed: {:?}", registration.kind, err);
            }
            registration.attached = false;
            detached += 1;
        }
        if detached > 0 {
            log::debug!("Detached {} listeners", detached);
        }
    }

    pub fn attached(&self) -> usize {
        self.registrations.iter().filter(|r| r.attached).count()
    }
}

/// Top-left corner of an element in client coordinates
pub fn element_origin(element: &Element) -> Vec2 {
    let rect = element.get_bounding_client_rect();
    Vec2::new(rect.left() as f32, rect.top() as f32)
}

/// Mouse position relative to `element`, plus the pressed button
pub fn mouse_position(event: &web_sys::Event, element: &Element) -> Option<(i16, Vec2)> {
    let mouse = event.dyn_ref::<MouseEvent>()?;
    let client = Vec2::new(mouse.client_x() as f32, mouse.client_y() as f32);
    Some((
        mouse.button(),
        super::input::element_relative(client, element_origin(element)),
    ))
}

/// First touch relative to `element`
pub fn first_touch(event: &web_sys::Event, element: &Element) -> Option<Vec2> {
    let touch_event = event.dyn_ref::<TouchEvent>()?;
    let touch = touch_event.touches().get(0)?;
    let client = Vec2::new(touch.client_x() as f32, touch.client_y() as f32);
    Some(super::input::element_relative(client, element_origin(element)))
}
