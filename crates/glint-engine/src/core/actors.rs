use crate::render::{Renderer2d, Scene2d};
use crate::resource::ResourceManager;

/// Something that moves and draws itself.
pub trait Actor {
    fn update(&mut self, dt: f32);

    fn render(&mut self, dt: f32, renderer: &mut Renderer2d, resources: &ResourceManager);

    /// Late actors draw after every other actor of the frame, in insertion
    /// order.
    fn late_render(&self) -> bool {
        false
    }
}

/// Ordered collection of actors usable as a scene.
#[derive(Default)]
pub struct ActorList {
    actors: Vec<Box<dyn Actor>>,
    late: Vec<usize>,
}

impl ActorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, actor: impl Actor + 'static) {
        self.actors.push(Box::new(actor));
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn update(&mut self, dt: f32) {
        for actor in &mut self.actors {
            actor.update(dt);
        }
    }

    /// Visits regular actors first, then late ones.
    pub fn for_each_in_render_order(&mut self, mut f: impl FnMut(&mut dyn Actor)) {
        self.late.clear();
        for (i, actor) in self.actors.iter_mut().enumerate() {
            if actor.late_render() {
                self.late.push(i);
            } else {
                f(actor.as_mut());
            }
        }
        for &i in &self.late {
            f(self.actors[i].as_mut());
        }
    }
}

impl Scene2d for ActorList {
    fn render(&mut self, dt: f32, renderer: &mut Renderer2d, resources: &ResourceManager) {
        self.for_each_in_render_order(|actor| actor.render(dt, renderer, resources));
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    struct Tagged {
        tag: &'static str,
        late: bool,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Actor for Tagged {
        fn update(&mut self, _dt: f32) {
            self.log.borrow_mut().push(self.tag);
        }

        fn render(&mut self, _dt: f32, _renderer: &mut Renderer2d, _resources: &ResourceManager) {}

        fn late_render(&self) -> bool {
            self.late
        }
    }

    #[test]
    fn late_actors_come_last() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut list = ActorList::new();
        for (tag, late) in [("hud", true), ("ground", false), ("cursor", true), ("player", false)] {
            list.push(Tagged {
                tag,
                late,
                log: log.clone(),
            });
        }

        list.for_each_in_render_order(|actor| actor.update(0.0));
        assert_eq!(*log.borrow(), vec!["ground", "player", "hud", "cursor"]);

        log.borrow_mut().clear();
        list.update(0.016);
        assert_eq!(*log.borrow(), vec!["hud", "ground", "cursor", "player"]);
        assert_eq!(list.len(), 4);
    }
}
