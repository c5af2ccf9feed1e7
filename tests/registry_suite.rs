use std::cell::RefCell;
use std::rc::Rc;

use beatscope::analysis::OnsetResult;
use beatscope::visual::{find_scene, make_scenes, RegistryError, Scene, SceneRegistry, Surface};

type Log = Rc<RefCell<Vec<String>>>;

/// Records lifecycle calls and tracks whether its "resources" are live.
struct RecordingScene {
    name: &'static str,
    log: Log,
    live: bool,
    updates: usize,
}

impl RecordingScene {
    fn boxed(name: &'static str, log: &Log) -> Box<dyn Scene> {
        Box::new(Self {
            name,
            log: Rc::clone(log),
            live: false,
            updates: 0,
        })
    }

    fn paint(&self, surface: &mut Surface) {
        surface.fill([self.updates as u8, 0, 0]);
    }
}

impl Scene for RecordingScene {
    fn name(&self) -> &'static str {
        self.name
    }

    fn update(&mut self, _dt: f32, _audio: &OnsetResult) {
        self.updates += 1;
        self.log.borrow_mut().push(format!("update {}", self.name));
    }

    fn render(&self, surface: &mut Surface) {
        self.log.borrow_mut().push(format!("render {}", self.name));
        self.paint(surface);
    }

    fn resize(&mut self, surface: &mut Surface) {
        if !self.live {
            self.live = true;
            self.log.borrow_mut().push(format!("build {}", self.name));
        }
        self.log.borrow_mut().push(format!("resize {}", self.name));
        self.paint(surface);
    }

    fn dispose(&mut self) {
        self.live = false;
        self.log.borrow_mut().push(format!("dispose {}", self.name));
    }

    fn is_disposed(&self) -> bool {
        !self.live
    }
}

fn recording_registry(log: &Log) -> SceneRegistry {
    let scenes = vec![
        RecordingScene::boxed("a", log),
        RecordingScene::boxed("b", log),
        RecordingScene::boxed("c", log),
    ];
    SceneRegistry::new(scenes).expect("registry")
}

fn take(log: &Log) -> Vec<String> {
    std::mem::take(&mut *log.borrow_mut())
}

#[test]
fn empty_registry_is_rejected() {
    let err = SceneRegistry::new(Vec::new()).err();
    assert_eq!(err, Some(RegistryError::Empty));
}

#[test]
fn next_and_prev_wrap_around() {
    let log = Log::default();
    let mut reg = recording_registry(&log);
    let mut surface = Surface::new(8, 8);

    assert_eq!(reg.current_index(), 0);
    assert!(reg.prev(&mut surface));
    assert_eq!(reg.current_index(), 2);
    assert!(reg.next(&mut surface));
    assert_eq!(reg.current_index(), 0);

    for _ in 0..3 {
        reg.next(&mut surface);
    }
    assert_eq!(reg.current_index(), 0);
}

#[test]
fn switching_disposes_outgoing_before_activating_incoming() {
    let log = Log::default();
    let mut reg = recording_registry(&log);
    let mut surface = Surface::new(8, 8);
    reg.resize(&mut surface);
    take(&log);

    assert!(reg.set_scene(1, &mut surface));
    assert_eq!(take(&log), vec!["dispose a", "build b", "resize b"]);

    assert!(reg.set_scene(2, &mut surface));
    assert_eq!(take(&log), vec!["dispose b", "build c", "resize c"]);
}

#[test]
fn only_the_current_scene_is_updated() {
    let log = Log::default();
    let mut reg = recording_registry(&log);
    let mut surface = Surface::new(8, 8);
    reg.set_scene(1, &mut surface);
    take(&log);

    reg.update(0.016, &OnsetResult::default());
    reg.render(&mut surface);
    reg.update(0.016, &OnsetResult::default());
    reg.render(&mut surface);
    assert_eq!(take(&log), vec!["update b", "render b", "update b", "render b"]);
}

#[test]
fn switched_away_scene_is_never_drawn_again() {
    let log = Log::default();
    let mut reg = recording_registry(&log);
    let mut surface = Surface::new(8, 8);
    reg.resize(&mut surface);
    reg.render(&mut surface);
    reg.next(&mut surface);
    take(&log);

    for _ in 0..5 {
        reg.update(0.016, &OnsetResult::default());
        reg.render(&mut surface);
    }
    reg.resize(&mut surface);
    reg.next(&mut surface);
    reg.render(&mut surface);

    let calls = take(&log);
    assert!(
        calls.iter().all(|c| !c.ends_with(" a")),
        "disposed scene was touched: {calls:?}"
    );
    assert_eq!(calls.last().map(String::as_str), Some("render c"));
}

#[test]
fn disposed_scene_rebuilds_when_reactivated() {
    let log = Log::default();
    let mut reg = recording_registry(&log);
    let mut surface = Surface::new(8, 8);
    reg.resize(&mut surface);
    reg.set_scene(1, &mut surface);
    take(&log);

    assert!(reg.set_scene(0, &mut surface));
    assert_eq!(take(&log), vec!["dispose b", "build a", "resize a"]);
}

#[test]
fn listener_hears_every_effective_switch() {
    let log = Log::default();
    let mut reg = recording_registry(&log);
    let mut surface = Surface::new(8, 8);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    reg.set_listener(move |index, count| sink.borrow_mut().push((index, count)));

    reg.next(&mut surface);
    reg.next(&mut surface);
    reg.next(&mut surface);
    reg.set_scene(0, &mut surface); // already current
    assert_eq!(*seen.borrow(), vec![(1, 3), (2, 3), (0, 3)]);
}

#[test]
fn invalid_or_current_index_is_a_silent_noop() {
    let log = Log::default();
    let mut reg = recording_registry(&log);
    let mut surface = Surface::new(8, 8);
    let seen = Rc::new(RefCell::new(0usize));
    let sink = Rc::clone(&seen);
    reg.set_listener(move |_, _| *sink.borrow_mut() += 1);
    reg.resize(&mut surface);
    take(&log);

    assert!(!reg.set_scene(3, &mut surface));
    assert!(!reg.set_scene(usize::MAX, &mut surface));
    assert!(!reg.set_scene(0, &mut surface));
    assert_eq!(reg.current_index(), 0);
    assert!(take(&log).is_empty());
    assert_eq!(*seen.borrow(), 0);
}

#[test]
fn start_index_falls_back_to_first_scene() {
    let log = Log::default();
    let scenes = vec![RecordingScene::boxed("a", &log), RecordingScene::boxed("b", &log)];
    let reg = SceneRegistry::with_start(scenes, 9).expect("registry");
    assert_eq!(reg.current_index(), 0);

    let scenes = vec![RecordingScene::boxed("a", &log), RecordingScene::boxed("b", &log)];
    let reg = SceneRegistry::with_start(scenes, 1).expect("registry");
    assert_eq!(reg.current_name(), "b");
    // Initial activation is not an announced switch.
    assert!(log.borrow().is_empty());
}

#[test]
fn dispose_current_runs_once() {
    let log = Log::default();
    let mut reg = recording_registry(&log);
    let mut surface = Surface::new(8, 8);
    reg.resize(&mut surface);
    take(&log);

    reg.dispose_current();
    reg.dispose_current();
    assert_eq!(take(&log), vec!["dispose a"]);
}

#[test]
fn find_matches_index_name_and_substring() {
    let reg = SceneRegistry::new(make_scenes()).expect("registry");
    assert_eq!(reg.find("2"), Some(2));
    assert_eq!(reg.find("99"), None);
    assert_eq!(reg.find("orb field"), Some(1));
    assert_eq!(reg.find("TERRAIN"), Some(3));
    assert_eq!(reg.find("no such scene"), None);
    assert_eq!(reg.names().len(), reg.len());
}

#[test]
fn find_scene_works_on_bare_names() {
    let names = ["Grid Tunnel", "Orb Field", "Star"];
    assert_eq!(find_scene(&names, " 1 "), Some(1));
    assert_eq!(find_scene(&names, "3"), None);
    assert_eq!(find_scene(&names, "star"), Some(2));
    assert_eq!(find_scene(&names, "field"), Some(1));
    assert_eq!(find_scene(&[], "grid"), None);
}

#[test]
fn builtin_scenes_survive_a_full_cycle() {
    let mut reg = SceneRegistry::new(make_scenes()).expect("registry");
    let mut surface = Surface::new(48, 32);
    reg.resize(&mut surface);
    for _ in 0..reg.len() * 2 {
        reg.next(&mut surface);
        reg.update(1.0 / 60.0, &OnsetResult::default());
        reg.render(&mut surface);
    }
    assert_eq!(reg.current_index(), 0);
}
