use std::cell::{Cell, RefCell};
use std::rc::Rc;

use lilt_core::{
    Binding, CycleMode, Ease, FrameTime, Phase, Scheduler, SequenceSettings, TaskHandle,
    TaskSettings, TweenError, Value, INFINITE_CYCLES,
};

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn float_target() -> (Rc<RefCell<f32>>, Binding) {
    let obj = Rc::new(RefCell::new(f32::NAN));
    let binding = Binding::new(&obj, |x: &mut f32, v: &Value| {
        if let Some(f) = v.as_float() {
            *x = f;
        }
    });
    (obj, binding)
}

fn step(s: &mut Scheduler, dt: f32) {
    s.update(Phase::Update, FrameTime::uniform(dt)).unwrap();
}

fn tween(s: &mut Scheduler, b: Binding, from: f32, to: f32, settings: TaskSettings) -> TaskHandle {
    s.create_task(Some(b), Value::Float(from), Value::Float(to), settings)
        .unwrap()
}

fn delay(s: &mut Scheduler, d: f32) -> TaskHandle {
    s.create_delay(TaskSettings::new(d).with_ease(Ease::Linear))
}

fn counter() -> (Rc<Cell<u32>>, impl FnMut(&mut Scheduler, TaskHandle) + 'static) {
    let c = Rc::new(Cell::new(0));
    let inner = c.clone();
    (c, move |_: &mut Scheduler, _: TaskHandle| inner.set(inner.get() + 1))
}

#[test]
/// it should place chained, grouped and inserted children on the timeline
fn span_follows_placement() {
    let mut s = Scheduler::default();
    let seq = s.create_sequence(SequenceSettings::default());
    let a = delay(&mut s, 1.0);
    let b = delay(&mut s, 2.0);
    let c = delay(&mut s, 0.5);
    let d = delay(&mut s, 1.0);
    s.chain(seq, a).unwrap();
    s.chain(seq, b).unwrap();
    assert_eq!(s.duration(seq), Some(3.0));
    s.group(seq, c).unwrap();
    assert_eq!(s.duration(seq), Some(3.0));
    s.insert(seq, 4.0, d).unwrap();
    assert_eq!(s.duration(seq), Some(5.0));
    assert_eq!(s.total_duration(seq), Some(5.0));
}

#[test]
/// it should play chained tweens one after another
fn chained_tweens_play_in_turn() {
    init_logs();
    let mut s = Scheduler::default();
    let (obj_a, ba) = float_target();
    let (obj_b, bb) = float_target();
    let settings = TaskSettings::new(1.0).with_ease(Ease::Linear);
    let a = tween(&mut s, ba, 0.0, 10.0, settings.clone());
    let b = tween(&mut s, bb, 0.0, 10.0, settings);
    let seq = s.create_sequence(SequenceSettings::default());
    s.chain(seq, a).unwrap();
    s.chain(seq, b).unwrap();
    let (a_done, cb) = counter();
    s.on_complete(a, cb).unwrap();
    let (seq_done, cb) = counter();
    s.on_complete(seq, cb).unwrap();

    step(&mut s, 0.5);
    approx(*obj_a.borrow(), 5.0, 1e-5);
    assert_eq!(*obj_b.borrow(), 0.0);

    step(&mut s, 1.0);
    assert_eq!(*obj_a.borrow(), 10.0);
    approx(*obj_b.borrow(), 5.0, 1e-5);
    assert_eq!(a_done.get(), 1);
    assert_eq!(seq_done.get(), 0);

    step(&mut s, 1.0);
    assert_eq!(*obj_b.borrow(), 10.0);
    assert_eq!(seq_done.get(), 1);
    assert!(!s.is_alive(seq));
    assert_eq!(s.live_count(None), 0);
}

#[test]
/// it should run callbacks in timeline order before the sequence completes
fn callbacks_fire_in_order() {
    let mut s = Scheduler::default();
    let log = Rc::new(RefCell::new(Vec::new()));
    let seq = s.create_sequence(SequenceSettings::default());
    let l = log.clone();
    s.chain_callback(seq, move |_| l.borrow_mut().push("first"))
        .unwrap();
    s.chain_delay(seq, 1.0).unwrap();
    let l = log.clone();
    s.insert_callback(seq, 0.5, move |_| l.borrow_mut().push("middle"))
        .unwrap();
    let l = log.clone();
    s.chain_callback(seq, move |_| l.borrow_mut().push("second"))
        .unwrap();
    let l = log.clone();
    s.on_complete(seq, move |_: &mut Scheduler, _: TaskHandle| {
        l.borrow_mut().push("done")
    })
    .unwrap();

    step(&mut s, 0.25);
    assert_eq!(*log.borrow(), vec!["first"]);
    step(&mut s, 2.0);
    assert_eq!(*log.borrow(), vec!["first", "middle", "second", "done"]);
}

#[test]
/// it should visit every cycle boundary crossed by a single large step
fn large_step_crosses_every_cycle() {
    let mut s = Scheduler::default();
    let fired = Rc::new(Cell::new(0));
    let seq = s.create_sequence(SequenceSettings::default().with_cycles(3, CycleMode::Restart));
    s.chain_delay(seq, 1.0).unwrap();
    let f = fired.clone();
    s.chain_callback(seq, move |_| f.set(f.get() + 1)).unwrap();
    let (done, cb) = counter();
    s.on_complete(seq, cb).unwrap();

    step(&mut s, 10.0);
    assert_eq!(fired.get(), 3);
    assert_eq!(done.get(), 1);
}

#[test]
/// it should complete nested children once per cycle
fn child_completes_every_cycle() {
    let mut s = Scheduler::default();
    let (_obj, b) = float_target();
    let child = tween(&mut s, b, 0.0, 1.0, TaskSettings::new(0.5));
    let (child_done, cb) = counter();
    s.on_complete(child, cb).unwrap();
    let seq = s.create_sequence(SequenceSettings::default().with_cycles(3, CycleMode::Restart));
    s.chain(seq, child).unwrap();

    for _ in 0..20 {
        step(&mut s, 0.1);
    }
    assert_eq!(child_done.get(), 3);
    assert!(!s.is_alive(seq));
}

#[test]
/// it should kill every descendant when the sequence is stopped
fn stop_kills_descendants() {
    let mut s = Scheduler::default();
    let (_a, ba) = float_target();
    let inner = s.create_sequence(SequenceSettings::default());
    let t = tween(&mut s, ba, 0.0, 1.0, TaskSettings::new(1.0));
    s.chain(inner, t).unwrap();
    let outer = s.create_sequence(SequenceSettings::default());
    s.chain_delay(outer, 0.5).unwrap();
    s.chain(outer, inner).unwrap();
    let (done, cb) = counter();
    s.on_complete(outer, cb).unwrap();

    step(&mut s, 0.75);
    assert_eq!(s.live_count(None), 4);
    s.stop(outer).unwrap();
    assert_eq!(s.live_count(None), 0);
    assert!(!s.is_alive(t));

    step(&mut s, 0.1);
    let stats = s.pool_stats();
    assert_eq!(stats.free, stats.allocated);
    assert_eq!(done.get(), 0);
}

#[test]
/// it should refuse invalid insertions with a specific reason
fn insertion_rejections() {
    init_logs();
    let mut s = Scheduler::default();
    let seq = s.create_sequence(SequenceSettings::default());
    let filler = delay(&mut s, 5.0);
    s.chain(seq, filler).unwrap();

    assert!(matches!(
        s.chain(seq, seq),
        Err(TweenError::SelfInsertion { .. })
    ));

    let shared = delay(&mut s, 1.0);
    let other = s.create_sequence(SequenceSettings::default());
    s.chain(other, shared).unwrap();
    assert!(matches!(
        s.chain(seq, shared),
        Err(TweenError::AlreadyInSequence { .. })
    ));

    let endless = s.create_delay(TaskSettings::new(1.0).with_cycles(INFINITE_CYCLES, CycleMode::Restart));
    assert!(matches!(
        s.chain(seq, endless),
        Err(TweenError::InfiniteChild { .. })
    ));

    let late = s.create_delay(TaskSettings::new(1.0).with_phase(Phase::LateUpdate));
    assert!(matches!(
        s.chain(seq, late),
        Err(TweenError::PhaseMismatch {
            sequence: Phase::Update,
            child: Phase::LateUpdate
        })
    ));

    let dead = delay(&mut s, 1.0);
    s.stop(dead).unwrap();
    assert_eq!(s.chain(seq, dead), Err(TweenError::InvalidHandle));

    let running = delay(&mut s, 1.0);
    step(&mut s, 0.1);
    let unstarted = s.create_sequence(SequenceSettings::default());
    assert!(matches!(
        s.chain(unstarted, running),
        Err(TweenError::AlreadyStarted { .. })
    ));
    // seq itself was stepped by that update too
    let fresh = delay(&mut s, 1.0);
    assert!(matches!(
        s.chain(seq, fresh),
        Err(TweenError::SequenceStarted { .. })
    ));

    // nested sequences are driven by their parent
    let nested_child = delay(&mut s, 1.0);
    assert!(matches!(
        s.chain(other, nested_child),
        Err(TweenError::SequenceStarted { .. })
    ));
    assert!(matches!(
        s.stop(shared),
        Err(TweenError::NestedMutation { .. })
    ));
    assert!(s.diagnostics().len() >= 8);
}

#[test]
/// it should refuse to mutate a sequence that is itself nested
fn nested_sequence_is_locked() {
    let mut s = Scheduler::default();
    let inner = s.create_sequence(SequenceSettings::default());
    let outer = s.create_sequence(SequenceSettings::default());
    s.chain(outer, inner).unwrap();
    let d = delay(&mut s, 1.0);
    assert!(matches!(
        s.chain(inner, d),
        Err(TweenError::NestedMutation { .. })
    ));
    assert!(matches!(
        s.set_paused(inner, true),
        Err(TweenError::NestedMutation { .. })
    ));
}

#[test]
/// it should clamp a negative insertion time to zero and report it
fn negative_insert_time() {
    let mut s = Scheduler::default();
    let seq = s.create_sequence(SequenceSettings::default());
    let d = delay(&mut s, 1.0);
    s.insert(seq, -2.0, d).unwrap();
    assert_eq!(s.duration(seq), Some(1.0));
    assert!(s
        .diagnostics()
        .contains(|e| matches!(e, TweenError::InvalidTime { value } if *value == -2.0)));
}

#[test]
/// it should build a sequence fluently
fn builder() {
    let mut s = Scheduler::default();
    let (obj, b) = float_target();
    let hits = Rc::new(Cell::new(0));
    let h = hits.clone();
    let seq = s
        .build_sequence(SequenceSettings::default())
        .chain_with(|s| {
            s.create_task(
                Some(b),
                Value::Float(0.0),
                Value::Float(4.0),
                TaskSettings::new(1.0).with_ease(Ease::Linear),
            )
        })
        .delay(0.5)
        .callback(move |_| h.set(h.get() + 1))
        .build();
    assert_eq!(s.duration(seq), Some(1.5));

    step(&mut s, 0.5);
    approx(*obj.borrow(), 2.0, 1e-5);
    assert_eq!(s.current_value(seq), Some(Value::Float(0.5)));
    step(&mut s, 1.0);
    assert_eq!(*obj.borrow(), 4.0);
    assert_eq!(hits.get(), 1);
    assert!(!s.is_alive(seq));
}

#[test]
/// it should play a yoyo sequence back to the start
fn yoyo_sequence() {
    let mut s = Scheduler::default();
    let (obj, b) = float_target();
    let child = tween(&mut s, b, 0.0, 10.0, TaskSettings::new(1.0).with_ease(Ease::Linear));
    let seq = s.create_sequence(SequenceSettings::default().with_cycles(2, CycleMode::Yoyo));
    s.chain(seq, child).unwrap();
    let (done, cb) = counter();
    s.on_complete(seq, cb).unwrap();

    step(&mut s, 1.5);
    approx(*obj.borrow(), 5.0, 1e-5);
    step(&mut s, 1.0);
    assert_eq!(*obj.borrow(), 0.0);
    assert_eq!(done.get(), 1);
}

#[test]
/// it should reverse child eases on the way back only for YoyoChildren
fn yoyo_children_reverse_eases() {
    let run = |mode| {
        let mut s = Scheduler::default();
        let (obj, b) = float_target();
        let child = tween(&mut s, b, 0.0, 10.0, TaskSettings::new(1.0).with_ease(Ease::InQuad));
        let seq = s.create_sequence(SequenceSettings::default().with_cycles(2, mode));
        s.chain(seq, child).unwrap();
        step(&mut s, 1.5);
        let v = *obj.borrow();
        v
    };
    approx(run(CycleMode::Yoyo), 2.5, 1e-4);
    approx(run(CycleMode::YoyoChildren), 7.5, 1e-4);
}

#[test]
/// it should leave the target at the value of the child that plays first
fn earliest_child_owns_the_initial_value() {
    let mut s = Scheduler::default();
    let obj = Rc::new(RefCell::new(f32::NAN));
    let bind = |obj: &Rc<RefCell<f32>>| {
        Binding::new(obj, |x: &mut f32, v: &Value| {
            if let Some(f) = v.as_float() {
                *x = f;
            }
        })
    };
    let first = tween(&mut s, bind(&obj), 0.0, 10.0, TaskSettings::new(1.0));
    let second = tween(&mut s, bind(&obj), 100.0, 200.0, TaskSettings::new(1.0));
    assert_eq!(*obj.borrow(), 100.0);

    let seq = s.create_sequence(SequenceSettings::default());
    s.chain(seq, first).unwrap();
    s.chain(seq, second).unwrap();
    assert_eq!(*obj.borrow(), 0.0);
}

#[test]
/// it should drive a nested sequence on the parent's timeline
fn nested_sequence_plays_inside_parent() {
    let mut s = Scheduler::default();
    let (obj, b) = float_target();
    let inner = s.create_sequence(SequenceSettings::default());
    let t = tween(&mut s, b, 0.0, 10.0, TaskSettings::new(1.0).with_ease(Ease::Linear));
    s.chain(inner, t).unwrap();
    let (inner_done, cb) = counter();
    s.on_complete(inner, cb).unwrap();

    let outer = s.create_sequence(SequenceSettings::default());
    s.chain_delay(outer, 1.0).unwrap();
    s.chain(outer, inner).unwrap();
    assert_eq!(s.duration(outer), Some(2.0));

    step(&mut s, 1.5);
    approx(*obj.borrow(), 5.0, 1e-5);
    step(&mut s, 1.0);
    assert_eq!(*obj.borrow(), 10.0);
    assert_eq!(inner_done.get(), 1);
    assert!(!s.is_alive(outer));
}

#[test]
/// it should start a grouped first item at zero and chain after it
fn group_then_chain() {
    let mut s = Scheduler::default();
    let (a_obj, ba) = float_target();
    let (b_obj, bb) = float_target();
    let settings = TaskSettings::new(1.0).with_ease(Ease::Linear);
    let a = tween(&mut s, ba, 0.0, 1.0, settings.clone());
    let b = tween(&mut s, bb, 0.0, 1.0, settings);
    let seq = s.create_sequence(SequenceSettings::default());
    s.group(seq, a).unwrap();
    s.chain(seq, b).unwrap();
    assert_eq!(s.duration(seq), Some(2.0));

    step(&mut s, 0.5);
    approx(*a_obj.borrow(), 0.5, 1e-5);
    assert_eq!(*b_obj.borrow(), 0.0);
    step(&mut s, 1.0);
    assert_eq!(*a_obj.borrow(), 1.0);
    approx(*b_obj.borrow(), 0.5, 1e-5);
}

#[test]
/// it should drive every child to its end even if a child callback tries to update
fn complete_rejects_updates_from_children() {
    init_logs();
    let mut s = Scheduler::default();
    let (a_obj, a_bind) = float_target();
    let (b_obj, b_bind) = float_target();
    let a = tween(&mut s, a_bind, 0.0, 10.0, TaskSettings::new(1.0).with_ease(Ease::Linear));
    let b = tween(&mut s, b_bind, 0.0, 10.0, TaskSettings::new(1.0).with_ease(Ease::Linear));
    let seq = s.create_sequence(SequenceSettings::default());
    s.chain(seq, a).unwrap();
    s.chain(seq, b).unwrap();
    let result = Rc::new(RefCell::new(None));
    let seen = result.clone();
    s.on_complete(a, move |s: &mut Scheduler, _: TaskHandle| {
        *seen.borrow_mut() = Some(s.update(Phase::Update, FrameTime::uniform(0.25)));
    })
    .unwrap();
    let (done, cb) = counter();
    s.on_complete(seq, cb).unwrap();

    s.complete(seq).unwrap();
    assert_eq!(*result.borrow(), Some(Err(TweenError::NestedUpdate)));
    assert_eq!(*a_obj.borrow(), 10.0);
    assert_eq!(*b_obj.borrow(), 10.0);
    assert_eq!(done.get(), 1);
    assert!(!s.is_alive(seq));
}

#[test]
/// it should finish completing before running a bulk stop issued by a child
fn complete_defers_bulk_calls_from_children() {
    let mut s = Scheduler::default();
    let (b_obj, b_bind) = float_target();
    let a = delay(&mut s, 1.0);
    let b = tween(&mut s, b_bind, 0.0, 10.0, TaskSettings::new(1.0).with_ease(Ease::Linear));
    let seq = s.create_sequence(SequenceSettings::default());
    s.chain(seq, a).unwrap();
    s.chain(seq, b).unwrap();
    let other = delay(&mut s, 1.0);
    let returned = Rc::new(Cell::new(usize::MAX));
    let r = returned.clone();
    s.on_complete(a, move |s: &mut Scheduler, _: TaskHandle| r.set(s.stop_all(None)))
        .unwrap();
    let (done, cb) = counter();
    s.on_complete(seq, cb).unwrap();

    s.complete(seq).unwrap();
    assert_eq!(returned.get(), 0);
    assert_eq!(*b_obj.borrow(), 10.0);
    assert_eq!(done.get(), 1);
    // the deferred stop ran afterwards
    assert!(!s.is_alive(other));
    assert_eq!(s.live_count(None), 0);
}

#[test]
/// it should not complete children while rewinding across a cycle boundary
fn rewinding_does_not_complete_children() {
    init_logs();
    let mut s = Scheduler::default();
    let seq = s.create_sequence(SequenceSettings::default().with_cycles(2, CycleMode::Restart));
    let d = delay(&mut s, 1.0);
    let (done, cb) = counter();
    s.on_complete(d, cb).unwrap();
    s.chain(seq, d).unwrap();
    let passed = Rc::new(Cell::new(0));
    let p = passed.clone();
    s.chain_callback(seq, move |_: &mut Scheduler| p.set(p.get() + 1))
        .unwrap();

    step(&mut s, 1.5);
    assert_eq!(done.get(), 1);
    assert_eq!(passed.get(), 1);

    s.set_time_scale(seq, -1.0).unwrap();
    step(&mut s, 1.0);
    approx(s.elapsed_time(seq).unwrap(), 0.5, 1e-6);
    assert_eq!(done.get(), 1);
    assert_eq!(passed.get(), 1);

    s.set_time_scale(seq, 1.0).unwrap();
    step(&mut s, 1.0);
    assert_eq!(done.get(), 2);
    assert_eq!(passed.get(), 2);
    assert!(s.is_alive(seq));
}
