use std::cell::{Cell, RefCell};
use std::rc::Rc;

use lilt_core::{
    Binding, Config, Ease, FrameTime, Phase, PoolStats, Scheduler, TargetKey, TaskHandle,
    TaskSettings, TweenError, Value,
};

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

fn small(capacity: usize, warn: bool) -> Scheduler {
    Scheduler::new(Config {
        initial_capacity: capacity,
        warn_on_capacity_growth: warn,
        ..Config::default()
    })
}

#[test]
/// it should double the pool and report the growth once it runs out
fn growth_is_reported() {
    let mut s = small(2, true);
    s.create_delay(TaskSettings::new(1.0));
    s.create_delay(TaskSettings::new(1.0));
    assert!(s.diagnostics().is_empty());
    s.create_delay(TaskSettings::new(1.0));
    assert!(s
        .diagnostics()
        .contains(|e| *e == TweenError::CapacityExceeded { from: 2, to: 4 }));
    assert_eq!(s.pool_stats().capacity, 4);
}

#[test]
/// it should grow silently when growth warnings are disabled
fn growth_warning_can_be_disabled() {
    let mut s = small(1, false);
    for _ in 0..5 {
        s.create_delay(TaskSettings::new(1.0));
    }
    assert!(s.diagnostics().is_empty());
    assert_eq!(s.pool_stats().capacity, 8);
    assert_eq!(s.live_count(None), 5);
}

#[test]
/// it should pre-allocate slots on request
fn pool_can_be_prefilled() {
    let mut s = small(2, true);
    s.set_pool_capacity(16);
    assert_eq!(
        s.pool_stats(),
        PoolStats {
            capacity: 16,
            allocated: 16,
            free: 16
        }
    );
    for _ in 0..16 {
        s.create_delay(TaskSettings::new(1.0));
    }
    assert!(s.diagnostics().is_empty());
}

#[test]
/// it should recycle slots of finished tasks on the following update
fn finished_slots_return_to_the_pool() {
    let mut s = small(4, true);
    for _ in 0..3 {
        s.create_delay(TaskSettings::new(0.1));
    }
    assert_eq!(s.pool_stats().free, 1);
    s.update(Phase::Update, FrameTime::uniform(1.0)).unwrap();
    assert_eq!(s.pool_stats().free, 4);
    assert_eq!(s.live_count(None), 0);
}

#[test]
/// it should not step tasks created during an update until the next one
fn tasks_created_mid_update_wait() {
    let mut s = Scheduler::default();
    let (obj, b) = float_target();
    let spawned: Rc<Cell<Option<TaskHandle>>> = Rc::new(Cell::new(None));
    let first = s.create_delay(TaskSettings::new(0.1));
    let out = spawned.clone();
    let mut binding = Some(b);
    s.on_complete(first, move |s: &mut Scheduler, _: TaskHandle| {
        if let Some(b) = binding.take() {
            let h = s
                .create_task(
                    Some(b),
                    Value::Float(0.0),
                    Value::Float(10.0),
                    TaskSettings::new(1.0).with_ease(Ease::Linear),
                )
                .unwrap();
            out.set(Some(h));
        }
    })
    .unwrap();

    s.update(Phase::Update, FrameTime::uniform(0.5)).unwrap();
    let h = spawned.get().unwrap();
    assert_eq!(s.elapsed_time(h), Some(0.0));
    assert_eq!(*obj.borrow(), 0.0);

    s.update(Phase::Update, FrameTime::uniform(0.5)).unwrap();
    approx(*obj.borrow(), 5.0, 1e-5);
}

#[test]
/// it should only step tasks registered for the updated phase
fn phases_are_isolated() {
    let mut s = Scheduler::default();
    let fixed = s.create_delay(TaskSettings::new(1.0).with_phase(Phase::FixedUpdate));
    let late = s.create_delay(TaskSettings::new(1.0).with_phase(Phase::LateUpdate));
    let regular = s.create_delay(TaskSettings::new(1.0));

    s.update(Phase::FixedUpdate, FrameTime::uniform(0.25)).unwrap();
    assert_eq!(s.elapsed_time(fixed), Some(0.25));
    assert_eq!(s.elapsed_time(late), Some(0.0));
    assert_eq!(s.elapsed_time(regular), Some(0.0));

    s.update(Phase::LateUpdate, FrameTime::uniform(0.5)).unwrap();
    assert_eq!(s.elapsed_time(late), Some(0.5));
    assert_eq!(s.elapsed_time(regular), Some(0.0));
}

#[test]
/// it should step fixed, regular and late phases in that order on tick
fn tick_runs_phases_in_order() {
    let mut s = Scheduler::default();
    let order = Rc::new(RefCell::new(Vec::new()));
    for phase in [Phase::LateUpdate, Phase::Update, Phase::FixedUpdate] {
        let h = s.create_delay(TaskSettings::new(1.0).with_phase(phase));
        let o = order.clone();
        s.on_update(h, move |_: &mut Scheduler, _: TaskHandle, _: Value| {
            o.borrow_mut().push(phase)
        })
        .unwrap();
    }
    s.tick(FrameTime::uniform(0.1)).unwrap();
    assert_eq!(
        *order.borrow(),
        vec![Phase::FixedUpdate, Phase::Update, Phase::LateUpdate]
    );
}

#[test]
/// it should use the unscaled delta for tasks that ask for it
fn unscaled_and_scaled_deltas() {
    let mut s = Scheduler::default();
    let scaled = s.create_delay(TaskSettings::new(1.0));
    let unscaled = s.create_delay(TaskSettings::new(1.0).with_unscaled_time(true));
    s.tick(FrameTime::new(0.0, 0.2)).unwrap();
    assert_eq!(s.elapsed_time(scaled), Some(0.0));
    assert_eq!(s.elapsed_time(unscaled), Some(0.2));
}

#[test]
/// it should count staged tasks and filter by target
fn live_count_sees_staged_tasks() {
    let mut s = Scheduler::default();
    let (a, ba) = float_target();
    let (_b, bb) = float_target();
    let settings = TaskSettings::new(1.0);
    s.create_task(Some(ba), Value::Float(0.0), Value::Float(1.0), settings.clone())
        .unwrap();
    s.create_task(Some(bb), Value::Float(0.0), Value::Float(1.0), settings)
        .unwrap();
    s.create_delay(TaskSettings::new(1.0));
    assert_eq!(s.live_count(None), 3);
    assert_eq!(s.live_count(Some(TargetKey::of(&a))), 1);
}
