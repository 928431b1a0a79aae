use std::f64::consts::TAU;

use super::*;

#[test]
fn n_steps_give_n_minus_one_cycles() {
    assert_eq!(RotationSchedule::new(36).cycles(), 35);
    assert_eq!(RotationSchedule::new(2).cycles(), 1);
    assert_eq!(RotationSchedule::new(1).cycles(), 0);
}

#[test]
fn degenerate_step_counts_produce_no_steps() {
    for steps in [0, -1, i32::MIN] {
        let schedule = RotationSchedule::new(steps);
        assert_eq!(schedule.cycles(), 0);
        assert_eq!(schedule.iter().count(), 0);
    }
}

#[test]
fn angles_grow_by_one_increment_and_stop_short_of_a_revolution() {
    let steps = 8;
    let angles: Vec<f64> = RotationSchedule::new(steps).iter().map(|s| s.angle).collect();
    assert_eq!(angles.len(), 7);
    for (x, angle) in angles.iter().enumerate() {
        let expected = (x as f64 + 1.0) * TAU / f64::from(steps);
        assert!((angle - expected).abs() < 1e-12);
    }
    let last = *angles.last().unwrap();
    assert!((last - 7.0 * TAU / 8.0).abs() < 1e-12);
    assert!(last < TAU);
}

#[test]
fn indices_are_zero_based_and_contiguous() {
    let idx: Vec<u32> = RotationSchedule::new(4).iter().map(|s| s.index).collect();
    assert_eq!(idx, vec![0, 1, 2]);
}
