mod common;

use common::initialized;
use hm5065_rs::hm5065::controls::{
    BandFilter, ColorEffect, LockStatus, Range, WhiteBalance, LEVEL_MAX, LEVEL_MIN,
};
use hm5065_rs::hm5065::regs::Register;
use hm5065_rs::{ControlError, ControlId, Value};

const LEVELS: [ControlId; 4] = [
    ControlId::Brightness,
    ControlId::Contrast,
    ControlId::Saturation,
    ControlId::ExposureBias,
];

#[test]
fn out_of_range_levels_are_rejected_before_bus_io() {
    let (mut camera, sensor, _) = initialized();

    for id in LEVELS {
        for level in [LEVEL_MIN - 1, LEVEL_MAX + 1, i8::MIN, i8::MAX] {
            assert_eq!(
                camera.set_control(id, Value::Level(level)),
                Err(ControlError::InvalidArgument)
            );
            assert_eq!(camera.get_control(id), Ok(Value::Level(0)));
        }
    }
    assert_eq!(sensor.traffic(), 0);
}

#[test]
fn brightness_scenario() {
    let (mut camera, _, _) = initialized();

    assert_eq!(
        camera.set_control(ControlId::Brightness, Value::Level(5)),
        Err(ControlError::InvalidArgument)
    );
    camera
        .set_control(ControlId::Brightness, Value::Level(-4))
        .unwrap();
    assert_eq!(camera.get_control(ControlId::Brightness), Ok(Value::Level(-4)));
}

#[test]
fn successful_sets_round_trip() {
    let (mut camera, _, _) = initialized();
    let cases = [
        (ControlId::Contrast, Value::Level(3)),
        (ControlId::Saturation, Value::Level(-2)),
        (ControlId::ExposureBias, Value::Level(4)),
        (
            ControlId::WhiteBalance,
            Value::WhiteBalance(WhiteBalance::Incandescent),
        ),
        (ControlId::ColorEffect, Value::ColorEffect(ColorEffect::Sepia)),
        (ControlId::ColorEffect, Value::ColorEffect(ColorEffect::Vivid)),
        (ControlId::BandFilter, Value::BandFilter(BandFilter::Hz60)),
        (ControlId::BandFilter, Value::BandFilter(BandFilter::Auto)),
        (ControlId::AutoWhiteBalance, Value::Flag(false)),
        (ControlId::HorizontalFlip, Value::Flag(true)),
        (ControlId::VerticalFlip, Value::Flag(true)),
    ];

    for (id, value) in cases {
        camera.set_control(id, value).unwrap();
        assert_eq!(camera.get_control(id), Ok(value), "{:?}", id);
    }
}

#[test]
fn wrong_value_kind_is_rejected() {
    let (mut camera, sensor, _) = initialized();

    assert_eq!(
        camera.set_control(ControlId::WhiteBalance, Value::Level(1)),
        Err(ControlError::InvalidArgument)
    );
    assert_eq!(
        camera.set_control(ControlId::HorizontalFlip, Value::Level(1)),
        Err(ControlError::InvalidArgument)
    );
    assert_eq!(
        camera.set_control(ControlId::AutoFocusStart, Value::Flag(true)),
        Err(ControlError::InvalidArgument)
    );
    assert_eq!(
        camera.set_control(ControlId::AutoFocusStatus, Value::Trigger),
        Err(ControlError::InvalidArgument)
    );
    assert_eq!(
        camera.get_control(ControlId::AutoFocusInit),
        Err(ControlError::InvalidArgument)
    );
    assert_eq!(sensor.traffic(), 0);
}

#[test]
fn exposure_bias_writes_its_program_and_settles() {
    let (mut camera, sensor, delay) = initialized();
    let before = delay.total_ms();

    camera
        .set_control(ControlId::ExposureBias, Value::Level(-4))
        .unwrap();
    assert_eq!(sensor.writes(), [(0x0130, 0xF6)]);
    assert_eq!(delay.total_ms() - before, 10);
}

#[test]
fn color_effect_does_not_settle() {
    let (mut camera, sensor, delay) = initialized();
    let before = delay.total_ms();

    camera
        .set_control(ControlId::ColorEffect, Value::ColorEffect(ColorEffect::Negative))
        .unwrap();
    assert_eq!(sensor.get(0x0380), 0x01);
    assert_eq!(sensor.writes().len(), 4);
    assert_eq!(delay.total_ms(), before);
}

#[test]
fn flip_to_cached_value_is_a_no_op() {
    let (mut camera, sensor, delay) = initialized();
    let before = delay.total_ms();

    camera
        .set_control(ControlId::HorizontalFlip, Value::Flag(false))
        .unwrap();
    assert_eq!(sensor.traffic(), 0);
    assert_eq!(delay.total_ms(), before);
}

#[test]
fn flip_is_a_read_modify_write_of_bit_zero() {
    let (mut camera, sensor, delay) = initialized();
    sensor.set(Register::HORIZONTAL_MIRROR, 0x10);
    sensor.set(Register::VERTICAL_FLIP, 0xFF);
    let before = delay.total_ms();

    camera
        .set_control(ControlId::HorizontalFlip, Value::Flag(true))
        .unwrap();
    assert_eq!(sensor.writes(), [(Register::HORIZONTAL_MIRROR, 0x11)]);
    assert_eq!(delay.total_ms() - before, 10);

    camera
        .set_control(ControlId::VerticalFlip, Value::Flag(true))
        .unwrap();
    camera
        .set_control(ControlId::VerticalFlip, Value::Flag(false))
        .unwrap();
    assert_eq!(sensor.get(Register::VERTICAL_FLIP), 0xFE);
}

#[test]
fn flip_get_reads_the_sensor() {
    let (mut camera, sensor, _) = initialized();
    sensor.set(Register::VERTICAL_FLIP, 0x01);

    assert_eq!(camera.get_control(ControlId::VerticalFlip), Ok(Value::Flag(true)));
    assert_eq!(sensor.reads_of(Register::VERTICAL_FLIP), 1);
    assert!(camera.state().controls.vertical_flip);
}

#[test]
fn white_balance_modes_stay_consistent() {
    let (mut camera, sensor, _) = initialized();

    camera
        .set_control(ControlId::WhiteBalance, Value::WhiteBalance(WhiteBalance::Cloudy))
        .unwrap();
    assert_eq!(camera.get_control(ControlId::AutoWhiteBalance), Ok(Value::Flag(false)));
    assert!(camera.lock_status().white_balance);

    sensor.clear_log();
    camera
        .set_control(ControlId::AutoWhiteBalance, Value::Flag(true))
        .unwrap();
    assert_eq!(sensor.writes(), [(0x01A0, 0x01)]);
    assert_eq!(
        camera.get_control(ControlId::WhiteBalance),
        Ok(Value::WhiteBalance(WhiteBalance::Auto))
    );
    assert!(!camera.lock_status().white_balance);
}

#[test]
fn query_describes_ranges_and_defaults() {
    let (camera, _, _) = initialized();

    let brightness = camera.query_control(ControlId::Brightness);
    assert_eq!(
        brightness.range,
        Range::Level {
            min: -4,
            max: 4,
            step: 1
        }
    );
    assert_eq!(brightness.default, Some(Value::Level(0)));

    match camera.query_control(ControlId::WhiteBalance).range {
        Range::Menu(items) => assert_eq!(items.len(), 5),
        other => panic!("unexpected range {:?}", other),
    }
    assert_eq!(camera.query_control(ControlId::AutoFocusStart).range, Range::Button);
}

#[test]
fn focus_lock_pauses_autofocus() {
    let (mut camera, sensor, delay) = initialized();
    let before = delay.total_ms();

    camera
        .set_control(
            ControlId::Lock3A,
            Value::Lock(LockStatus {
                focus: true,
                ..LockStatus::default()
            }),
        )
        .unwrap();
    assert_eq!(sensor.writes(), [(Register::AF_MODE, 0x00)]);
    assert_eq!(delay.total_ms() - before, 5);

    sensor.clear_log();
    camera.set_lock(LockStatus::default()).unwrap();
    assert_eq!(sensor.traffic(), 0);
    assert_eq!(delay.total_ms() - before, 10);
}

#[test]
fn lock_status_follows_continuous_focus() {
    let (mut camera, _, _) = initialized();
    assert_eq!(
        camera.get_control(ControlId::Lock3A),
        Ok(Value::Lock(LockStatus {
            focus: true,
            white_balance: false,
            exposure: false,
        }))
    );

    camera.enable_continuous_focus().unwrap();
    assert!(!camera.lock_status().focus);
}
