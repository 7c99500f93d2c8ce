mod common;

use common::{initialized, session, session_with};
use hm5065_rs::hm5065::controls::BandFilter;
use hm5065_rs::hm5065::regs::{Register, DEFAULT_REGS};
use hm5065_rs::hm5065::StreamParams;
use hm5065_rs::{
    CaptureMode, Config, ControlId, Error, FocusState, FrameInterval, StandbyMode, Value,
};

fn interval(numerator: u32, denominator: u32) -> FrameInterval {
    FrameInterval {
        numerator,
        denominator,
    }
}

#[test]
fn init_loads_defaults_then_band_filter() {
    let (mut camera, sensor, delay) = session();

    camera.init().unwrap();

    let writes = sensor.writes();
    let default_writes = DEFAULT_REGS.len() - 1;
    assert_eq!(writes.len(), default_writes + 3);
    assert_eq!(writes[0], (0x0085, 0x02));
    assert_eq!(
        writes[default_writes..],
        [(0x019C, 0x4B), (0x019D, 0x20), (0x0190, 0x00)]
    );
    assert_eq!(delay.total_ms(), 100 + 10);
    assert_eq!(
        camera.get_control(ControlId::BandFilter),
        Ok(Value::BandFilter(BandFilter::Hz50))
    );
    assert_eq!(camera.state().mode, None);
}

#[test]
fn init_rejects_other_chips() {
    let (mut camera, sensor, _) = session();
    sensor.set(Register::CHIP_ID_MSB, 0x56);

    assert_eq!(camera.init(), Err(Error::UnknownChip(0x56)));
    assert!(sensor.writes().is_empty());
}

#[test]
fn init_without_standby_resets_everything() {
    let (mut camera, sensor, _) = initialized();
    camera
        .set_control(ControlId::Brightness, Value::Level(2))
        .unwrap();
    camera.enable_continuous_focus().unwrap();

    camera.init().unwrap();
    assert_eq!(camera.get_control(ControlId::Brightness), Ok(Value::Level(0)));
    assert_eq!(camera.focus_state(), FocusState::Idle);
    assert!(sensor.writes().contains(&(0x0010, 0x01)));
}

#[test]
fn init_after_retaining_standby_skips_reprogramming() {
    let config = Config::DEFAULT.with_standby(StandbyMode::Hardware);
    let (mut camera, sensor, _) = session_with(config);
    camera.init().unwrap();
    camera
        .set_control(ControlId::Brightness, Value::Level(2))
        .unwrap();
    sensor.clear_log();

    camera.init().unwrap();
    assert!(sensor.writes().is_empty());
    assert_eq!(sensor.reads_of(Register::CHIP_ID_MSB), 1);
    assert_eq!(camera.get_control(ControlId::Brightness), Ok(Value::Level(2)));
}

#[test]
fn stream_params_default_to_full_rate_video() {
    let (camera, _, _) = session();
    assert_eq!(
        camera.stream_params(),
        StreamParams {
            capture_mode: CaptureMode::Video,
            frame_interval: interval(1, 30),
            low_speed: false,
        }
    );
}

#[test]
fn frame_rate_is_divided_from_thirty() {
    let (mut camera, sensor, _) = initialized();

    camera
        .set_stream_params(CaptureMode::Video, interval(1, 15))
        .unwrap();
    let params = camera.stream_params();
    assert_eq!(params.frame_interval, interval(2, 30));
    assert!(params.low_speed);

    camera
        .set_stream_params(CaptureMode::Preview, interval(1, 2))
        .unwrap();
    assert_eq!(camera.stream_params().frame_interval, interval(15, 30));

    camera
        .set_stream_params(CaptureMode::Video, interval(1, 30))
        .unwrap();
    assert!(!camera.stream_params().low_speed);
    assert_eq!(sensor.traffic(), 0);
}

#[test]
fn zero_interval_resets_to_full_rate() {
    let (mut camera, _, _) = initialized();
    camera
        .set_stream_params(CaptureMode::Video, interval(1, 10))
        .unwrap();

    camera
        .set_stream_params(CaptureMode::Video, interval(0, 0))
        .unwrap();
    assert_eq!(camera.stream_params().frame_interval, interval(1, 30));
}

#[test]
fn unreachable_rates_are_rejected() {
    let (mut camera, _, _) = initialized();

    for bad in [interval(1, 60), interval(1, 1), interval(2, 1)] {
        assert_eq!(
            camera.set_stream_params(CaptureMode::Video, bad),
            Err(Error::InvalidStreamParameters),
            "{:?}",
            bad
        );
        assert_eq!(camera.stream_params().frame_interval, interval(1, 30));
    }
}

#[test]
fn still_capture_only_records_the_mode() {
    let (mut camera, _, _) = initialized();

    camera
        .set_stream_params(CaptureMode::Still, interval(1, 60))
        .unwrap();
    let params = camera.stream_params();
    assert_eq!(params.capture_mode, CaptureMode::Still);
    assert_eq!(params.frame_interval, interval(1, 30));
}

#[test]
fn exif_is_derived_from_shutter_and_gain() {
    let (mut camera, sensor, _) = initialized();
    sensor.set(Register::SHUTTER_MSB, 0x01);
    sensor.set(Register::SHUTTER_LSB, 0x90);
    sensor.set(Register::GLOBAL_GAIN, 0x40);

    let exif = camera.exif().unwrap();
    assert_eq!(sensor.writes(), [(Register::PAGE_SELECT, 0x00)]);
    assert_eq!(exif.exposure_time_num, 1);
    assert_eq!(exif.exposure_time_den, 40);
    assert_eq!(exif.iso_speed, 200);
    assert_eq!(exif.fnumber, 280);
    assert_eq!(exif.focal_length, 425);
    assert_eq!(exif.brightness, 125);
    assert!(!exif.flash_fired);
}

#[test]
fn exif_survives_degenerate_shutter_values() {
    let (mut camera, sensor, _) = initialized();

    assert_eq!(camera.exif().unwrap().exposure_time_den, 16000);

    sensor.set(Register::SHUTTER_MSB, 0xFF);
    sensor.set(Register::SHUTTER_LSB, 0xFF);
    assert_eq!(camera.exif().unwrap().exposure_time_den, 1);
}
