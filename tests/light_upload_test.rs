mod common;

use cgmath::Vector3;
use common::test_utils::RecordingSession;
use flow_assets::{
    data_structures::light::{
        LightArrayUniform, LightArrayUploader, LightDescriptor, LightKind, MAX_LIGHTS, pack,
    },
    error::LightOverflow,
};

fn light(i: usize) -> LightDescriptor {
    LightDescriptor {
        position: Vector3::new(i as f32, 0.0, 0.0),
        color: Vector3::new(1.0, 0.5, 0.25),
        intensity: 1.0,
        kind: LightKind::Point,
    }
}

#[test]
fn should_pack_lights_in_order() {
    let lights: Vec<_> = (0..3).map(light).collect();
    let (uniform, overflow) = pack(&lights);
    assert!(overflow.is_none());
    assert_eq!(uniform.count(), 3);
    let xs: Vec<f32> = uniform.lights().iter().map(|l| l.position()[0]).collect();
    assert_eq!(xs, vec![0.0, 1.0, 2.0]);
}

#[test]
fn should_report_overflow_and_keep_first_lights() {
    let lights: Vec<_> = (0..MAX_LIGHTS + 3).map(light).collect();
    let (uniform, overflow) = pack(&lights);

    assert_eq!(overflow, Some(LightOverflow { dropped_count: 3 }));
    assert_eq!(uniform.count(), MAX_LIGHTS);
    assert_eq!(uniform.lights()[MAX_LIGHTS - 1].position()[0], (MAX_LIGHTS - 1) as f32);
}

#[test]
fn should_upload_exactly_max_lights_without_overflow() {
    let lights: Vec<_> = (0..MAX_LIGHTS).map(light).collect();
    let (uniform, overflow) = pack(&lights);
    assert!(overflow.is_none());
    assert_eq!(uniform.count(), MAX_LIGHTS);
}

#[test]
fn should_encode_light_kind() {
    let mut sun = light(0);
    sun.kind = LightKind::Directional;
    let (uniform, _) = pack(&[sun]);
    assert_eq!(uniform.lights()[0].kind(), 1);
    assert_eq!(uniform.lights()[0].color(), [1.0, 0.5, 0.25]);
}

#[test]
fn should_write_whole_uniform_on_upload() {
    let session = RecordingSession::new();
    let mut uploader = LightArrayUploader::new(&session);
    assert_eq!(uploader.buffer().len, std::mem::size_of::<LightArrayUniform>());

    let lights: Vec<_> = (0..MAX_LIGHTS + 3).map(light).collect();
    let overflow = uploader.upload(&session, &lights);
    assert_eq!(overflow.map(|o| o.dropped_count), Some(3));

    let writes = session.writes();
    assert_eq!(writes.len(), 1);
    let (buffer, offset, bytes) = &writes[0];
    assert_eq!((*buffer, *offset), (uploader.buffer().id, 0));
    let written: LightArrayUniform = bytemuck::pod_read_unaligned(bytes);
    assert_eq!(written.count(), MAX_LIGHTS);
    assert_eq!(uploader.uniform(), &written);

    uploader.upload(&session, &[]);
    assert_eq!(uploader.uniform().count(), 0);
}

#[test]
fn should_keep_uniform_layout_16_byte_aligned() {
    assert_eq!(std::mem::size_of::<LightArrayUniform>() % 16, 0);
    assert_eq!(std::mem::size_of::<LightArrayUniform>(), MAX_LIGHTS * 32 + 16);
}
