use super::*;
use crate::media::request::Port;

fn open(url: &str) -> AvmixResult<Box<dyn FrameSource>> {
    BuiltinProvider.open(&OpenRequest::new(url, 8, 4))
}

#[test]
fn color_source_yields_solid_frames() {
    let mut src = open("color://red").unwrap();
    let FramePoll::Ready(frame) = src.poll(3.0) else {
        panic!("expected a frame");
    };
    assert_eq!((frame.width, frame.height), (8, 4));
    assert_eq!(frame.pixel(7, 3), [255, 0, 0, 255]);
    assert_eq!(frame.pts, 3.0);
    assert_eq!(src.duration(), None);
}

#[test]
fn dur_query_bounds_synthetic_sources() {
    let mut src = open("color://blue?dur=2").unwrap();
    assert_eq!(src.duration(), Some(2.0));
    assert!(matches!(src.poll(1.9), FramePoll::Ready(_)));
    assert!(matches!(src.poll(2.0), FramePoll::Ended));
    assert!(open("testsrc://?dur=abc").is_err());
}

#[test]
fn testsrc_scrolls() {
    let mut src = open("testsrc://").unwrap();
    let FramePoll::Ready(a) = src.poll(0.0) else {
        panic!("expected a frame");
    };
    let FramePoll::Ready(b) = src.poll(3.5) else {
        panic!("expected a frame");
    };
    assert_ne!(a.data(), b.data());
    assert_eq!(a.pixel(0, 0), a.pixel(0, 3));
}

#[test]
fn missing_image_is_a_resource_error() {
    let err = open("/nonexistent/image.png").unwrap_err();
    assert!(err.to_string().starts_with("resource error:"));
}

#[test]
fn image_file_is_loaded() {
    let dir = std::env::temp_dir().join(format!("avmix_media_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("px.png");
    image::RgbaImage::from_raw(2, 1, vec![0, 255, 0, 255, 0, 0, 255, 255])
        .unwrap()
        .save(&path)
        .unwrap();

    let mut src = open(&format!("file://{}", path.display())).unwrap();
    let FramePoll::Ready(frame) = src.poll(0.0) else {
        panic!("expected a frame");
    };
    assert_eq!((frame.width, frame.height), (2, 1));
    assert_eq!(frame.pixel(1, 0), [0, 0, 255, 255]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn ports_and_filters_parse() {
    assert_eq!(Port::parse("").unwrap(), Port::InProcess);
    assert_eq!(Port::parse("pipe").unwrap(), Port::Pipe);
    assert_eq!(
        Port::parse("tcp:localhost:1234").unwrap(),
        Port::Tcp {
            addr: Some("localhost:1234".into())
        }
    );
    assert!(Port::parse("tcpu").unwrap().is_process_backed());
    assert!(!Port::InProcess.is_process_backed());
    assert!(Port::parse("udp").is_err());
    assert_eq!(
        crate::media::MediaFilter::parse("video").unwrap(),
        crate::media::MediaFilter::Video
    );
}
